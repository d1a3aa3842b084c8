// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bearer token validation.
//!
//! `TokenValidator::validate` runs the checks in a fixed order and stops at
//! the first failure:
//!
//! 1. header present
//! 2. `Bearer <token>` scheme
//! 3. token decodes into header/payload/signature
//! 4. `kid` resolves to a trusted key with an accepted algorithm
//! 5. signature, `exp`, `nbf`, `aud` and `iss` verify

use std::sync::Arc;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, Algorithm, Header, Validation};

use super::jwks::{JwksManager, KeyResolveError};
use super::{AuthError, Claims};

/// Clock skew tolerance (60 seconds).
const CLOCK_SKEW_LEEWAY: u64 = 60;

/// Claims every accepted token must carry.
const REQUIRED_CLAIMS: [&str; 3] = ["exp", "iss", "aud"];

#[derive(Debug, Clone)]
struct ValidatorSettings {
    issuer: String,
    audience: String,
    algorithms: Vec<Algorithm>,
    leeway: u64,
}

/// Verifies bearer tokens against a trusted key set.
///
/// Holds no per-request state; clones share the key cache.
#[derive(Clone)]
pub struct TokenValidator {
    keys: JwksManager,
    settings: Arc<ValidatorSettings>,
}

impl TokenValidator {
    /// Create a validator that accepts RS256 tokens for `audience` from `issuer`.
    pub fn new(keys: JwksManager, issuer: impl Into<String>, audience: impl Into<String>) -> Self {
        Self {
            keys,
            settings: Arc::new(ValidatorSettings {
                issuer: issuer.into(),
                audience: audience.into(),
                algorithms: vec![Algorithm::RS256],
                leeway: CLOCK_SKEW_LEEWAY,
            }),
        }
    }

    /// Replace the accepted signing algorithms.
    pub fn with_algorithms(mut self, algorithms: Vec<Algorithm>) -> Self {
        Arc::make_mut(&mut self.settings).algorithms = algorithms;
        self
    }

    /// Set the clock skew leeway in seconds.
    pub fn with_leeway(mut self, leeway: u64) -> Self {
        Arc::make_mut(&mut self.settings).leeway = leeway;
        self
    }

    /// Key resolver backing this validator.
    pub fn keys(&self) -> &JwksManager {
        &self.keys
    }

    pub fn issuer(&self) -> &str {
        &self.settings.issuer
    }

    pub fn audience(&self) -> &str {
        &self.settings.audience
    }

    /// Validate a raw `Authorization` header value and return its claims.
    pub async fn validate(&self, authorization: Option<&str>) -> Result<Claims, AuthError> {
        let token = extract_bearer(authorization)?;
        let header = decode_token_header(token)?;

        let kid = header.kid.as_deref().ok_or(AuthError::InvalidKeyOrClaims)?;
        if !self.settings.algorithms.contains(&header.alg) {
            return Err(AuthError::InvalidKeyOrClaims);
        }

        let resolved = self.keys.resolve(kid).await.map_err(|e| match e {
            KeyResolveError::KeyNotFound(_) | KeyResolveError::UnsupportedKey(_) => {
                AuthError::InvalidKeyOrClaims
            }
            KeyResolveError::Fetch(_) | KeyResolveError::HttpClient(_) => {
                tracing::warn!(error = %e, "Signing key set unavailable");
                AuthError::KeySetUnavailable
            }
        })?;

        // The key decides the algorithm; a header claiming another one is rejected.
        if resolved.algorithm != header.alg {
            return Err(AuthError::InvalidKeyOrClaims);
        }

        let mut validation = Validation::new(resolved.algorithm);
        validation.leeway = self.settings.leeway;
        validation.validate_nbf = true;
        validation.set_required_spec_claims(&REQUIRED_CLAIMS);
        validation.set_issuer(&[&self.settings.issuer]);
        validation.set_audience(&[&self.settings.audience]);

        let token_data = decode::<Claims>(token, &resolved.key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                ErrorKind::InvalidIssuer
                | ErrorKind::InvalidAudience
                | ErrorKind::InvalidSubject
                | ErrorKind::ImmatureSignature
                | ErrorKind::MissingRequiredClaim(_) => AuthError::InvalidClaims,
                ErrorKind::InvalidAlgorithm | ErrorKind::InvalidKeyFormat => {
                    AuthError::InvalidKeyOrClaims
                }
                _ => AuthError::MalformedToken,
            }
        })?;

        Ok(token_data.claims)
    }
}

/// Split `Bearer <token>` and return the token.
///
/// The header must be exactly two whitespace-separated parts and the scheme
/// must be `Bearer`, case-sensitively.
pub fn extract_bearer(authorization: Option<&str>) -> Result<&str, AuthError> {
    let value = authorization.ok_or(AuthError::MissingHeader)?;

    let mut parts = value.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) => Ok(token),
        _ => Err(AuthError::MalformedHeader),
    }
}

fn decode_token_header(token: &str) -> Result<Header, AuthError> {
    if token.split('.').count() != 3 {
        return Err(AuthError::MalformedToken);
    }
    decode_header(token).map_err(|_| AuthError::MalformedToken)
}
