// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication and authorization errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::error::ErrorBody;

/// Failure raised while verifying a bearer token or enforcing a permission.
///
/// Every variant is terminal for the request. The variants are kept distinct
/// even where they share a status code so logs can tell the causes apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No `Authorization` header present
    MissingHeader,
    /// Header is not exactly `Bearer <token>`
    MalformedHeader,
    /// Token cannot be decoded into header/payload/signature
    MalformedToken,
    /// Token header has no `kid`, or the key set has no usable key for it
    InvalidKeyOrClaims,
    /// Signature does not verify against the resolved key
    InvalidSignature,
    /// Audience, issuer or not-before check failed
    InvalidClaims,
    /// `exp` has passed
    TokenExpired,
    /// Claims carry no `permissions` field at all
    ClaimsMissingPermissions,
    /// The required permission is not granted
    PermissionNotFound,
    /// The signing key set could not be fetched
    KeySetUnavailable,
}

impl AuthError {
    /// Machine-readable error code.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingHeader => "authorization_header_missing",
            AuthError::MalformedHeader => "invalid_header",
            AuthError::MalformedToken => "malformed_token",
            AuthError::InvalidKeyOrClaims => "invalid_key",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::InvalidClaims => "invalid_claims",
            AuthError::TokenExpired => "token_expired",
            AuthError::ClaimsMissingPermissions => "permissions_missing",
            AuthError::PermissionNotFound => "unauthorized",
            AuthError::KeySetUnavailable => "key_set_unavailable",
        }
    }

    /// HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingHeader
            | AuthError::MalformedHeader
            | AuthError::MalformedToken
            | AuthError::InvalidKeyOrClaims
            | AuthError::InvalidSignature
            | AuthError::InvalidClaims
            | AuthError::TokenExpired => StatusCode::UNAUTHORIZED,
            AuthError::ClaimsMissingPermissions => StatusCode::BAD_REQUEST,
            AuthError::PermissionNotFound => StatusCode::FORBIDDEN,
            AuthError::KeySetUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingHeader => write!(f, "Authorization header is expected"),
            AuthError::MalformedHeader => {
                write!(f, "Authorization header must be of the form 'Bearer <token>'")
            }
            AuthError::MalformedToken => write!(f, "Unable to parse authentication token"),
            AuthError::InvalidKeyOrClaims => {
                write!(f, "Unable to find the appropriate key for this token")
            }
            AuthError::InvalidSignature => write!(f, "Token signature is invalid"),
            AuthError::InvalidClaims => {
                write!(f, "Incorrect claims, please check the audience and issuer")
            }
            AuthError::TokenExpired => write!(f, "Token expired"),
            AuthError::ClaimsMissingPermissions => write!(f, "Permissions not included in token"),
            AuthError::PermissionNotFound => write!(f, "Permission not found"),
            AuthError::KeySetUnavailable => write!(f, "Signing keys are temporarily unavailable"),
        }
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(ErrorBody::new(status, self.to_string(), self.error_code()));
        (status, body).into_response()
    }
}
