// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Permission guards for protected operations.
//!
//! Protection is attached by composition, not registration:
//!
//! ```rust,ignore
//! let create = requires_auth(Permission::PostDrinks, operations::create_drink);
//! let drink = create.call(&state.authorizer, &headers, (catalog, request)).await?;
//! ```
//!
//! The wrapped operation only runs once the token has been verified and the
//! permission found; it receives the verified claims as its first argument.

use std::future::Future;

use axum::http::{header::AUTHORIZATION, HeaderMap};

use super::permissions::{self, Permission};
use super::{AuthError, Claims, TokenValidator};

/// Token validation plus permission enforcement.
///
/// Constructed once at startup and shared through `AppState`.
#[derive(Clone)]
pub struct Authorizer {
    validator: TokenValidator,
}

impl Authorizer {
    pub fn new(validator: TokenValidator) -> Self {
        Self { validator }
    }

    pub fn validator(&self) -> &TokenValidator {
        &self.validator
    }

    /// Verify the request's bearer token and require `permission`.
    pub async fn authorize(
        &self,
        headers: &HeaderMap,
        permission: Permission,
    ) -> Result<Claims, AuthError> {
        let result = self.verify(headers, permission).await;

        if let Err(err) = &result {
            tracing::debug!(
                %permission,
                error_code = err.error_code(),
                "Request rejected by permission guard"
            );
        }

        result
    }

    async fn verify(&self, headers: &HeaderMap, permission: Permission) -> Result<Claims, AuthError> {
        let authorization = authorization_header(headers)?;
        let claims = self.validator.validate(authorization).await?;
        permissions::check(&claims, permission)?;
        Ok(claims)
    }
}

/// Raw `Authorization` value; non-UTF-8 values are malformed.
fn authorization_header(headers: &HeaderMap) -> Result<Option<&str>, AuthError> {
    headers
        .get(AUTHORIZATION)
        .map(|value| value.to_str().map_err(|_| AuthError::MalformedHeader))
        .transpose()
}

/// An operation that may only run with a given permission.
#[derive(Debug, Clone, Copy)]
pub struct Protected<F> {
    permission: Permission,
    operation: F,
}

/// Guard `operation` behind `permission`.
pub fn requires_auth<F>(permission: Permission, operation: F) -> Protected<F> {
    Protected {
        permission,
        operation,
    }
}

impl<F> Protected<F> {
    pub fn permission(&self) -> Permission {
        self.permission
    }

    /// Authorize the request, then run the operation with the verified claims.
    ///
    /// Auth and permission failures are converted with `E::from` and the
    /// operation is not invoked.
    pub async fn call<A, T, E, Fut>(
        &self,
        authorizer: &Authorizer,
        headers: &HeaderMap,
        args: A,
    ) -> Result<T, E>
    where
        F: Fn(Claims, A) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<AuthError>,
    {
        let claims = authorizer.authorize(headers, self.permission).await?;
        (self.operation)(claims, args).await
    }
}
