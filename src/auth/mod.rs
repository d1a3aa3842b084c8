// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authorization Module
//!
//! Bearer token verification and permission enforcement for the catalog API.
//!
//! ## Auth Flow
//!
//! 1. The frontend signs the user in with the identity provider (Auth0)
//! 2. Frontend sends `Authorization: Bearer <access token>`
//! 3. The server:
//!    - Resolves the token's `kid` against the provider's JWKS
//!    - Verifies signature, expiry, issuer, audience
//!    - Checks the `permissions` claim for the operation's permission
//!
//! ## Security
//!
//! - Catalog writes and the detail listing require a permission
//! - JWKS is cached with TTL; unknown key IDs trigger a rate-limited refetch
//! - Clock skew tolerance is 60 seconds
//! - Raw tokens are never logged or echoed in errors

pub mod claims;
pub mod error;
pub mod guard;
pub mod jwks;
pub mod permissions;
pub mod validator;

#[cfg(test)]
pub(crate) mod test_support;

pub use claims::Claims;
pub use error::AuthError;
pub use guard::{requires_auth, Authorizer, Protected};
pub use jwks::{JwksManager, KeySetStatus};
pub use permissions::Permission;
pub use validator::TokenValidator;
