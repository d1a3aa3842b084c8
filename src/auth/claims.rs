// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Decoded token claims.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::permissions::Permission;

/// The `aud` claim, which may be a single string or a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    Single(String),
    Many(Vec<String>),
}

impl Audience {
    /// Check whether `audience` is one of the token's audiences.
    pub fn contains(&self, audience: &str) -> bool {
        match self {
            Audience::Single(aud) => aud == audience,
            Audience::Many(auds) => auds.iter().any(|aud| aud == audience),
        }
    }
}

/// Claims carried by a verified access token.
///
/// Only produced by [`TokenValidator::validate`](super::TokenValidator::validate),
/// so holding a value implies the signature, expiry, audience and issuer
/// have already been checked. Passed by value into protected operations and
/// dropped at the end of the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (identity provider user ID)
    #[serde(default)]
    pub sub: Option<String>,

    /// Issuer
    pub iss: String,

    /// Audience
    pub aud: Audience,

    /// Expiration timestamp
    pub exp: i64,

    /// Issued at timestamp
    #[serde(default)]
    pub iat: Option<i64>,

    /// Granted permissions. `None` means the token has no `permissions`
    /// claim at all, which is distinct from an empty grant.
    #[serde(default)]
    pub permissions: Option<BTreeSet<String>>,
}

impl Claims {
    /// Subject for logging, or `"unknown"` for subject-less tokens.
    pub fn subject(&self) -> &str {
        self.sub.as_deref().unwrap_or("unknown")
    }

    /// Check if the token grants `permission`.
    ///
    /// Returns `false` when the `permissions` claim is absent.
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions
            .as_ref()
            .is_some_and(|granted| granted.contains(permission.as_str()))
    }

    /// Token expiry as a timestamp.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_claims() -> Claims {
        serde_json::from_value(serde_json::json!({
            "sub": "auth0|barista",
            "iss": "https://drinks.example.com/",
            "aud": ["drinks", "https://drinks.example.com/userinfo"],
            "exp": 1700003600,
            "iat": 1700000000,
            "permissions": ["get:drinks-detail", "post:drinks"]
        }))
        .unwrap()
    }

    #[test]
    fn deserializes_audience_list() {
        let claims = sample_claims();
        assert!(claims.aud.contains("drinks"));
        assert!(!claims.aud.contains("other"));
    }

    #[test]
    fn deserializes_single_audience() {
        let claims: Claims = serde_json::from_value(serde_json::json!({
            "iss": "https://drinks.example.com/",
            "aud": "drinks",
            "exp": 1700003600
        }))
        .unwrap();
        assert_eq!(claims.aud, Audience::Single("drinks".into()));
        assert_eq!(claims.subject(), "unknown");
        assert!(claims.permissions.is_none());
    }

    #[test]
    fn has_permission_checks_grant() {
        let claims = sample_claims();
        assert!(claims.has_permission(Permission::GetDrinksDetail));
        assert!(claims.has_permission(Permission::PostDrinks));
        assert!(!claims.has_permission(Permission::DeleteDrinks));
    }

    #[test]
    fn has_permission_is_false_without_claim() {
        let mut claims = sample_claims();
        claims.permissions = None;
        assert!(!claims.has_permission(Permission::GetDrinksDetail));
    }

    #[test]
    fn expires_at_converts_timestamp() {
        let claims = sample_claims();
        assert_eq!(claims.expires_at().unwrap().timestamp(), 1700003600);
    }
}
