// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Permission vocabulary and enforcement.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{AuthError, Claims};

/// Permissions understood by the catalog API.
///
/// ## Vocabulary
///
/// - `get:drinks-detail` - Read full recipes
/// - `post:drinks` - Create drinks
/// - `patch:drinks` - Edit drinks
/// - `delete:drinks` - Remove drinks
///
/// A closed enum, so a protected operation can never be guarded by an empty
/// or misspelled permission string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum Permission {
    #[serde(rename = "get:drinks-detail")]
    GetDrinksDetail,
    #[serde(rename = "post:drinks")]
    PostDrinks,
    #[serde(rename = "patch:drinks")]
    PatchDrinks,
    #[serde(rename = "delete:drinks")]
    DeleteDrinks,
}

impl Permission {
    /// Every permission, in declaration order.
    pub const ALL: [Permission; 4] = [
        Permission::GetDrinksDetail,
        Permission::PostDrinks,
        Permission::PatchDrinks,
        Permission::DeleteDrinks,
    ];

    /// Wire form as it appears in the `permissions` claim.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Permission::GetDrinksDetail => "get:drinks-detail",
            Permission::PostDrinks => "post:drinks",
            Permission::PatchDrinks => "patch:drinks",
            Permission::DeleteDrinks => "delete:drinks",
        }
    }

    /// Parse the wire form (case-sensitive).
    pub fn parse(s: &str) -> Option<Permission> {
        Self::ALL.into_iter().find(|p| p.as_str() == s)
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decide whether `claims` grant `required`.
pub fn check(claims: &Claims, required: Permission) -> Result<(), AuthError> {
    let granted = claims
        .permissions
        .as_ref()
        .ok_or(AuthError::ClaimsMissingPermissions)?;

    if !granted.contains(required.as_str()) {
        return Err(AuthError::PermissionNotFound);
    }

    Ok(())
}
