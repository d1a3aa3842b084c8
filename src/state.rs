// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use crate::auth::Authorizer;
use crate::storage::DrinkCatalog;

/// Application context built once at startup and shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub catalog: DrinkCatalog,
    pub authorizer: Authorizer,
}

impl AppState {
    pub fn new(catalog: DrinkCatalog, authorizer: Authorizer) -> Self {
        Self {
            catalog,
            authorizer,
        }
    }
}
