// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Drinks API - Permission-gated drink recipe catalog
//!
//! Bearer tokens issued by an external identity provider are verified
//! against its published key set, and each catalog operation requires a
//! specific permission claim.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Token validation and permission enforcement
//! - `config` - Environment configuration
//! - `storage` - Drink catalog (redb)

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod state;
pub mod storage;
