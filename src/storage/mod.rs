// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Storage Module
//!
//! Persistent drink catalog in an embedded redb database.
//!
//! ## Storage Layout
//!
//! ```text
//! $DATABASE_PATH (default data/drinks.redb)
//!   drinks         id → StoredDrink (JSON)
//!   catalog_meta   next_drink_id → u64
//! ```

pub mod catalog;

pub use catalog::{CatalogError, CatalogResult, DrinkCatalog, StoredDrink};
