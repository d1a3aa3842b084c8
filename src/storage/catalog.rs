// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Drink catalog backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `drinks`: drink id → serialized StoredDrink (JSON bytes)
//! - `catalog_meta`: key → u64 (id sequence)
//!
//! Title uniqueness is checked inside the same write transaction that
//! inserts, so two concurrent creates cannot both claim a title.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use redb::{
    Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, Table, TableDefinition,
};
use serde::{Deserialize, Serialize};

use crate::models::Ingredient;

// =============================================================================
// Table Definitions
// =============================================================================

/// Primary table: drink id → serialized StoredDrink (JSON bytes).
const DRINKS: TableDefinition<u64, &[u8]> = TableDefinition::new("drinks");

/// Catalog bookkeeping: key → counter.
const CATALOG_META: TableDefinition<&str, u64> = TableDefinition::new("catalog_meta");

const NEXT_ID_KEY: &str = "next_drink_id";

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("drink {0} not found")]
    NotFound(u64),

    #[error("a drink titled '{0}' already exists")]
    DuplicateTitle(String),

    #[error("invalid drink: {0}")]
    Invalid(String),

    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

// =============================================================================
// Stored Record
// =============================================================================

/// Drink as persisted in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredDrink {
    pub id: u64,
    /// Unique, trimmed title
    pub title: String,
    pub recipe: Vec<Ingredient>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// DrinkCatalog
// =============================================================================

/// Embedded drink catalog. Clones share the same database handle.
#[derive(Clone)]
pub struct DrinkCatalog {
    db: Arc<Database>,
}

impl DrinkCatalog {
    /// Open (or create) the catalog at the given path.
    pub fn open(path: &Path) -> CatalogResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(DRINKS)?;
            let _ = write_txn.open_table(CATALOG_META)?;
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    /// All drinks, ordered by id.
    pub fn list(&self) -> CatalogResult<Vec<StoredDrink>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(DRINKS)?;

        let mut drinks = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            drinks.push(serde_json::from_slice(value.value())?);
        }
        Ok(drinks)
    }

    /// Look up a single drink.
    pub fn get(&self, id: u64) -> CatalogResult<StoredDrink> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(DRINKS)?;
        match table.get(id)? {
            Some(value) => Ok(serde_json::from_slice(value.value())?),
            None => Err(CatalogError::NotFound(id)),
        }
    }

    /// Create a drink with a fresh id.
    pub fn create(&self, title: &str, recipe: Vec<Ingredient>) -> CatalogResult<StoredDrink> {
        let title = normalize_title(title)?;
        validate_recipe(&recipe)?;

        let write_txn = self.db.begin_write()?;
        let drink = {
            let mut drinks = write_txn.open_table(DRINKS)?;
            ensure_unique_title(&drinks, &title, None)?;

            let mut meta = write_txn.open_table(CATALOG_META)?;
            let id = meta.get(NEXT_ID_KEY)?.map(|v| v.value()).unwrap_or(1);
            meta.insert(NEXT_ID_KEY, id + 1)?;

            let now = Utc::now();
            let drink = StoredDrink {
                id,
                title,
                recipe,
                created_at: now,
                updated_at: now,
            };
            let json = serde_json::to_vec(&drink)?;
            drinks.insert(id, json.as_slice())?;
            drink
        };
        write_txn.commit()?;

        Ok(drink)
    }

    /// Update title and/or recipe. `None` keeps the stored value.
    pub fn update(
        &self,
        id: u64,
        title: Option<&str>,
        recipe: Option<Vec<Ingredient>>,
    ) -> CatalogResult<StoredDrink> {
        let title = title.map(normalize_title).transpose()?;
        if let Some(recipe) = &recipe {
            validate_recipe(recipe)?;
        }

        let write_txn = self.db.begin_write()?;
        let drink = {
            let mut drinks = write_txn.open_table(DRINKS)?;

            // Read existing value and deserialize before mutating
            let existing_bytes = {
                let existing = drinks.get(id)?.ok_or(CatalogError::NotFound(id))?;
                existing.value().to_vec()
            };
            let mut drink: StoredDrink = serde_json::from_slice(&existing_bytes)?;

            if let Some(title) = title {
                ensure_unique_title(&drinks, &title, Some(id))?;
                drink.title = title;
            }
            if let Some(recipe) = recipe {
                drink.recipe = recipe;
            }
            drink.updated_at = Utc::now();

            let json = serde_json::to_vec(&drink)?;
            drinks.insert(id, json.as_slice())?;
            drink
        };
        write_txn.commit()?;

        Ok(drink)
    }

    /// Delete a drink.
    pub fn delete(&self, id: u64) -> CatalogResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut drinks = write_txn.open_table(DRINKS)?;
            let removed = drinks.remove(id)?.is_some();
            if !removed {
                return Err(CatalogError::NotFound(id));
            }
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Number of stored drinks.
    pub fn count(&self) -> CatalogResult<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(DRINKS)?;
        Ok(table.len()?)
    }
}

// =============================================================================
// Validation Helpers
// =============================================================================

fn normalize_title(title: &str) -> CatalogResult<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(CatalogError::Invalid("title must not be empty".into()));
    }
    Ok(title.to_string())
}

fn validate_recipe(recipe: &[Ingredient]) -> CatalogResult<()> {
    if recipe.is_empty() {
        return Err(CatalogError::Invalid(
            "recipe must contain at least one ingredient".into(),
        ));
    }
    for ingredient in recipe {
        if ingredient.name.trim().is_empty() || ingredient.color.trim().is_empty() {
            return Err(CatalogError::Invalid(
                "ingredient name and color must not be empty".into(),
            ));
        }
        if ingredient.parts == 0 {
            return Err(CatalogError::Invalid(
                "ingredient parts must be at least 1".into(),
            ));
        }
    }
    Ok(())
}

/// Fail if a drink other than `except` already uses `title`.
fn ensure_unique_title(
    drinks: &Table<u64, &'static [u8]>,
    title: &str,
    except: Option<u64>,
) -> CatalogResult<()> {
    for entry in drinks.iter()? {
        let (key, value) = entry?;
        if Some(key.value()) == except {
            continue;
        }
        let other: StoredDrink = serde_json::from_slice(value.value())?;
        if other.title == title {
            return Err(CatalogError::DuplicateTitle(title.to_string()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_catalog() -> (DrinkCatalog, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let catalog = DrinkCatalog::open(&dir.path().join("drinks.redb")).unwrap();
        (catalog, dir)
    }

    fn water() -> Vec<Ingredient> {
        vec![Ingredient {
            name: "water".into(),
            color: "blue".into(),
            parts: 1,
        }]
    }

    #[test]
    fn create_and_list() {
        let (catalog, _dir) = temp_catalog();

        let first = catalog.create("Water", water()).unwrap();
        let second = catalog.create("  Tea ", water()).unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(second.title, "Tea");

        let drinks = catalog.list().unwrap();
        assert_eq!(drinks, vec![first, second]);
        assert_eq!(catalog.count().unwrap(), 2);
    }

    #[test]
    fn create_rejects_duplicate_title() {
        let (catalog, _dir) = temp_catalog();
        catalog.create("Water", water()).unwrap();

        let err = catalog.create("Water", water()).unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateTitle(t) if t == "Water"));
        assert_eq!(catalog.count().unwrap(), 1);
    }

    #[test]
    fn create_validates_input() {
        let (catalog, _dir) = temp_catalog();

        assert!(matches!(
            catalog.create("   ", water()),
            Err(CatalogError::Invalid(_))
        ));
        assert!(matches!(
            catalog.create("Empty", vec![]),
            Err(CatalogError::Invalid(_))
        ));

        let mut zero_parts = water();
        zero_parts[0].parts = 0;
        assert!(matches!(
            catalog.create("Zero", zero_parts),
            Err(CatalogError::Invalid(_))
        ));
    }

    #[test]
    fn update_keeps_absent_fields() {
        let (catalog, _dir) = temp_catalog();
        let drink = catalog.create("Water", water()).unwrap();

        let updated = catalog.update(drink.id, Some("Sparkling Water"), None).unwrap();
        assert_eq!(updated.title, "Sparkling Water");
        assert_eq!(updated.recipe, drink.recipe);
        assert_eq!(updated.created_at, drink.created_at);

        let new_recipe = vec![Ingredient {
            name: "soda".into(),
            color: "white".into(),
            parts: 3,
        }];
        let updated = catalog.update(drink.id, None, Some(new_recipe.clone())).unwrap();
        assert_eq!(updated.title, "Sparkling Water");
        assert_eq!(updated.recipe, new_recipe);

        assert_eq!(catalog.get(drink.id).unwrap(), updated);
    }

    #[test]
    fn update_allows_keeping_own_title() {
        let (catalog, _dir) = temp_catalog();
        let drink = catalog.create("Water", water()).unwrap();

        assert!(catalog.update(drink.id, Some("Water"), None).is_ok());
    }

    #[test]
    fn update_rejects_title_of_other_drink() {
        let (catalog, _dir) = temp_catalog();
        catalog.create("Water", water()).unwrap();
        let tea = catalog.create("Tea", water()).unwrap();

        let err = catalog.update(tea.id, Some("Water"), None).unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateTitle(_)));
        assert_eq!(catalog.get(tea.id).unwrap().title, "Tea");
    }

    #[test]
    fn update_and_delete_missing_drink() {
        let (catalog, _dir) = temp_catalog();

        assert!(matches!(
            catalog.update(42, Some("Nope"), None),
            Err(CatalogError::NotFound(42))
        ));
        assert!(matches!(catalog.delete(42), Err(CatalogError::NotFound(42))));
        assert!(matches!(catalog.get(42), Err(CatalogError::NotFound(42))));
    }

    #[test]
    fn delete_removes_drink_and_ids_are_not_reused() {
        let (catalog, _dir) = temp_catalog();
        let drink = catalog.create("Water", water()).unwrap();

        catalog.delete(drink.id).unwrap();
        assert!(catalog.list().unwrap().is_empty());

        let next = catalog.create("Water", water()).unwrap();
        assert_eq!(next.id, drink.id + 1);
    }

    #[test]
    fn catalog_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("drinks.redb");

        {
            let catalog = DrinkCatalog::open(&path).unwrap();
            catalog.create("Water", water()).unwrap();
        }

        let catalog = DrinkCatalog::open(&path).unwrap();
        let drinks = catalog.list().unwrap();
        assert_eq!(drinks.len(), 1);
        assert_eq!(drinks[0].title, "Water");
    }
}
