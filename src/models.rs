// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response structures used by the REST API. All types derive
//! `Serialize`/`Deserialize` and `ToSchema` for JSON handling and OpenAPI
//! documentation.
//!
//! ## Representations
//!
//! A drink is exposed in two forms:
//!
//! - **Summary** (public): ingredient colors and proportions only
//! - **Detail** (requires `get:drinks-detail`): full recipe with names

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::storage::StoredDrink;

// =============================================================================
// Recipe Models
// =============================================================================

/// One recipe ingredient.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct Ingredient {
    /// Ingredient name, e.g. "milk".
    pub name: String,
    /// Display color used to draw the drink.
    pub color: String,
    /// Relative amount within the drink.
    pub parts: u32,
}

/// Ingredient without its name, for the public summary view.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct IngredientSummary {
    pub color: String,
    pub parts: u32,
}

/// A recipe in a request body: one ingredient or a list of them.
#[derive(Debug, Clone, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(untagged)]
pub enum RecipeInput {
    Many(Vec<Ingredient>),
    One(Ingredient),
}

impl RecipeInput {
    pub fn into_ingredients(self) -> Vec<Ingredient> {
        match self {
            RecipeInput::Many(ingredients) => ingredients,
            RecipeInput::One(ingredient) => vec![ingredient],
        }
    }
}

// =============================================================================
// Drink Views
// =============================================================================

/// Public drink representation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct DrinkSummary {
    pub id: u64,
    pub title: String,
    pub recipe: Vec<IngredientSummary>,
}

/// Full drink representation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct DrinkDetail {
    pub id: u64,
    pub title: String,
    pub recipe: Vec<Ingredient>,
}

impl From<&StoredDrink> for DrinkSummary {
    fn from(drink: &StoredDrink) -> Self {
        Self {
            id: drink.id,
            title: drink.title.clone(),
            recipe: drink
                .recipe
                .iter()
                .map(|ingredient| IngredientSummary {
                    color: ingredient.color.clone(),
                    parts: ingredient.parts,
                })
                .collect(),
        }
    }
}

impl From<StoredDrink> for DrinkDetail {
    fn from(drink: StoredDrink) -> Self {
        Self {
            id: drink.id,
            title: drink.title,
            recipe: drink.recipe,
        }
    }
}

// =============================================================================
// Requests
// =============================================================================

/// Body of `POST /drinks`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateDrinkRequest {
    pub title: String,
    pub recipe: RecipeInput,
}

/// Body of `PATCH /drinks/{id}`.
///
/// Absent or `null` fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateDrinkRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub recipe: Option<RecipeInput>,
}

// =============================================================================
// Responses
// =============================================================================

/// Response of `GET /drinks`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DrinkSummaryList {
    pub success: bool,
    pub drinks: Vec<DrinkSummary>,
}

/// Response of the detail listing, create and update.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DrinkDetailList {
    pub success: bool,
    pub drinks: Vec<DrinkDetail>,
}

/// Response of `DELETE /drinks/{id}`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeleteDrinkResponse {
    pub success: bool,
    /// Identifier of the deleted drink.
    pub delete: u64,
}
