// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Drink catalog endpoints.
//!
//! Protected handlers only extract raw inputs; the catalog operation itself
//! is wrapped with [`requires_auth`], so body and path errors are reported
//! after the caller has been authorized.

use axum::{
    extract::{rejection::JsonRejection, rejection::PathRejection, Path, State},
    http::HeaderMap,
    Json,
};

use crate::{
    auth::{requires_auth, Claims, Permission},
    error::ApiError,
    models::{
        CreateDrinkRequest, DeleteDrinkResponse, DrinkDetail, DrinkDetailList, DrinkSummary,
        DrinkSummaryList, UpdateDrinkRequest,
    },
    state::AppState,
    storage::DrinkCatalog,
};

type Body<T> = Result<Json<T>, JsonRejection>;
type DrinkId = Result<Path<u64>, PathRejection>;

// =============================================================================
// Catalog Operations
// =============================================================================

async fn list_drink_details(
    _claims: Claims,
    catalog: DrinkCatalog,
) -> Result<DrinkDetailList, ApiError> {
    let drinks = catalog.list()?;
    Ok(DrinkDetailList {
        success: true,
        drinks: drinks.into_iter().map(DrinkDetail::from).collect(),
    })
}

async fn insert_drink(
    claims: Claims,
    (catalog, body): (DrinkCatalog, Body<CreateDrinkRequest>),
) -> Result<DrinkDetailList, ApiError> {
    let Json(request) = body.map_err(|e| ApiError::unprocessable(e.body_text()))?;

    let drink = catalog.create(&request.title, request.recipe.into_ingredients())?;
    tracing::info!(drink_id = drink.id, subject = claims.subject(), "Drink created");

    Ok(DrinkDetailList {
        success: true,
        drinks: vec![drink.into()],
    })
}

async fn modify_drink(
    claims: Claims,
    (catalog, id, body): (DrinkCatalog, DrinkId, Body<UpdateDrinkRequest>),
) -> Result<DrinkDetailList, ApiError> {
    let Path(id) = id.map_err(|_| ApiError::not_found("resource not found"))?;
    let Json(request) = body.map_err(|e| ApiError::unprocessable(e.body_text()))?;

    let drink = catalog.update(
        id,
        request.title.as_deref(),
        request.recipe.map(|recipe| recipe.into_ingredients()),
    )?;
    tracing::info!(drink_id = id, subject = claims.subject(), "Drink updated");

    Ok(DrinkDetailList {
        success: true,
        drinks: vec![drink.into()],
    })
}

async fn remove_drink(
    claims: Claims,
    (catalog, id): (DrinkCatalog, DrinkId),
) -> Result<DeleteDrinkResponse, ApiError> {
    let Path(id) = id.map_err(|_| ApiError::not_found("resource not found"))?;

    catalog.delete(id)?;
    tracing::info!(drink_id = id, subject = claims.subject(), "Drink deleted");

    Ok(DeleteDrinkResponse {
        success: true,
        delete: id,
    })
}

// =============================================================================
// Handlers
// =============================================================================

#[utoipa::path(
    get,
    path = "/drinks",
    tag = "Drinks",
    responses((status = 200, description = "Public drink list", body = DrinkSummaryList))
)]
pub async fn list_drinks(State(state): State<AppState>) -> Result<Json<DrinkSummaryList>, ApiError> {
    let drinks = state.catalog.list()?;
    Ok(Json(DrinkSummaryList {
        success: true,
        drinks: drinks.iter().map(DrinkSummary::from).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/drinks-detail",
    tag = "Drinks",
    security(("bearer" = ["get:drinks-detail"])),
    responses(
        (status = 200, description = "Drinks with full recipes", body = DrinkDetailList),
        (status = 401, description = "Missing or invalid token", body = crate::error::ErrorBody),
        (status = 403, description = "Permission not granted", body = crate::error::ErrorBody),
    )
)]
pub async fn list_drinks_detail(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<DrinkDetailList>, ApiError> {
    requires_auth(Permission::GetDrinksDetail, list_drink_details)
        .call(&state.authorizer, &headers, state.catalog.clone())
        .await
        .map(Json)
}

#[utoipa::path(
    post,
    path = "/drinks",
    tag = "Drinks",
    request_body = CreateDrinkRequest,
    security(("bearer" = ["post:drinks"])),
    responses(
        (status = 200, description = "Drink created", body = DrinkDetailList),
        (status = 401, description = "Missing or invalid token", body = crate::error::ErrorBody),
        (status = 403, description = "Permission not granted", body = crate::error::ErrorBody),
        (status = 409, description = "Title already in use", body = crate::error::ErrorBody),
        (status = 422, description = "Invalid drink", body = crate::error::ErrorBody),
    )
)]
pub async fn create_drink(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Body<CreateDrinkRequest>,
) -> Result<Json<DrinkDetailList>, ApiError> {
    requires_auth(Permission::PostDrinks, insert_drink)
        .call(&state.authorizer, &headers, (state.catalog.clone(), body))
        .await
        .map(Json)
}

#[utoipa::path(
    patch,
    path = "/drinks/{drink_id}",
    tag = "Drinks",
    params(("drink_id" = u64, Path, description = "Identifier of the drink to update")),
    request_body = UpdateDrinkRequest,
    security(("bearer" = ["patch:drinks"])),
    responses(
        (status = 200, description = "Drink updated", body = DrinkDetailList),
        (status = 401, description = "Missing or invalid token", body = crate::error::ErrorBody),
        (status = 403, description = "Permission not granted", body = crate::error::ErrorBody),
        (status = 404, description = "Drink not found", body = crate::error::ErrorBody),
        (status = 409, description = "Title already in use", body = crate::error::ErrorBody),
    )
)]
pub async fn update_drink(
    State(state): State<AppState>,
    headers: HeaderMap,
    id: DrinkId,
    body: Body<UpdateDrinkRequest>,
) -> Result<Json<DrinkDetailList>, ApiError> {
    requires_auth(Permission::PatchDrinks, modify_drink)
        .call(&state.authorizer, &headers, (state.catalog.clone(), id, body))
        .await
        .map(Json)
}

#[utoipa::path(
    delete,
    path = "/drinks/{drink_id}",
    tag = "Drinks",
    params(("drink_id" = u64, Path, description = "Identifier of the drink to delete")),
    security(("bearer" = ["delete:drinks"])),
    responses(
        (status = 200, description = "Drink deleted", body = DeleteDrinkResponse),
        (status = 401, description = "Missing or invalid token", body = crate::error::ErrorBody),
        (status = 403, description = "Permission not granted", body = crate::error::ErrorBody),
        (status = 404, description = "Drink not found", body = crate::error::ErrorBody),
    )
)]
pub async fn delete_drink(
    State(state): State<AppState>,
    headers: HeaderMap,
    id: DrinkId,
) -> Result<Json<DeleteDrinkResponse>, ApiError> {
    requires_auth(Permission::DeleteDrinks, remove_drink)
        .call(&state.authorizer, &headers, (state.catalog.clone(), id))
        .await
        .map(Json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::test_support::{self, bearer_for};
    use crate::models::{Ingredient, RecipeInput};
    use axum::http::{header::AUTHORIZATION, HeaderValue, StatusCode};

    fn test_state() -> (AppState, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let catalog = DrinkCatalog::open(&dir.path().join("drinks.redb")).unwrap();
        (AppState::new(catalog, test_support::authorizer()), dir)
    }

    fn headers_for(permissions: &[&str]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&bearer_for(permissions)).unwrap(),
        );
        headers
    }

    fn latte() -> CreateDrinkRequest {
        CreateDrinkRequest {
            title: "Latte".into(),
            recipe: RecipeInput::Many(vec![
                Ingredient {
                    name: "espresso".into(),
                    color: "brown".into(),
                    parts: 1,
                },
                Ingredient {
                    name: "milk".into(),
                    color: "white".into(),
                    parts: 3,
                },
            ]),
        }
    }

    #[tokio::test]
    async fn create_drink_success() {
        let (state, _dir) = test_state();

        let Json(response) = create_drink(
            State(state.clone()),
            headers_for(&["post:drinks"]),
            Ok(Json(latte())),
        )
        .await
        .expect("drink creation succeeds");

        assert!(response.success);
        assert_eq!(response.drinks.len(), 1);
        assert_eq!(response.drinks[0].title, "Latte");
        assert_eq!(state.catalog.count().unwrap(), 1);
    }

    #[tokio::test]
    async fn create_drink_without_permission_stores_nothing() {
        let (state, _dir) = test_state();

        let err = create_drink(
            State(state.clone()),
            headers_for(&["get:drinks-detail"]),
            Ok(Json(latte())),
        )
        .await
        .unwrap_err();

        assert_eq!(err.status, StatusCode::FORBIDDEN);
        assert_eq!(state.catalog.count().unwrap(), 0);
    }

    #[tokio::test]
    async fn list_drinks_is_public_summary() {
        let (state, _dir) = test_state();
        state
            .catalog
            .create("Latte", latte().recipe.into_ingredients())
            .unwrap();

        let Json(response) = list_drinks(State(state)).await.unwrap();
        assert!(response.success);
        assert_eq!(response.drinks[0].recipe.len(), 2);
        assert_eq!(response.drinks[0].recipe[1].parts, 3);
    }

    #[tokio::test]
    async fn update_missing_drink_is_not_found() {
        let (state, _dir) = test_state();

        let err = update_drink(
            State(state),
            headers_for(&["patch:drinks"]),
            Ok(Path(99)),
            Ok(Json(UpdateDrinkRequest {
                title: Some("Mocha".into()),
                recipe: None,
            })),
        )
        .await
        .unwrap_err();

        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_drink_success() {
        let (state, _dir) = test_state();
        let drink = state
            .catalog
            .create("Latte", latte().recipe.into_ingredients())
            .unwrap();

        let Json(response) = delete_drink(
            State(state.clone()),
            headers_for(&["delete:drinks"]),
            Ok(Path(drink.id)),
        )
        .await
        .expect("drink deletion succeeds");

        assert_eq!(response.delete, drink.id);
        assert!(state.catalog.list().unwrap().is_empty());
    }
}
