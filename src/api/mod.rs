// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    response::{IntoResponse, Response},
    routing::{get, patch},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::Permission,
    error::{ApiError, ErrorBody},
    models::{
        CreateDrinkRequest, DeleteDrinkResponse, DrinkDetail, DrinkDetailList, DrinkSummary,
        DrinkSummaryList, Ingredient, IngredientSummary, RecipeInput, UpdateDrinkRequest,
    },
    state::AppState,
};

pub mod drinks;
pub mod health;

pub fn router(state: AppState) -> Router {
    let routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .route("/drinks", get(drinks::list_drinks).post(drinks::create_drink))
        .route("/drinks-detail", get(drinks::list_drinks_detail))
        .route(
            "/drinks/{drink_id}",
            patch(drinks::update_drink).delete(drinks::delete_drink),
        )
        .with_state(state);

    Router::new()
        .merge(routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
}

async fn not_found() -> Response {
    ApiError::not_found("resource not found").into_response()
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        health::liveness,
        health::readiness,
        drinks::list_drinks,
        drinks::list_drinks_detail,
        drinks::create_drink,
        drinks::update_drink,
        drinks::delete_drink
    ),
    components(
        schemas(
            Ingredient,
            IngredientSummary,
            RecipeInput,
            DrinkSummary,
            DrinkDetail,
            DrinkSummaryList,
            DrinkDetailList,
            CreateDrinkRequest,
            UpdateDrinkRequest,
            DeleteDrinkResponse,
            Permission,
            ErrorBody,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Drinks", description = "Drink recipe catalog")
    )
)]
pub struct ApiDoc;
