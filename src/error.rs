// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::AuthError;
use crate::storage::CatalogError;

/// JSON error envelope shared by every failing response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Always `false`.
    pub success: bool,
    /// HTTP status code.
    pub error: u16,
    /// Human-readable description.
    pub message: String,
    /// Machine-readable error kind.
    pub error_code: String,
}

impl ErrorBody {
    pub fn new(status: StatusCode, message: impl Into<String>, code: &str) -> Self {
        Self {
            success: false,
            error: status.as_u16(),
            message: message.into(),
            error_code: code.to_string(),
        }
    }
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub code: &'static str,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            code,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, "conflict", message)
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, "unprocessable", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        Self::new(err.status_code(), err.error_code(), err.to_string())
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::NotFound(id) => Self::not_found(format!("Drink {id} not found")),
            CatalogError::DuplicateTitle(title) => {
                Self::conflict(format!("A drink titled '{title}' already exists"))
            }
            CatalogError::Invalid(reason) => Self::unprocessable(reason),
            other => {
                tracing::error!(error = %other, "Catalog storage failure");
                Self::internal("Catalog storage failure")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody::new(self.status, self.message, self.code));
        (self.status, body).into_response()
    }
}
