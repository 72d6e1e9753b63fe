//! Relay error taxonomy and response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use serde_json::json;
use storage::{StoreError, ValidationError};
use thiserror::Error;

/// Errors a relay handler can surface.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed or non-numeric input. Rejected before any store mutation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Missing or invalid operator session.
    #[error("operator session required")]
    Unauthenticated { redirect_to: String },

    /// Underlying durability failure. Surfaced, never retried: a retry
    /// could append a duplicate parameter or telemetry row.
    #[error("storage failure: {0}")]
    Store(StoreError),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Validation(err) => ApiError::Validation(err),
            other => ApiError::Store(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(err) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": err.to_string() })),
            )
                .into_response(),
            ApiError::Unauthenticated { redirect_to } => {
                Redirect::to(&redirect_to).into_response()
            }
            ApiError::Store(err) => {
                tracing::error!(error = %err, "store operation failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "storage failure" })),
                )
                    .into_response()
            }
        }
    }
}
