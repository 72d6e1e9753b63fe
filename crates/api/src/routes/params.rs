//! Parameter Update Route

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde_json::Value;
use std::sync::Arc;
use storage::NewParameters;
use tracing::info;

use crate::error::ApiError;
use crate::routes::{numeric_field, MessageResponse};
use crate::AppState;

/// POST `/update` — operator submits a new tuning-parameter set.
///
/// The set is appended, never merged: the device always reads the whole
/// latest row. Values are unbounded on purpose (trusted operator).
pub async fn update(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<MessageResponse>, ApiError> {
    let operator = state.require_operator(&headers)?;

    let new = NewParameters {
        kp: numeric_field(&body, "kp")?,
        ki: numeric_field(&body, "ki")?,
        kd: numeric_field(&body, "kd")?,
        setpoint: numeric_field(&body, "setpoint")?,
    };

    let created = state.params.submit(new).await?;
    info!(
        id = created.id,
        operator = %operator.username,
        setpoint = created.setpoint,
        "tuning parameters updated"
    );

    Ok(Json(MessageResponse {
        message: "PID values updated",
    }))
}
