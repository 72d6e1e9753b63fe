//! Device Routes
//!
//! The embedded controller's surface. These routes are deliberately
//! ungated: the device sits inside the network perimeter and has no
//! session to present. Rate limiting still applies in front of them.
//! Tightening this boundary is a product decision, tracked in DESIGN.md.

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use storage::{NewSample, ParameterSet};
use tracing::debug;

use crate::error::ApiError;
use crate::routes::{numeric_field, MessageResponse};
use crate::AppState;

/// Latest parameter set, or all-zero gains when nothing was submitted
/// yet. The controller treats zero gains as "hold output at zero", which
/// is the safe idle state for the heater.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum PidResponse {
    Present(ParameterSet),
    Sentinel {
        kp: f64,
        ki: f64,
        kd: f64,
        setpoint: f64,
    },
}

/// GET `/esp32/get-pid` — the device polls its tuning parameters.
pub async fn get_pid(
    State(state): State<Arc<AppState>>,
) -> Result<Json<PidResponse>, ApiError> {
    let response = match state.params.latest().await? {
        Some(params) => PidResponse::Present(params),
        None => PidResponse::Sentinel {
            kp: 0.0,
            ki: 0.0,
            kd: 0.0,
            setpoint: 0.0,
        },
    };
    Ok(Json(response))
}

/// POST `/esp32/update-output` — the device reports a telemetry sample.
pub async fn update_output(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<Json<MessageResponse>, ApiError> {
    let new = NewSample {
        temperature: numeric_field(&body, "temperature")?,
        output: numeric_field(&body, "output")?,
    };

    let created = state.telemetry.record(new).await?;
    debug!(
        id = created.id,
        temperature = created.temperature,
        output = created.output,
        "sample recorded"
    );

    Ok(Json(MessageResponse {
        message: "Output logged",
    }))
}
