//! Dashboard Telemetry Routes

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use storage::Sample;

use crate::error::ApiError;
use crate::AppState;

/// Hard cap on `/graph-data`: the route serves at most the 100 most
/// recent samples regardless of what the client asks for.
const GRAPH_WINDOW_MAX: u32 = 100;

/// Latest sample, or the dashboard's "no data yet" placeholder.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum LatestOutputResponse {
    Present(Sample),
    Sentinel {
        temperature: &'static str,
        output: &'static str,
    },
}

/// GET `/latest-output` — the max-id sample, or `"--"` placeholders so
/// the dashboard renders an empty gauge instead of an error.
pub async fn latest_output(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<LatestOutputResponse>, ApiError> {
    state.require_operator(&headers)?;

    let response = match state.telemetry.latest().await? {
        Some(sample) => LatestOutputResponse::Present(sample),
        None => LatestOutputResponse::Sentinel {
            temperature: "--",
            output: "--",
        },
    };
    Ok(Json(response))
}

/// Query parameters for the graph window
#[derive(Debug, Deserialize)]
pub struct GraphQuery {
    /// Maximum number of samples to return
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    GRAPH_WINDOW_MAX
}

/// GET `/graph-data` — up to 100 most recent samples, oldest first. The
/// chart appends to a sliding buffer and expects chronological order, not
/// insertion-reverse.
pub async fn graph_data(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<GraphQuery>,
) -> Result<Json<Vec<Sample>>, ApiError> {
    state.require_operator(&headers)?;

    let limit = query.limit.min(GRAPH_WINDOW_MAX);
    let window = state.telemetry.window(limit).await?;
    Ok(Json(window))
}
