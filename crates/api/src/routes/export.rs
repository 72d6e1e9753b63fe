//! History Export Route

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use futures_util::stream::{self, StreamExt, TryStreamExt};
use std::sync::Arc;
use storage::StoreError;

use crate::csv;
use crate::error::ApiError;
use crate::AppState;

/// GET `/export-csv` — full ascending history as
/// `timestamp,temperature,output`.
///
/// Rows are streamed straight from the store's batched history stream
/// into the response body, so an arbitrarily large log never has to fit
/// in memory. An empty log exports just the header row.
pub async fn export_csv(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    state.require_operator(&headers)?;

    let header = stream::once(async {
        Ok::<Bytes, StoreError>(Bytes::from_static(csv::EXPORT_HEADER.as_bytes()))
    });
    let rows = state
        .telemetry
        .stream_all()
        .map_ok(|sample| Bytes::from(csv::sample_row(&sample)));

    let body = Body::from_stream(header.chain(rows));
    Ok((
        [
            (CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                CONTENT_DISPOSITION,
                "attachment; filename=\"pid_output.csv\"",
            ),
        ],
        body,
    )
        .into_response())
}
