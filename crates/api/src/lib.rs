//! Telemetry Relay API Server
//!
//! Composes the two append-only stores and the session gate into the
//! relay's HTTP contract: operator routes for tuning and telemetry
//! reads, ungated device routes for the embedded controller, and a
//! streamed CSV export. Each handler is a straight composition — parse,
//! gate where the route is operator-only, one store operation, serialize
//! — with no retries, so a response always implies the write or read it
//! reports actually completed.

use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_governor::GovernorLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

mod config;
mod csv;
mod error;
mod rate_limit;
mod routes;

pub use crate::config::{OperatorCredentials, RelayConfig};
pub use crate::error::ApiError;
pub use crate::rate_limit::RateLimitConfig;

use session_gate::{AccessGate, MemorySessions, OperatorIdentity, SessionStore};
use storage::{ParameterLog, SqliteStore, TelemetryLog};

/// Application state shared across handlers
///
/// The relay is the only writer to either store. Stores synchronize
/// internally, so requests run concurrently with no lock around the
/// state itself.
pub struct AppState {
    /// Tuning-parameter log
    pub params: Arc<dyn ParameterLog>,
    /// Telemetry sample log
    pub telemetry: Arc<dyn TelemetryLog>,
    /// Session collaborator, shared with the login surface
    pub sessions: Arc<dyn SessionStore>,
    /// Gate in front of operator-only routes
    pub gate: AccessGate,
    /// Seeded operator account
    pub operator: OperatorCredentials,
    /// Redirect target for unauthenticated operator requests
    pub login_redirect: String,
    /// Redirect target after login
    pub dashboard_redirect: String,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: Instant,
}

impl AppState {
    /// Create new application state around injected stores and sessions.
    pub fn new(
        params: Arc<dyn ParameterLog>,
        telemetry: Arc<dyn TelemetryLog>,
        sessions: Arc<dyn SessionStore>,
        config: &RelayConfig,
    ) -> Self {
        Self {
            gate: AccessGate::new(sessions.clone()),
            params,
            telemetry,
            sessions,
            operator: config.operator.clone(),
            login_redirect: config.login_redirect.clone(),
            dashboard_redirect: config.dashboard_redirect.clone(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: Instant::now(),
        }
    }

    /// Gate an operator-only route. Runs before anything else in the
    /// handler so an unauthenticated request can never reach a store.
    pub(crate) fn require_operator(
        &self,
        headers: &HeaderMap,
    ) -> Result<OperatorIdentity, ApiError> {
        let cookie = headers
            .get(header::COOKIE)
            .and_then(|value| value.to_str().ok());
        let decision = self.gate.authorize(cookie);
        match decision.identity {
            Some(identity) if decision.authenticated => Ok(identity),
            _ => Err(ApiError::Unauthenticated {
                redirect_to: self.login_redirect.clone(),
            }),
        }
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: u64,
    pub version: String,
    pub uptime_seconds: u64,
    pub metrics: StoreMetrics,
}

/// Per-store record counts
#[derive(Debug, Serialize)]
pub struct StoreMetrics {
    pub parameter_count: u64,
    pub sample_count: u64,
}

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Operator surface
        .route("/update", post(routes::params::update))
        .route("/latest-output", get(routes::telemetry::latest_output))
        .route("/graph-data", get(routes::telemetry::graph_data))
        .route("/export-csv", get(routes::export::export_csv))
        // Device surface (ungated, see routes::device)
        .route("/esp32/get-pid", get(routes::device::get_pid))
        .route("/esp32/update-output", post(routes::device::update_output))
        // Login surface
        .route("/login", post(routes::session::login))
        .route("/logout", get(routes::session::logout))
        .route("/health", get(health_handler))
        .with_state(state)
}

/// Health check handler
async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp,
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        metrics: StoreMetrics {
            parameter_count: state.params.count().await.unwrap_or(0),
            sample_count: state.telemetry.count().await.unwrap_or(0),
        },
    })
}

/// Initialize logging
pub fn init_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");
}

/// Run the server
pub async fn run_server(config: RelayConfig) -> anyhow::Result<()> {
    let store = Arc::new(SqliteStore::open(&config.database_path).await?);
    let sessions: Arc<dyn SessionStore> = Arc::new(MemorySessions::new());
    let state = Arc::new(AppState::new(store.clone(), store, sessions, &config));

    let governor = rate_limit::create_governor_config(&config.rate_limit);
    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(GovernorLayer { config: governor });

    info!("Starting relay API server on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
