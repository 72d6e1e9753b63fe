//! Headless Dashboard Watcher - Main Entry Point
//!
//! Runs the dashboard's poll loop without a browser and logs each
//! reading. Useful for watching a rig from a terminal.

use poller::{DashboardPoller, PollerConfig, DEFAULT_CAPACITY};
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Debug, Deserialize)]
#[serde(default)]
struct WatchConfig {
    relay_url: String,
    interval_ms: u64,
    window_capacity: usize,
    /// Operator session cookie (`session=<token>`), since the telemetry
    /// routes are operator-only.
    session_cookie: Option<String>,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            relay_url: "http://127.0.0.1:3000".to_string(),
            interval_ms: 2000,
            window_capacity: DEFAULT_CAPACITY,
            session_cookie: None,
        }
    }
}

impl WatchConfig {
    fn load() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::with_name("watch").required(false))
            .add_source(config::Environment::with_prefix("WATCH"))
            .build()?
            .try_deserialize()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    let config = WatchConfig::load()?;
    info!(relay = %config.relay_url, "=== ThermoLink Watch ===");

    let poller = DashboardPoller::new(PollerConfig {
        base_url: config.relay_url,
        interval: Duration::from_millis(config.interval_ms),
        window_capacity: config.window_capacity,
        session_cookie: config.session_cookie,
    });

    match poller.seed().await {
        Ok(applied) => info!(samples = applied, "seeded chart window"),
        Err(err) => warn!(error = %err, "seed failed, starting empty"),
    }

    poller.run().await;
    Ok(())
}
