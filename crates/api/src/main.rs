//! Telemetry Relay - Main Entry Point

use api::{init_logging, run_server, RelayConfig};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let config = RelayConfig::load()?;
    info!("=== ThermoLink Relay v{} ===", env!("CARGO_PKG_VERSION"));
    info!(
        db = %config.database_path,
        addr = %config.bind_addr,
        "starting telemetry relay"
    );

    run_server(config).await
}
