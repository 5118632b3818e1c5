//! Driver Monitoring Service - Main Entry Point

use anyhow::Context;
use api::{init_logging, run_server, Settings};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings_file = std::env::args().nth(1);
    let settings = Settings::load(settings_file.as_deref()).context("failed to load settings")?;

    init_logging(settings.json_logs).context("failed to initialise logging")?;

    info!("=== Driver Monitor v{} ===", env!("CARGO_PKG_VERSION"));
    info!(
        window_capacity = settings.monitor.window_capacity,
        pairing_tolerance_ms = settings.monitor.pairing_tolerance_ms,
        "Starting driver monitoring service..."
    );

    run_server(settings).await
}
