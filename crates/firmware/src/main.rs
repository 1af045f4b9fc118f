//! Sensor Node - Main Entry Point
//!
//! Usage: `sensor-node [CONFIG_FILE]`. Transmitted sentences are written to
//! stdout, logs to stderr.

use anyhow::Context;
use firmware::{init_logging, run, FirmwareConfig};
use std::path::PathBuf;
use tracing::info;

fn main() -> anyhow::Result<()> {
    let path = std::env::args_os().nth(1).map(PathBuf::from);

    let config = FirmwareConfig::load(path.as_deref()).context("Failed to load configuration")?;
    init_logging(&config.log).context("Failed to initialize logging")?;

    info!("=== Sensor Node v{} ===", env!("CARGO_PKG_VERSION"));
    if let Some(path) = &path {
        info!("Configuration loaded from {}", path.display());
    }

    let summary = run(&config, std::io::stdout().lock()).context("Sensor node stopped")?;
    info!(
        "Sent {} reports ({} bytes), {} bytes dropped on output, {} on input",
        summary.reports, summary.bytes_sent, summary.tx_dropped, summary.rx_dropped
    );

    Ok(())
}
