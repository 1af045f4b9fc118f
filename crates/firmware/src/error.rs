//! Firmware Error Types

use sensor_report::ReportError;
use thiserror::Error;
use tick_scheduler::SchedulerError;
use uart_driver::UartError;

/// Errors raised while bringing the node up
///
/// Once the main loop runs, data-path failures (full buffers, bad samples)
/// are handled in place; only a failing UART sink ends the run.
#[derive(Debug, Error)]
pub enum FirmwareError {
    /// Configuration sources could not be read or deserialized
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Configuration values are inconsistent
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Unknown log level name
    #[error("Invalid log level: {0:?}")]
    InvalidLogLevel(String),

    /// A global subscriber was already installed
    #[error("Failed to install tracing subscriber: {0}")]
    Logging(#[from] tracing::subscriber::SetGlobalDefaultError),

    #[error(transparent)]
    Uart(#[from] UartError),

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    #[error(transparent)]
    Report(#[from] ReportError),

    /// Writing transmitted bytes to the output failed
    #[error("UART sink write failed: {0}")]
    Sink(#[from] std::io::Error),
}
