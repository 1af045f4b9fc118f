//! Firmware configuration
//!
//! Values come from built-in defaults, then an optional TOML file, then
//! `SENSOR_NODE__*` environment variables (`__` separates nesting levels,
//! e.g. `SENSOR_NODE__UART__BAUD_RATE=19200`).

use crate::error::FirmwareError;
use config::{Config, Environment, File, FileFormat};
use sensor_report::{Calibration, ReportFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tick_scheduler::{SchedulerConfig, TimerDivider};
use tracing::Level;
use uart_driver::{UartConfig, DEFAULT_FCY_HZ};

/// File read when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "sensor-node.toml";

/// Environment variable prefix
pub const ENV_PREFIX: &str = "SENSOR_NODE";

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Maximum level: trace, debug, info, warn or error
    pub level: String,
    /// Emit JSON lines instead of human-readable text
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl LogConfig {
    /// Parsed maximum level
    pub fn max_level(&self) -> Result<Level, FirmwareError> {
        Level::from_str(&self.level).map_err(|_| FirmwareError::InvalidLogLevel(self.level.clone()))
    }
}

/// Complete node configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FirmwareConfig {
    /// Instruction clock feeding the timer and the baud rate generator (Hz)
    pub fcy_hz: u32,
    /// Main loop rate
    pub scheduler: SchedulerConfig,
    /// Status LED toggle period (ms)
    pub led_period_ms: u64,
    /// Report period (ms)
    pub report_period_ms: u64,
    /// Sentence shape
    pub report_format: ReportFormat,
    /// Serial line settings
    pub uart: UartConfig,
    /// Depth of the simulated transmit FIFO
    pub tx_fifo_depth: usize,
    /// Polls a simulated ADC conversion takes
    pub adc_conversion_polls: u32,
    /// Raw count to physical unit conversion
    pub calibration: Calibration,
    /// Logging
    pub log: LogConfig,
    /// Stop after this many ticks (run forever when absent)
    pub max_ticks: Option<u64>,
}

impl Default for FirmwareConfig {
    fn default() -> Self {
        Self {
            fcy_hz: DEFAULT_FCY_HZ,
            scheduler: SchedulerConfig::default(),
            led_period_ms: 500,
            report_period_ms: 1000,
            report_format: ReportFormat::default(),
            uart: UartConfig::default(),
            tx_fifo_depth: 4,
            adc_conversion_polls: 1,
            calibration: Calibration::default(),
            log: LogConfig::default(),
            max_ticks: None,
        }
    }
}

impl FirmwareConfig {
    /// Load from defaults, a TOML file and the environment
    ///
    /// An explicit `path` must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, FirmwareError> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let config: Self = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Parse TOML text on top of the defaults
    pub fn from_toml(text: &str) -> Result<Self, FirmwareError> {
        let config: Self = Config::builder()
            .add_source(File::from_str(text, FileFormat::Toml))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Reject values the node cannot run with
    pub fn validate(&self) -> Result<(), FirmwareError> {
        let tick = self.scheduler.tick_period()?;
        TimerDivider::compute(self.fcy_hz, tick)?;

        if self.led_period_ms == 0 {
            return Err(FirmwareError::InvalidConfig(
                "led_period_ms must be positive".to_string(),
            ));
        }
        if self.report_period_ms == 0 {
            return Err(FirmwareError::InvalidConfig(
                "report_period_ms must be positive".to_string(),
            ));
        }
        if self.tx_fifo_depth == 0 {
            return Err(FirmwareError::InvalidConfig(
                "tx_fifo_depth must be positive".to_string(),
            ));
        }

        self.uart.validate(self.fcy_hz)?;
        self.calibration.validate()?;
        self.log.max_level()?;
        Ok(())
    }

    /// Status LED toggle period
    pub fn led_period(&self) -> Duration {
        Duration::from_millis(self.led_period_ms)
    }

    /// Report period
    pub fn report_period(&self) -> Duration {
        Duration::from_millis(self.report_period_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uart_driver::Parity;

    #[test]
    fn test_defaults() {
        let config = FirmwareConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.scheduler.tick_hz, 100);
        assert_eq!(config.uart.baud_rate, 9600);
        assert_eq!(config.report_format, ReportFormat::Sens);
        assert_eq!(config.max_ticks, None);
    }

    #[test]
    fn test_from_toml() {
        let config = FirmwareConfig::from_toml(
            r#"
            report_format = "raw"
            max_ticks = 250

            [uart]
            baud_rate = 19200
            parity = "even"

            [log]
            level = "debug"
            json = true
            "#,
        )
        .unwrap();

        assert_eq!(config.report_format, ReportFormat::Raw);
        assert_eq!(config.max_ticks, Some(250));
        assert_eq!(config.uart.baud_rate, 19200);
        assert_eq!(config.uart.parity, Parity::Even);
        assert!(config.log.json);
        assert_eq!(config.log.max_level().unwrap(), Level::DEBUG);
        // untouched sections keep their defaults
        assert_eq!(config.scheduler.tick_hz, 100);
        assert_eq!(config.led_period_ms, 500);
    }

    #[test]
    fn test_rejects_invalid_values() {
        assert!(matches!(
            FirmwareConfig::from_toml("report_period_ms = 0"),
            Err(FirmwareError::InvalidConfig(_))
        ));
        assert!(matches!(
            FirmwareConfig::from_toml("[scheduler]\ntick_hz = 0"),
            Err(FirmwareError::Scheduler(_))
        ));
        assert!(matches!(
            FirmwareConfig::from_toml("[uart]\nbaud_rate = 0"),
            Err(FirmwareError::Uart(_))
        ));
        assert!(matches!(
            FirmwareConfig::from_toml("[log]\nlevel = \"loud\""),
            Err(FirmwareError::InvalidLogLevel(_))
        ));
        assert!(matches!(
            FirmwareConfig::from_toml("report_format = \"nmea\""),
            Err(FirmwareError::Config(_))
        ));
    }

    #[test]
    fn test_missing_explicit_file() {
        let result = FirmwareConfig::load(Some(Path::new("/nonexistent/sensor-node.toml")));
        assert!(matches!(result, Err(FirmwareError::Config(_))));
    }
}
