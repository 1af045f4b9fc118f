//! Report Error Types

use thiserror::Error;

/// Errors during acquisition, calibration and sentence handling
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReportError {
    /// Raw conversion result above full scale
    #[error("{field} count {value} is out of range [0, {max}]")]
    OutOfRange {
        field: &'static str,
        value: u16,
        max: u16,
    },

    /// Rendered sentence does not fit the output line
    #[error("Sentence exceeds {capacity} bytes")]
    Overflow { capacity: usize },

    /// Text does not match any sentence shape
    #[error("Invalid sentence format: {0:?}")]
    InvalidFormat(String),

    /// A numeric field did not parse
    #[error("Invalid {field} value: {text:?}")]
    InvalidNumber { field: &'static str, text: String },

    /// Calibration parameters are unusable
    #[error("Invalid calibration: {0}")]
    InvalidCalibration(&'static str),
}
