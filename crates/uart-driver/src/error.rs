//! UART Error Types

use thiserror::Error;

/// Errors that can occur while configuring the UART
///
/// The data path itself has no error states: overflow drops bytes and a
/// spurious interrupt only re-arms the transmit kick.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UartError {
    /// Baud rate of zero
    #[error("Invalid baud rate: {0}")]
    InvalidBaudRate(u32),

    /// Baud rate generator value does not fit the 16-bit register
    #[error("Baud rate {baud} needs divisor {divisor}, outside 0..=65535")]
    DivisorOutOfRange { baud: u32, divisor: u64 },
}
