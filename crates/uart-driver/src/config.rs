//! UART Line Configuration

use crate::error::UartError;
use serde::{Deserialize, Serialize};

/// Number of data bits per frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataBits {
    Eight,
    Nine,
}

/// Parity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parity {
    None,
    Even,
    Odd,
}

/// Number of stop bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopBits {
    One,
    Two,
}

/// UART configuration passed to [`crate::UartHardware::configure`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UartConfig {
    /// Baud rate in bits per second
    pub baud_rate: u32,
    /// Data bits per frame
    pub data_bits: DataBits,
    /// Parity mode
    pub parity: Parity,
    /// Stop bits per frame
    pub stop_bits: StopBits,
}

impl Default for UartConfig {
    fn default() -> Self {
        Self {
            baud_rate: 9600,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
        }
    }
}

impl UartConfig {
    /// Check the configuration against the peripheral's limits
    pub fn validate(&self, fcy_hz: u32) -> Result<(), UartError> {
        self.brg_divisor(fcy_hz).map(|_| ())
    }

    /// Compute the standard-speed baud rate generator value
    ///
    /// `BRG = FCY / (16 * baud) - 1`
    pub fn brg_divisor(&self, fcy_hz: u32) -> Result<u16, UartError> {
        if self.baud_rate == 0 {
            return Err(UartError::InvalidBaudRate(self.baud_rate));
        }

        let per_bit = 16 * u64::from(self.baud_rate);
        let quotient = u64::from(fcy_hz) / per_bit;
        if quotient == 0 {
            return Err(UartError::DivisorOutOfRange {
                baud: self.baud_rate,
                divisor: 0,
            });
        }

        let divisor = quotient - 1;
        u16::try_from(divisor).map_err(|_| UartError::DivisorOutOfRange {
            baud: self.baud_rate,
            divisor,
        })
    }

    /// Bits on the wire per character (start + data + parity + stop)
    pub fn frame_bits(&self) -> u32 {
        let data = match self.data_bits {
            DataBits::Eight => 8,
            DataBits::Nine => 9,
        };
        let parity = match self.parity {
            Parity::None => 0,
            Parity::Even | Parity::Odd => 1,
        };
        let stop = match self.stop_bits {
            StopBits::One => 1,
            StopBits::Two => 2,
        };
        1 + data + parity + stop
    }

    /// Characters per second the line can carry
    pub fn bytes_per_second(&self) -> f64 {
        f64::from(self.baud_rate) / f64::from(self.frame_bits())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DEFAULT_FCY_HZ;

    #[test]
    fn test_default_divisor() {
        // 72 MHz / (16 * 9600) - 1 = 467.75 -> 467
        let config = UartConfig::default();
        assert_eq!(config.brg_divisor(DEFAULT_FCY_HZ), Ok(467));
        assert_eq!(config.frame_bits(), 10);
        assert!((config.bytes_per_second() - 960.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_baud_rejected() {
        let config = UartConfig {
            baud_rate: 0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(DEFAULT_FCY_HZ),
            Err(UartError::InvalidBaudRate(0))
        );
    }

    #[test]
    fn test_divisor_range() {
        let too_fast = UartConfig {
            baud_rate: 10_000_000,
            ..Default::default()
        };
        assert!(matches!(
            too_fast.brg_divisor(DEFAULT_FCY_HZ),
            Err(UartError::DivisorOutOfRange { divisor: 0, .. })
        ));

        let too_slow = UartConfig {
            baud_rate: 50,
            ..Default::default()
        };
        assert!(too_slow.validate(DEFAULT_FCY_HZ).is_err());
    }

    #[test]
    fn test_frame_bits_with_parity() {
        let config = UartConfig {
            parity: Parity::Even,
            stop_bits: StopBits::Two,
            ..Default::default()
        };
        assert_eq!(config.frame_bits(), 12);
    }
}
