//! Simulated UART peripheral
//!
//! Models a transmitter with a small hardware FIFO in front of the shift
//! register and a receiver FIFO, with the interrupt flags the handlers expect.

use crate::config::UartConfig;
use crate::error::UartError;
use crate::hal::UartHardware;
use crate::DEFAULT_FCY_HZ;
use std::collections::VecDeque;
use tracing::{debug, info};

/// Default transmit FIFO depth (matches a 4-deep hardware buffer)
pub const DEFAULT_TX_FIFO_DEPTH: usize = 4;

/// UART simulation for tests and host runs (no hardware required)
#[derive(Debug)]
pub struct MockUart {
    /// Active line configuration
    config: Option<UartConfig>,
    /// Instruction clock used to validate the baud rate
    fcy_hz: u32,
    /// Bytes written but not yet shifted out
    tx_fifo: VecDeque<u8>,
    /// Transmit FIFO depth
    tx_fifo_depth: usize,
    /// Bytes received but not yet read
    rx_fifo: VecDeque<u8>,
    /// Everything that has left the transmitter
    wire: Vec<u8>,
    /// Transmit interrupt flag
    tx_flag: bool,
    /// Receive interrupt flag
    rx_flag: bool,
}

impl MockUart {
    /// Create an unconfigured UART with the given transmit FIFO depth
    pub fn new(tx_fifo_depth: usize) -> Self {
        Self {
            config: None,
            fcy_hz: DEFAULT_FCY_HZ,
            tx_fifo: VecDeque::with_capacity(tx_fifo_depth),
            tx_fifo_depth: tx_fifo_depth.max(1),
            rx_fifo: VecDeque::new(),
            wire: Vec::new(),
            tx_flag: false,
            rx_flag: false,
        }
    }

    /// Use a different instruction clock for baud validation
    pub fn with_fcy(mut self, fcy_hz: u32) -> Self {
        self.fcy_hz = fcy_hz;
        self
    }

    /// Get the active configuration
    pub fn config(&self) -> Option<&UartConfig> {
        self.config.as_ref()
    }

    /// Deliver bytes from the remote end and raise the receive flag
    pub fn inject_rx(&mut self, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        self.rx_fifo.extend(bytes);
        self.rx_flag = true;
    }

    /// Finish shifting one byte onto the wire
    ///
    /// Raises the transmit flag for every finished byte, mirroring an
    /// interrupt that fires per byte sent. Returns `None` while idle.
    pub fn shift_out(&mut self) -> Option<u8> {
        let byte = self.tx_fifo.pop_front()?;
        self.wire.push(byte);
        self.tx_flag = true;
        Some(byte)
    }

    /// A byte is being transmitted
    pub fn tx_in_flight(&self) -> bool {
        !self.tx_fifo.is_empty()
    }

    /// Snapshot of the transmit FIFO
    pub fn tx_fifo(&self) -> Vec<u8> {
        self.tx_fifo.iter().copied().collect()
    }

    /// Take everything transmitted so far
    pub fn take_wire(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.wire)
    }
}

impl Default for MockUart {
    fn default() -> Self {
        Self::new(DEFAULT_TX_FIFO_DEPTH)
    }
}

impl UartHardware for MockUart {
    fn configure(&mut self, config: &UartConfig) -> Result<(), UartError> {
        let divisor = config.brg_divisor(self.fcy_hz)?;
        info!(
            "UART configured: {} baud, BRG={}, {} bits/frame",
            config.baud_rate,
            divisor,
            config.frame_bits()
        );
        self.config = Some(*config);
        Ok(())
    }

    fn tx_full(&self) -> bool {
        self.tx_fifo.len() >= self.tx_fifo_depth
    }

    fn write_tx(&mut self, byte: u8) {
        if self.tx_full() {
            // Real hardware overwrites silently; the handlers never get here.
            debug!("Write to full TX FIFO, byte {:#04x} lost", byte);
            return;
        }
        self.tx_fifo.push_back(byte);
    }

    fn rx_available(&self) -> bool {
        !self.rx_fifo.is_empty()
    }

    fn read_rx(&mut self) -> u8 {
        self.rx_fifo.pop_front().unwrap_or(0)
    }

    fn tx_interrupt_pending(&self) -> bool {
        self.tx_flag
    }

    fn rx_interrupt_pending(&self) -> bool {
        self.rx_flag
    }

    fn clear_tx_interrupt(&mut self) {
        self.tx_flag = false;
    }

    fn clear_rx_interrupt(&mut self) {
        self.rx_flag = false;
    }

    fn pend_tx_interrupt(&mut self) {
        self.tx_flag = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_uart_creation() {
        let uart = MockUart::default();
        assert!(uart.config().is_none());
        assert!(!uart.tx_full());
        assert!(!uart.tx_in_flight());
    }

    #[test]
    fn test_mock_configure() {
        let mut uart = MockUart::default();
        uart.configure(&UartConfig::default()).unwrap();
        assert_eq!(uart.config().map(|c| c.baud_rate), Some(9600));

        let bad = UartConfig {
            baud_rate: 0,
            ..Default::default()
        };
        assert!(uart.configure(&bad).is_err());
        assert_eq!(uart.config().map(|c| c.baud_rate), Some(9600));
    }

    #[test]
    fn test_mock_fifo_and_flags() {
        let mut uart = MockUart::new(2);
        uart.write_tx(b'a');
        uart.write_tx(b'b');
        assert!(uart.tx_full());
        uart.write_tx(b'c');
        assert_eq!(uart.tx_fifo(), b"ab".to_vec());

        assert!(!uart.tx_interrupt_pending());
        assert_eq!(uart.shift_out(), Some(b'a'));
        assert!(uart.tx_interrupt_pending());
        assert_eq!(uart.shift_out(), Some(b'b'));
        assert_eq!(uart.shift_out(), None);
        assert_eq!(uart.take_wire(), b"ab".to_vec());
        assert!(uart.take_wire().is_empty());
    }
}
