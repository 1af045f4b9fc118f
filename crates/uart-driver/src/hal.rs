//! UART peripheral abstraction

use crate::config::UartConfig;
use crate::error::UartError;

/// Register-level view of a UART peripheral
///
/// Interrupt handlers call the status and data methods; foreground code only
/// ever calls [`UartHardware::pend_tx_interrupt`] to restart an idle
/// transmitter.
pub trait UartHardware {
    /// Program line settings and enable both interrupts
    fn configure(&mut self, config: &UartConfig) -> Result<(), UartError>;

    /// Transmit buffer has no room for another byte
    fn tx_full(&self) -> bool;

    /// Write one byte to the transmit register
    fn write_tx(&mut self, byte: u8);

    /// At least one received byte is waiting
    fn rx_available(&self) -> bool;

    /// Read one byte from the receive register
    fn read_rx(&mut self) -> u8;

    /// Transmit interrupt flag is set
    fn tx_interrupt_pending(&self) -> bool;

    /// Receive interrupt flag is set
    fn rx_interrupt_pending(&self) -> bool;

    /// Acknowledge the transmit interrupt
    fn clear_tx_interrupt(&mut self);

    /// Acknowledge the receive interrupt
    fn clear_rx_interrupt(&mut self);

    /// Raise the transmit interrupt flag from software
    fn pend_tx_interrupt(&mut self);
}
