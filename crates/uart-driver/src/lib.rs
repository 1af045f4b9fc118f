//! Interrupt-Driven UART Driver
//!
//! This crate provides the receive and transmit interrupt paths of the serial
//! link and the foreground bridge that queues outgoing text. Both directions go
//! through [`ring_buffer::RingBuffer`]; the register-level peripheral is reached
//! only through the [`UartHardware`] trait.

mod config;
mod error;
mod hal;
mod isr;
mod mock;
mod queue;

pub use config::{DataBits, Parity, StopBits, UartConfig};
pub use error::UartError;
pub use hal::UartHardware;
pub use isr::{RxPath, TxPath, UartInterrupts};
pub use mock::MockUart;
pub use queue::{TxKick, TxQueue};

/// Default instruction clock of the target (Hz)
pub const DEFAULT_FCY_HZ: u32 = 72_000_000;
