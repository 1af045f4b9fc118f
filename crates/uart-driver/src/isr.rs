//! Receive and transmit interrupt handlers

use crate::hal::UartHardware;
use crate::queue::TxKick;
use ring_buffer::{Consumer, Producer};
use tracing::trace;

/// Receive interrupt path: drains the hardware into the input buffer
pub struct RxPath<'a, const N: usize> {
    producer: Producer<'a, N>,
}

impl<'a, const N: usize> RxPath<'a, N> {
    /// Create the handler over the input buffer's producer half
    pub fn new(producer: Producer<'a, N>) -> Self {
        Self { producer }
    }

    /// Handle a receive interrupt, returning how many bytes were stored
    ///
    /// Reads until the hardware has nothing pending. Bytes that do not fit are
    /// discarded; the line is never stalled.
    pub fn on_interrupt<U: UartHardware>(&mut self, hw: &mut U) -> usize {
        hw.clear_rx_interrupt();

        let mut stored = 0;
        while hw.rx_available() {
            let byte = hw.read_rx();
            if self.producer.push(byte) {
                stored += 1;
            } else {
                trace!("Input buffer full, dropped {:#04x}", byte);
            }
        }
        stored
    }

    /// Bytes dropped on overflow since boot
    pub fn dropped(&self) -> usize {
        self.producer.dropped()
    }
}

/// Transmit interrupt path: drains the output buffer into the hardware
pub struct TxPath<'a, const N: usize> {
    consumer: Consumer<'a, N>,
    kick: &'a TxKick,
}

impl<'a, const N: usize> TxPath<'a, N> {
    /// Create the handler over the output buffer's consumer half
    pub fn new(consumer: Consumer<'a, N>, kick: &'a TxKick) -> Self {
        Self { consumer, kick }
    }

    /// Handle a transmit interrupt, returning how many bytes were sent
    pub fn on_interrupt<U: UartHardware>(&mut self, hw: &mut U) -> usize {
        hw.clear_tx_interrupt();

        if self.consumer.is_empty() {
            trace!("TX interrupt with empty buffer, arming kick");
            self.kick.arm();
        }

        let mut sent = 0;
        while !hw.tx_full() {
            match self.consumer.pop() {
                Some(byte) => {
                    hw.write_tx(byte);
                    sent += 1;
                }
                None => break,
            }
        }
        sent
    }

    /// Bytes still queued for transmission
    pub fn pending(&self) -> usize {
        self.consumer.len()
    }
}

/// Both UART handlers, dispatched from the pending interrupt flags
pub struct UartInterrupts<'a, const TX: usize, const RX: usize> {
    pub tx: TxPath<'a, TX>,
    pub rx: RxPath<'a, RX>,
}

impl<'a, const TX: usize, const RX: usize> UartInterrupts<'a, TX, RX> {
    /// Bundle the two handlers
    pub fn new(tx: TxPath<'a, TX>, rx: RxPath<'a, RX>) -> Self {
        Self { tx, rx }
    }

    /// Run every handler whose flag is set, receive first
    ///
    /// Returns `true` if any handler ran.
    pub fn dispatch<U: UartHardware>(&mut self, hw: &mut U) -> bool {
        let mut serviced = false;
        if hw.rx_interrupt_pending() {
            self.rx.on_interrupt(hw);
            serviced = true;
        }
        if hw.tx_interrupt_pending() {
            self.tx.on_interrupt(hw);
            serviced = true;
        }
        serviced
    }
}
