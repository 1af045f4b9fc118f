//! Foreground side of the transmit path

use crate::hal::UartHardware;
use ring_buffer::Producer;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, trace};

/// Manual-trigger request shared by the transmit interrupt and the producer
///
/// The transmit interrupt fires once per byte finished, not once per byte
/// queued. When it finds nothing to send it arms this flag, and the next
/// enqueue consumes it to pend the interrupt again.
#[derive(Debug)]
pub struct TxKick {
    armed: AtomicBool,
}

impl TxKick {
    /// Create an armed kick: at boot nothing is in flight
    pub const fn new() -> Self {
        Self {
            armed: AtomicBool::new(true),
        }
    }

    /// Request a restart on the next enqueue (interrupt side)
    pub fn arm(&self) {
        self.armed.store(true, Ordering::Release);
    }

    /// Consume a pending request (producer side)
    pub fn take(&self) -> bool {
        self.armed.swap(false, Ordering::AcqRel)
    }

    /// Check whether a restart is pending
    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::Acquire)
    }
}

impl Default for TxKick {
    fn default() -> Self {
        Self::new()
    }
}

/// Bridge that queues outgoing bytes and restarts an idle transmitter
pub struct TxQueue<'a, const N: usize> {
    producer: Producer<'a, N>,
    kick: &'a TxKick,
    dropped: usize,
}

impl<'a, const N: usize> TxQueue<'a, N> {
    /// Create a queue over the output buffer's producer half
    pub fn new(producer: Producer<'a, N>, kick: &'a TxKick) -> Self {
        Self {
            producer,
            kick,
            dropped: 0,
        }
    }

    /// Queue `bytes` in order, returning how many were accepted
    ///
    /// Once the buffer fills the rest of `bytes` is dropped. A return value
    /// below `bytes.len()` means the output was truncated.
    pub fn enqueue<U: UartHardware>(&mut self, bytes: &[u8], hw: &mut U) -> usize {
        let mut accepted = 0;
        for &byte in bytes {
            if !self.producer.push(byte) {
                break;
            }
            accepted += 1;
        }

        if accepted < bytes.len() {
            // Stop at the first refusal so a later byte never lands after a gap.
            self.dropped += bytes.len() - accepted;
            debug!(
                "Output buffer full, dropped {} of {} bytes",
                bytes.len() - accepted,
                bytes.len()
            );
        }

        if accepted > 0 && self.kick.take() {
            trace!("Transmitter idle, pending TX interrupt");
            hw.pend_tx_interrupt();
        }

        accepted
    }

    /// Queue a string, see [`TxQueue::enqueue`]
    pub fn enqueue_str<U: UartHardware>(&mut self, text: &str, hw: &mut U) -> usize {
        self.enqueue(text.as_bytes(), hw)
    }

    /// Bytes waiting for the transmitter
    pub fn pending(&self) -> usize {
        self.producer.len()
    }

    /// Bytes dropped on overflow since boot
    pub fn dropped(&self) -> usize {
        self.dropped
    }
}
