//! Simulated board
//!
//! Stands in for the physical serial line: each tick the transmitter shifts
//! out as many bytes as the configured baud rate allows, and every finished
//! byte raises the transmit interrupt before the next one goes out.

use std::io::Write;
use tracing::trace;
use uart_driver::{MockUart, UartInterrupts};

/// Serial line timing plus the UART peripheral
pub struct SimBoard<W> {
    uart: MockUart,
    bytes_per_tick: f64,
    credit: f64,
    sink: W,
    bytes_sent: u64,
}

impl<W: Write> SimBoard<W> {
    /// Create a board whose line carries `bytes_per_tick` characters per tick
    pub fn new(uart: MockUart, bytes_per_tick: f64, sink: W) -> Self {
        Self {
            uart,
            bytes_per_tick,
            credit: 0.0,
            sink,
            bytes_sent: 0,
        }
    }

    /// The UART peripheral
    pub fn uart(&self) -> &MockUart {
        &self.uart
    }

    pub fn uart_mut(&mut self) -> &mut MockUart {
        &mut self.uart
    }

    /// Bytes written to the sink so far
    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent
    }

    /// Advance the line by one tick
    ///
    /// Services interrupts pended since the last tick, shifts out the bytes
    /// the line can carry and forwards them to the sink.
    pub fn advance<const TX: usize, const RX: usize>(
        &mut self,
        irq: &mut UartInterrupts<'_, TX, RX>,
    ) -> std::io::Result<usize> {
        irq.dispatch(&mut self.uart);

        self.credit += self.bytes_per_tick;
        let mut shifted = 0;
        while self.credit >= 1.0 && self.uart.shift_out().is_some() {
            self.credit -= 1.0;
            shifted += 1;
            irq.dispatch(&mut self.uart);
        }
        if !self.uart.tx_in_flight() {
            // an idle line does not bank time
            self.credit = 0.0;
        }

        let wire = self.uart.take_wire();
        if !wire.is_empty() {
            trace!("{} bytes on the wire", wire.len());
            self.sink.write_all(&wire)?;
            self.sink.flush()?;
            self.bytes_sent += wire.len() as u64;
        }
        Ok(shifted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ring_buffer::RingBuffer;
    use uart_driver::{RxPath, TxKick, TxPath, TxQueue};

    #[test]
    fn test_line_rate_limits_output() {
        let mut output = RingBuffer::<48>::new();
        let mut input = RingBuffer::<10>::new();
        let kick = TxKick::new();
        let (tx_producer, tx_consumer) = output.split();
        let (rx_producer, _rx_consumer) = input.split();
        let mut irq = UartInterrupts::new(TxPath::new(tx_consumer, &kick), RxPath::new(rx_producer));
        let mut queue = TxQueue::new(tx_producer, &kick);

        let mut sink = Vec::new();
        let mut board = SimBoard::new(MockUart::default(), 2.5, &mut sink);

        assert_eq!(queue.enqueue(b"0123456789", board.uart_mut()), 10);

        let per_tick: Vec<usize> = (0..5).map(|_| board.advance(&mut irq).unwrap()).collect();
        assert_eq!(per_tick, vec![2, 3, 2, 3, 0]);
        assert_eq!(board.bytes_sent(), 10);
        assert!(kick.is_armed());
        drop(board);
        assert_eq!(sink, b"0123456789");
    }

    #[test]
    fn test_idle_line_does_not_bank_credit() {
        let mut output = RingBuffer::<48>::new();
        let mut input = RingBuffer::<10>::new();
        let kick = TxKick::new();
        let (tx_producer, tx_consumer) = output.split();
        let (rx_producer, _rx_consumer) = input.split();
        let mut irq = UartInterrupts::new(TxPath::new(tx_consumer, &kick), RxPath::new(rx_producer));
        let mut queue = TxQueue::new(tx_producer, &kick);
        let mut board = SimBoard::new(MockUart::default(), 1.5, Vec::new());

        for _ in 0..10 {
            assert_eq!(board.advance(&mut irq).unwrap(), 0);
        }
        queue.enqueue(b"abc", board.uart_mut());
        assert_eq!(board.advance(&mut irq).unwrap(), 1);
        assert_eq!(board.advance(&mut irq).unwrap(), 2);
    }
}
