//! Sensor node application logic

use metrics::counter;
use ring_buffer::Consumer;
use sensor_report::{Acquisition, AnalogFrontEnd, Reading, ReportFormat, Sentence};
use tracing::{debug, trace, warn};
use uart_driver::{TxQueue, UartHardware};

/// Periodic work items of the main loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    /// Blink the status LED
    ToggleLed,
    /// Send the latest reading
    Report,
}

/// Status indicator
pub trait StatusLed {
    /// Invert the LED
    fn toggle(&mut self);

    /// Current state
    fn is_on(&self) -> bool;
}

/// LED that only records its state
#[derive(Debug, Default)]
pub struct SimLed {
    on: bool,
    toggles: u64,
}

impl SimLed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of toggles so far
    pub fn toggles(&self) -> u64 {
        self.toggles
    }
}

impl StatusLed for SimLed {
    fn toggle(&mut self) {
        self.on = !self.on;
        self.toggles += 1;
        trace!("LED {}", if self.on { "on" } else { "off" });
    }

    fn is_on(&self) -> bool {
        self.on
    }
}

/// Foreground state of the node
///
/// Holds the producer side of the output buffer and the consumer side of
/// the input buffer. Received bytes are kept but not interpreted.
pub struct SensorNode<'a, A, L, const TX: usize, const RX: usize> {
    tx: TxQueue<'a, TX>,
    input: Consumer<'a, RX>,
    acquisition: Acquisition<A>,
    led: L,
    format: ReportFormat,
    reports: u64,
    truncated: u64,
    render_failures: u64,
}

impl<'a, A, L, const TX: usize, const RX: usize> SensorNode<'a, A, L, TX, RX>
where
    A: AnalogFrontEnd,
    L: StatusLed,
{
    pub fn new(
        tx: TxQueue<'a, TX>,
        input: Consumer<'a, RX>,
        acquisition: Acquisition<A>,
        led: L,
        format: ReportFormat,
    ) -> Self {
        Self {
            tx,
            input,
            acquisition,
            led,
            format,
            reports: 0,
            truncated: 0,
            render_failures: 0,
        }
    }

    /// Per-tick acquisition step
    pub fn poll_acquisition(&mut self) -> Option<Reading> {
        self.acquisition.poll()
    }

    /// Run a task that came due
    pub fn run_task<U: UartHardware>(&mut self, task: Task, hw: &mut U) {
        match task {
            Task::ToggleLed => self.led.toggle(),
            Task::Report => self.report(hw),
        }
    }

    /// Render the latest reading and queue it for transmission
    ///
    /// Failures are logged and counted; the loop never stops for them.
    fn report<U: UartHardware>(&mut self, hw: &mut U) {
        let Some(reading) = self.acquisition.latest() else {
            debug!("No reading yet, skipping report");
            return;
        };

        let line = match Sentence::from_reading(self.format, reading).render() {
            Ok(line) => line,
            Err(e) => {
                self.render_failures += 1;
                warn!("Report not sent: {}", e);
                return;
            }
        };

        let accepted = self.tx.enqueue(line.as_bytes(), hw);
        if accepted > 0 {
            self.reports += 1;
            counter!("sensor_node_reports_total").increment(1);
        }
        if accepted < line.len() {
            self.truncated += 1;
            let lost = (line.len() - accepted) as u64;
            counter!("sensor_node_tx_dropped_bytes").increment(lost);
            warn!(
                "Output buffer full, report truncated to {} of {} bytes",
                accepted,
                line.len()
            );
        }

        counter!("sensor_node_rx_dropped_bytes").absolute(self.input.dropped() as u64);
    }

    /// Drain everything received so far
    pub fn take_input(&mut self) -> Vec<u8> {
        std::iter::from_fn(|| self.input.pop()).collect()
    }

    /// Bytes waiting in the input buffer
    pub fn input_pending(&self) -> usize {
        self.input.len()
    }

    /// Bytes the receive interrupt had to discard
    pub fn rx_dropped(&self) -> usize {
        self.input.dropped()
    }

    /// Bytes refused by the output buffer
    pub fn tx_dropped(&self) -> usize {
        self.tx.dropped()
    }

    /// Bytes queued but not yet handed to the UART
    pub fn tx_pending(&self) -> usize {
        self.tx.pending()
    }

    /// Reports queued (fully or partially)
    pub fn reports(&self) -> u64 {
        self.reports
    }

    /// Reports that did not fit the output buffer
    pub fn truncated(&self) -> u64 {
        self.truncated
    }

    /// Reports that failed to render
    pub fn render_failures(&self) -> u64 {
        self.render_failures
    }

    pub fn acquisition(&self) -> &Acquisition<A> {
        &self.acquisition
    }

    pub fn led(&self) -> &L {
        &self.led
    }
}
