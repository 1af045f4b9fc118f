//! Sensor Node Firmware
//!
//! Wires the ring buffers, UART paths, acquisition and tick scheduler into
//! the node's main loop and runs it against a simulated board.

use ring_buffer::{RingBuffer, INPUT_BUFFER_LEN, OUTPUT_BUFFER_LEN};
use sensor_report::{Acquisition, AnalogFrontEnd, SimulatedAdc};
use std::io::Write;
use tick_scheduler::{PeriodTimer, ScheduledTask, SleepTimer, TickHandler, TickScheduler};
use tracing::{error, info};
use tracing_subscriber::FmtSubscriber;
use uart_driver::{MockUart, RxPath, TxKick, TxPath, TxQueue, UartHardware, UartInterrupts};

mod board;
mod error;
mod node;
mod settings;

pub use board::SimBoard;
pub use error::FirmwareError;
pub use node::{SensorNode, SimLed, StatusLed, Task};
pub use settings::{FirmwareConfig, LogConfig, DEFAULT_CONFIG_FILE, ENV_PREFIX};

/// Initialize logging
///
/// Logs go to stderr; stdout carries the simulated UART output.
pub fn init_logging(config: &LogConfig) -> Result<(), FirmwareError> {
    let builder = FmtSubscriber::builder()
        .with_max_level(config.max_level()?)
        .with_target(true)
        .with_writer(std::io::stderr);

    if config.json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

/// Counters collected over a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks: u64,
    pub reports: u64,
    pub truncated_reports: u64,
    pub led_toggles: u64,
    pub conversions: u64,
    pub rejected_conversions: u64,
    pub tx_dropped: usize,
    pub rx_dropped: usize,
    pub bytes_sent: u64,
}

/// Everything the main loop touches: node state, interrupt handlers, board
struct Mcu<'a, A, W> {
    node: SensorNode<'a, A, SimLed, OUTPUT_BUFFER_LEN, INPUT_BUFFER_LEN>,
    irq: UartInterrupts<'a, OUTPUT_BUFFER_LEN, INPUT_BUFFER_LEN>,
    board: SimBoard<W>,
    sink_error: Option<std::io::Error>,
}

impl<A: AnalogFrontEnd, W: Write> TickHandler<Task> for Mcu<'_, A, W> {
    fn on_task(&mut self, task: Task) {
        self.node.run_task(task, self.board.uart_mut());
    }

    fn every_tick(&mut self) {
        self.node.poll_acquisition();

        if self.sink_error.is_some() {
            return;
        }
        if let Err(e) = self.board.advance(&mut self.irq) {
            error!("UART sink failed: {}", e);
            self.sink_error = Some(e);
        }
    }
}

impl<A: AnalogFrontEnd, W: Write> Mcu<'_, A, W> {
    fn summary(&self, ticks: u64) -> RunSummary {
        RunSummary {
            ticks,
            reports: self.node.reports(),
            truncated_reports: self.node.truncated(),
            led_toggles: self.node.led().toggles(),
            conversions: self.node.acquisition().completed(),
            rejected_conversions: self.node.acquisition().rejected(),
            tx_dropped: self.node.tx_dropped(),
            rx_dropped: self.node.rx_dropped(),
            bytes_sent: self.board.bytes_sent(),
        }
    }
}

/// Run the node, pacing ticks with the host clock
pub fn run<W: Write>(config: &FirmwareConfig, sink: W) -> Result<RunSummary, FirmwareError> {
    let mut timer = SleepTimer::new(config.fcy_hz);
    run_with_timer(config, &mut timer, sink)
}

/// Run the node with a caller-supplied tick timer
///
/// Returns after `max_ticks` ticks, or when writing to `sink` fails. Without
/// `max_ticks` it only returns on a sink failure.
pub fn run_with_timer<P, W>(
    config: &FirmwareConfig,
    timer: &mut P,
    sink: W,
) -> Result<RunSummary, FirmwareError>
where
    P: PeriodTimer,
    W: Write,
{
    config.validate()?;
    let tick_hz = config.scheduler.tick_hz;

    timer.configure_period(config.scheduler.tick_period()?)?;

    let mut uart = MockUart::new(config.tx_fifo_depth).with_fcy(config.fcy_hz);
    uart.configure(&config.uart)?;

    let mut scheduler = TickScheduler::new([
        ScheduledTask::from_period(Task::ToggleLed, tick_hz, config.led_period())?,
        ScheduledTask::from_period(Task::Report, tick_hz, config.report_period())?,
    ]);

    let mut input = RingBuffer::<INPUT_BUFFER_LEN>::new();
    let mut output = RingBuffer::<OUTPUT_BUFFER_LEN>::new();
    let kick = TxKick::new();
    let (rx_producer, rx_consumer) = input.split();
    let (tx_producer, tx_consumer) = output.split();

    let acquisition = Acquisition::new(
        SimulatedAdc::new(config.adc_conversion_polls),
        config.calibration.clone(),
    );
    let bytes_per_tick = config.uart.bytes_per_second() / f64::from(tick_hz);

    let mut mcu = Mcu {
        node: SensorNode::new(
            TxQueue::new(tx_producer, &kick),
            rx_consumer,
            acquisition,
            SimLed::new(),
            config.report_format,
        ),
        irq: UartInterrupts::new(TxPath::new(tx_consumer, &kick), RxPath::new(rx_producer)),
        board: SimBoard::new(uart, bytes_per_tick, sink),
        sink_error: None,
    };

    info!(
        "Sensor node running at {} Hz, {:?} reports every {} ms",
        tick_hz, config.report_format, config.report_period_ms
    );

    // Run in one-second slices so a dead sink is noticed.
    let mut remaining = config.max_ticks;
    loop {
        let slice = remaining.map_or(u64::from(tick_hz), |left| left.min(u64::from(tick_hz)));
        if slice == 0 {
            break;
        }

        scheduler.run_for(slice, timer, &mut mcu);

        if let Some(e) = mcu.sink_error.take() {
            return Err(FirmwareError::Sink(e));
        }
        if let Some(left) = remaining.as_mut() {
            *left -= slice;
        }
    }

    let summary = mcu.summary(scheduler.ticks());
    info!("Stopped after {} ticks: {:?}", summary.ticks, summary);
    Ok(summary)
}
