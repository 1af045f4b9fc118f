//! End-to-end runs of the node against the simulated board

use firmware::{run_with_timer, FirmwareConfig, FirmwareError};
use sensor_report::{ReportFormat, Sentence};
use std::io::{self, Write};
use std::time::Duration;
use tick_scheduler::ManualTimer;

fn config(max_ticks: u64) -> FirmwareConfig {
    FirmwareConfig {
        max_ticks: Some(max_ticks),
        ..Default::default()
    }
}

#[test]
fn test_sens_reports_once_per_second() {
    let mut timer = ManualTimer::new();
    let mut wire = Vec::new();

    let summary = run_with_timer(&config(305), &mut timer, &mut wire).unwrap();

    assert_eq!(summary.ticks, 305);
    assert_eq!(timer.waits(), 305);
    assert_eq!(timer.period(), Some(Duration::from_millis(10)));
    assert_eq!(summary.reports, 3);
    assert_eq!(summary.led_toggles, 6);
    assert_eq!(summary.tx_dropped, 0);
    assert_eq!(summary.bytes_sent, wire.len() as u64);

    let text = String::from_utf8(wire).unwrap();
    let sentences: Vec<Sentence> = text
        .split_inclusive('*')
        .map(|line| Sentence::parse(line).unwrap())
        .collect();
    assert_eq!(sentences.len(), 3);
    for sentence in sentences {
        match sentence {
            Sentence::Sens { distance, battery } => {
                assert!((3.5..=4.3).contains(&battery));
                assert!(distance > 0.0);
            }
            other => panic!("unexpected sentence {:?}", other),
        }
    }
}

#[test]
fn test_raw_format_lines() {
    let config = FirmwareConfig {
        report_format: ReportFormat::Raw,
        ..config(210)
    };
    let mut timer = ManualTimer::new();
    let mut wire = Vec::new();

    run_with_timer(&config, &mut timer, &mut wire).unwrap();

    let text = String::from_utf8(wire).unwrap();
    let lines: Vec<&str> = text.split_inclusive('\n').collect();
    assert_eq!(lines.len(), 2);
    for line in lines {
        assert!(matches!(Sentence::parse(line), Ok(Sentence::Raw(_))));
    }
}

#[test]
fn test_slow_line_truncates_reports() {
    let mut config = config(1000);
    config.uart.baud_rate = 300;
    config.report_period_ms = 100;

    let mut timer = ManualTimer::new();
    let mut wire = Vec::new();
    let summary = run_with_timer(&config, &mut timer, &mut wire).unwrap();

    // 30 characters per second against 180 offered
    assert!(summary.reports > 0 && summary.reports <= 100);
    assert!(summary.truncated_reports > 0);
    assert!(summary.tx_dropped > 0);
    assert_eq!(summary.bytes_sent, wire.len() as u64);
    assert!(wire.len() <= 300);
    assert!(wire.starts_with(b"$SENS,"));
}

#[test]
fn test_invalid_config_rejected() {
    let mut config = config(10);
    config.scheduler.tick_hz = 0;
    let mut timer = ManualTimer::new();

    let result = run_with_timer(&config, &mut timer, Vec::new());
    assert!(matches!(result, Err(FirmwareError::Scheduler(_))));
    assert_eq!(timer.waits(), 0);
}

struct BrokenPipe;

impl Write for BrokenPipe {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_sink_failure_stops_run() {
    let mut timer = ManualTimer::new();
    let result = run_with_timer(&config(500), &mut timer, BrokenPipe);

    assert!(matches!(result, Err(FirmwareError::Sink(_))));
    // the first report goes out at tick 100; the run stops at the end of that slice
    assert_eq!(timer.waits(), 100);
}
