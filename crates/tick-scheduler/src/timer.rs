//! Tick timer abstraction and host implementations

use crate::error::SchedulerError;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Hardware timer that paces the main loop
pub trait PeriodTimer {
    /// Compute and program the divider for `period`
    fn configure_period(&mut self, period: Duration) -> Result<(), SchedulerError>;

    /// Block until the next period boundary
    fn wait_period(&mut self);
}

/// Timer clock prescaler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum Prescaler {
    Div1 = 1,
    Div8 = 8,
    Div64 = 64,
    Div256 = 256,
}

impl Prescaler {
    /// All prescalers, smallest first
    pub const ALL: [Prescaler; 4] = [
        Prescaler::Div1,
        Prescaler::Div8,
        Prescaler::Div64,
        Prescaler::Div256,
    ];

    /// Division factor
    pub fn factor(&self) -> u32 {
        *self as u32
    }
}

/// Prescaler and period register value for one timer period
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerDivider {
    /// Clock prescaler
    pub prescaler: Prescaler,
    /// 16-bit period register
    pub period_register: u16,
}

impl TimerDivider {
    /// Pick the smallest prescaler whose period register fits 16 bits
    pub fn compute(fcy_hz: u32, period: Duration) -> Result<Self, SchedulerError> {
        if fcy_hz == 0 {
            return Err(SchedulerError::ZeroTickRate);
        }
        if period.is_zero() {
            return Err(SchedulerError::ZeroPeriod);
        }

        let counts = u128::from(fcy_hz) * period.as_nanos() / 1_000_000_000;
        if counts == 0 {
            return Err(SchedulerError::PeriodTooShort {
                period_ns: period.as_nanos(),
            });
        }

        for prescaler in Prescaler::ALL {
            let register = counts / u128::from(prescaler.factor());
            if let Ok(period_register) = u16::try_from(register) {
                return Ok(Self {
                    prescaler,
                    period_register,
                });
            }
        }

        let max_counts = u128::from(u16::MAX) * u128::from(Prescaler::Div256.factor());
        Err(SchedulerError::PeriodTooLong {
            period_ms: period.as_millis(),
            max_ms: max_counts * 1000 / u128::from(fcy_hz),
        })
    }

    /// Period actually produced by this divider
    pub fn actual_period(&self, fcy_hz: u32) -> Duration {
        let counts = u64::from(self.period_register) * u64::from(self.prescaler.factor());
        Duration::from_nanos(counts * 1_000_000_000 / u64::from(fcy_hz.max(1)))
    }
}

/// Host timer that sleeps to absolute deadlines
///
/// Deadlines advance by exactly one period so late wake-ups do not accumulate
/// drift. If the loop falls more than a period behind, the schedule restarts
/// from now instead of bursting to catch up.
pub struct SleepTimer {
    fcy_hz: u32,
    period: Option<Duration>,
    deadline: Option<Instant>,
    overruns: u64,
}

impl SleepTimer {
    /// Create a timer clocked at `fcy_hz`
    pub fn new(fcy_hz: u32) -> Self {
        Self {
            fcy_hz,
            period: None,
            deadline: None,
            overruns: 0,
        }
    }

    /// Number of periods the loop overran
    pub fn overruns(&self) -> u64 {
        self.overruns
    }
}

impl PeriodTimer for SleepTimer {
    fn configure_period(&mut self, period: Duration) -> Result<(), SchedulerError> {
        let divider = TimerDivider::compute(self.fcy_hz, period)?;
        let actual = divider.actual_period(self.fcy_hz);
        info!(
            "Timer period {:?}: prescaler 1:{}, PR={} ({:?} actual)",
            period,
            divider.prescaler.factor(),
            divider.period_register,
            actual
        );
        self.period = Some(actual);
        self.deadline = Some(Instant::now() + actual);
        Ok(())
    }

    fn wait_period(&mut self) {
        let (Some(period), Some(deadline)) = (self.period, self.deadline) else {
            warn!("wait_period called on an unconfigured timer");
            return;
        };

        let now = Instant::now();
        if now < deadline {
            std::thread::sleep(deadline - now);
            self.deadline = Some(deadline + period);
        } else if now - deadline > period {
            self.overruns += 1;
            debug!("Tick overrun by {:?}, resynchronizing", now - deadline);
            self.deadline = Some(now + period);
        } else {
            self.deadline = Some(deadline + period);
        }
    }
}

/// Timer that returns immediately and counts periods (for tests)
#[derive(Debug, Default)]
pub struct ManualTimer {
    period: Option<Duration>,
    waits: u64,
}

impl ManualTimer {
    /// Create an unconfigured timer
    pub fn new() -> Self {
        Self::default()
    }

    /// Configured period, if any
    pub fn period(&self) -> Option<Duration> {
        self.period
    }

    /// Number of completed waits
    pub fn waits(&self) -> u64 {
        self.waits
    }
}

impl PeriodTimer for ManualTimer {
    fn configure_period(&mut self, period: Duration) -> Result<(), SchedulerError> {
        if period.is_zero() {
            return Err(SchedulerError::ZeroPeriod);
        }
        self.period = Some(period);
        Ok(())
    }

    fn wait_period(&mut self) {
        self.waits += 1;
    }
}
