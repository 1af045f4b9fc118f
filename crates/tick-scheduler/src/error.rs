//! Scheduler Error Types

use thiserror::Error;

/// Errors while building the task table or programming the tick timer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    /// A task would fire on every zero-th tick
    #[error("Task threshold must be at least one tick")]
    ZeroThreshold,

    /// Tick rate of zero
    #[error("Tick rate must be non-zero")]
    ZeroTickRate,

    /// Requested timer period of zero
    #[error("Timer period must be non-zero")]
    ZeroPeriod,

    /// Period shorter than one timer count
    #[error("Timer period {period_ns}ns is shorter than one clock cycle")]
    PeriodTooShort { period_ns: u128 },

    /// Period does not fit the 16-bit period register at any prescaler
    #[error("Timer period {period_ms}ms exceeds the maximum of {max_ms}ms")]
    PeriodTooLong { period_ms: u128, max_ms: u128 },
}
