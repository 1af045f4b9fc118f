//! Fixed-Rate Tick Scheduler
//!
//! Cooperative main-loop scheduling: a hardware timer paces fixed-length
//! ticks, and each task fires when its tick counter reaches its threshold.

mod error;
mod scheduler;
mod timer;

pub use error::SchedulerError;
pub use scheduler::{ScheduledTask, SchedulerConfig, TickHandler, TickScheduler};
pub use timer::{ManualTimer, PeriodTimer, Prescaler, SleepTimer, TimerDivider};
