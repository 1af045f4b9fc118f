//! Tick Scheduler Implementation

use crate::error::SchedulerError;
use crate::timer::PeriodTimer;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::time::Duration;
use tracing::{debug, info};

/// Configuration for the tick scheduler
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Main loop rate in Hz (default: 100)
    pub tick_hz: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { tick_hz: 100 }
    }
}

impl SchedulerConfig {
    /// Length of one tick
    pub fn tick_period(&self) -> Result<Duration, SchedulerError> {
        if self.tick_hz == 0 {
            return Err(SchedulerError::ZeroTickRate);
        }
        Ok(Duration::from_secs(1) / self.tick_hz)
    }
}

/// A task that fires every `threshold` ticks
#[derive(Debug, Clone)]
pub struct ScheduledTask<T> {
    /// Identifier handed to the handler when the task fires
    pub id: T,
    /// Ticks between firings
    threshold: u32,
    /// Ticks accumulated since the last firing
    counter: u32,
}

impl<T: Copy> ScheduledTask<T> {
    /// Create a task firing every `threshold` ticks
    pub fn new(id: T, threshold: u32) -> Result<Self, SchedulerError> {
        if threshold == 0 {
            return Err(SchedulerError::ZeroThreshold);
        }
        Ok(Self {
            id,
            threshold,
            counter: 0,
        })
    }

    /// Create a task firing every `period` at a `tick_hz` loop rate
    ///
    /// The threshold is rounded to the nearest whole tick.
    pub fn from_period(id: T, tick_hz: u32, period: Duration) -> Result<Self, SchedulerError> {
        if tick_hz == 0 {
            return Err(SchedulerError::ZeroTickRate);
        }
        let ticks = (period.as_secs_f64() * f64::from(tick_hz)).round();
        let threshold = if ticks >= f64::from(u32::MAX) {
            u32::MAX
        } else {
            ticks as u32
        };
        Self::new(id, threshold)
    }

    /// Ticks between firings
    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Ticks accumulated since the last firing
    pub fn counter(&self) -> u32 {
        self.counter
    }

    /// Count one tick; returns `true` (and resets) when the task is due
    fn advance(&mut self) -> bool {
        self.counter += 1;
        if self.counter >= self.threshold {
            self.counter = 0;
            true
        } else {
            false
        }
    }
}

/// Work performed by the main loop
pub trait TickHandler<T> {
    /// Run the body of a task that came due this tick
    fn on_task(&mut self, task: T);

    /// Unconditional work done on every tick, after due tasks
    fn every_tick(&mut self);
}

/// Fixed-rate cooperative scheduler
///
/// Tasks are evaluated in table order on every tick. There is no preemption
/// and no suspension point other than the end-of-tick wait.
pub struct TickScheduler<T, const N: usize> {
    /// Task table, in evaluation order
    tasks: [ScheduledTask<T>; N],
    /// Ticks elapsed since start
    ticks: u64,
}

impl<T: Copy + Debug, const N: usize> TickScheduler<T, N> {
    /// Create a scheduler over a fixed task table
    pub fn new(tasks: [ScheduledTask<T>; N]) -> Self {
        for task in &tasks {
            debug!("Task {:?} every {} ticks", task.id, task.threshold);
        }
        info!("Tick scheduler created with {} tasks", N);
        Self { tasks, ticks: 0 }
    }

    /// Advance every counter by one tick and fire the tasks that are due
    ///
    /// Returns how many tasks fired.
    pub fn tick(&mut self, mut fire: impl FnMut(T)) -> usize {
        self.ticks += 1;
        let mut fired = 0;
        for task in self.tasks.iter_mut() {
            if task.advance() {
                fire(task.id);
                fired += 1;
            }
        }
        fired
    }

    /// One loop iteration without the wait: due tasks, then per-tick work
    pub fn step<H: TickHandler<T>>(&mut self, handler: &mut H) {
        self.tick(|task| handler.on_task(task));
        handler.every_tick();
    }

    /// Run a bounded number of iterations
    pub fn run_for<P, H>(&mut self, iterations: u64, timer: &mut P, handler: &mut H)
    where
        P: PeriodTimer,
        H: TickHandler<T>,
    {
        for _ in 0..iterations {
            self.step(handler);
            timer.wait_period();
        }
    }

    /// Run forever
    pub fn run<P, H>(&mut self, timer: &mut P, handler: &mut H) -> !
    where
        P: PeriodTimer,
        H: TickHandler<T>,
    {
        info!("Starting tick scheduler");
        loop {
            self.step(handler);
            timer.wait_period();
        }
    }

    /// Ticks elapsed since start
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// The task table
    pub fn tasks(&self) -> &[ScheduledTask<T>] {
        &self.tasks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::ManualTimer;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Job {
        Blink,
        Report,
    }

    #[derive(Default)]
    struct Recorder {
        fired: Vec<(u64, Job)>,
        ticks: u64,
    }

    impl TickHandler<Job> for Recorder {
        fn on_task(&mut self, task: Job) {
            self.fired.push((self.ticks + 1, task));
        }

        fn every_tick(&mut self) {
            self.ticks += 1;
        }
    }

    fn scheduler() -> TickScheduler<Job, 2> {
        TickScheduler::new([
            ScheduledTask::from_period(Job::Blink, 100, Duration::from_millis(500)).unwrap(),
            ScheduledTask::from_period(Job::Report, 100, Duration::from_secs(1)).unwrap(),
        ])
    }

    #[test]
    fn test_scheduler_creation() {
        let scheduler = scheduler();
        assert_eq!(scheduler.tasks()[0].threshold(), 50);
        assert_eq!(scheduler.tasks()[1].threshold(), 100);
        assert_eq!(scheduler.ticks(), 0);
    }

    #[test]
    fn test_zero_threshold_rejected() {
        assert!(matches!(
            ScheduledTask::new(Job::Blink, 0),
            Err(SchedulerError::ZeroThreshold)
        ));
        assert!(matches!(
            ScheduledTask::from_period(Job::Blink, 100, Duration::from_millis(1)),
            Err(SchedulerError::ZeroThreshold)
        ));
        assert!(matches!(
            ScheduledTask::from_period(Job::Blink, 0, Duration::from_secs(1)),
            Err(SchedulerError::ZeroTickRate)
        ));
    }

    #[test]
    fn test_fires_once_per_threshold() {
        let mut scheduler = TickScheduler::new([ScheduledTask::new(Job::Blink, 50).unwrap()]);
        let mut fired_at = Vec::new();

        for tick in 1..=500u64 {
            scheduler.tick(|_| fired_at.push(tick));
            if fired_at.last() == Some(&tick) {
                assert_eq!(scheduler.tasks()[0].counter(), 0);
            } else {
                assert_eq!(u64::from(scheduler.tasks()[0].counter()), tick % 50);
            }
        }

        assert_eq!(fired_at, (1..=10).map(|n| n * 50).collect::<Vec<_>>());
        assert!(fired_at.windows(2).all(|w| w[1] - w[0] == 50));
    }

    #[test]
    fn test_run_for_dispatches_in_order() {
        let mut scheduler = scheduler();
        let mut timer = ManualTimer::new();
        let mut recorder = Recorder::default();

        scheduler.run_for(200, &mut timer, &mut recorder);

        assert_eq!(timer.waits(), 200);
        assert_eq!(recorder.ticks, 200);
        assert_eq!(
            recorder.fired,
            vec![
                (50, Job::Blink),
                (100, Job::Blink),
                (100, Job::Report),
                (150, Job::Blink),
                (200, Job::Blink),
                (200, Job::Report),
            ]
        );
    }

    #[test]
    fn test_tick_period() {
        let config = SchedulerConfig::default();
        assert_eq!(config.tick_period().unwrap(), Duration::from_millis(10));
        let bad = SchedulerConfig { tick_hz: 0 };
        assert!(bad.tick_period().is_err());
    }
}
