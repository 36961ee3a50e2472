//! Round loop and mode admission parameters.

use mindloop_domain::{IdleThresholds, Priority};
use std::time::Duration;

/// Controls the round loop and what each mode admits.
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulerParams {
    /// Global ceiling on simultaneously active tasks
    pub max_active_tasks: usize,
    /// Tasks activated per round at most
    pub activation_batch: usize,
    pub queue_capacity: usize,
    /// Thoughts processed concurrently within one batch
    pub batch_concurrency: usize,
    /// Upper bound for one thought's trip through the pipeline
    pub thought_timeout: Duration,
    /// Minimum priority admitted in low-activity and idle-reflection modes
    pub high_priority_threshold: Priority,
    pub idle: IdleThresholds,
    /// Idle-reflection rounds between benchmark pulses
    pub reflection_interval_rounds: u64,
    /// Pause between rounds
    pub round_interval: Duration,
    /// Wait for each bootstrap step to finish before starting the next
    pub bootstrap_blocking: bool,
    pub bootstrap_step_timeout: Duration,
    /// Start directly in normal-work
    pub skip_bootstrap: bool,
    /// How long shutdown waits for in-flight work
    pub shutdown_deadline: Duration,
    /// Stop after this many rounds
    pub max_rounds: Option<u64>,
}

impl Default for SchedulerParams {
    fn default() -> Self {
        Self {
            max_active_tasks: 10,
            activation_batch: 5,
            queue_capacity: 50,
            batch_concurrency: 5,
            thought_timeout: Duration::from_secs(180),
            high_priority_threshold: Priority::saturating(8),
            idle: IdleThresholds::default(),
            reflection_interval_rounds: 5,
            round_interval: Duration::from_secs(1),
            bootstrap_blocking: true,
            bootstrap_step_timeout: Duration::from_secs(300),
            skip_bootstrap: false,
            shutdown_deadline: Duration::from_secs(30),
            max_rounds: None,
        }
    }
}

impl SchedulerParams {
    // ==================== Builder Methods ====================

    pub fn with_max_active_tasks(mut self, max: usize) -> Self {
        self.max_active_tasks = max;
        self
    }

    pub fn with_activation_batch(mut self, batch: usize) -> Self {
        self.activation_batch = batch;
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    pub fn with_batch_concurrency(mut self, concurrency: usize) -> Self {
        self.batch_concurrency = concurrency.max(1);
        self
    }

    pub fn with_thought_timeout(mut self, timeout: Duration) -> Self {
        self.thought_timeout = timeout;
        self
    }

    pub fn with_high_priority_threshold(mut self, threshold: Priority) -> Self {
        self.high_priority_threshold = threshold;
        self
    }

    pub fn with_idle_thresholds(mut self, idle: IdleThresholds) -> Self {
        self.idle = idle;
        self
    }

    pub fn with_reflection_interval_rounds(mut self, rounds: u64) -> Self {
        self.reflection_interval_rounds = rounds.max(1);
        self
    }

    pub fn with_round_interval(mut self, interval: Duration) -> Self {
        self.round_interval = interval;
        self
    }

    pub fn with_bootstrap_blocking(mut self, blocking: bool) -> Self {
        self.bootstrap_blocking = blocking;
        self
    }

    pub fn with_bootstrap_step_timeout(mut self, timeout: Duration) -> Self {
        self.bootstrap_step_timeout = timeout;
        self
    }

    pub fn with_skip_bootstrap(mut self, skip: bool) -> Self {
        self.skip_bootstrap = skip;
        self
    }

    pub fn with_shutdown_deadline(mut self, deadline: Duration) -> Self {
        self.shutdown_deadline = deadline;
        self
    }

    pub fn with_max_rounds(mut self, max: Option<u64>) -> Self {
        self.max_rounds = max;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let params = SchedulerParams::default();
        assert_eq!(params.high_priority_threshold.value(), 8);
        assert!(params.bootstrap_blocking);
        assert!(params.max_rounds.is_none());
    }

    #[test]
    fn test_builder() {
        let params = SchedulerParams::default()
            .with_queue_capacity(3)
            .with_batch_concurrency(0)
            .with_max_rounds(Some(10));
        assert_eq!(params.queue_capacity, 3);
        assert_eq!(params.batch_concurrency, 1);
        assert_eq!(params.max_rounds, Some(10));
    }
}
