//! Decision pipeline parameters.

use mindloop_domain::BreakerConfig;
use std::time::Duration;

/// Controls the judgment fan-out and action selection.
///
/// Each module launch is wrapped with `module_timeout` per attempt,
/// `max_attempts` tries with linear `retry_backoff`, and a breaker built
/// from `module_breaker`. The whole fan-out is bounded by `fanout_deadline`.
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionParams {
    pub module_timeout: Duration,
    pub max_attempts: u32,
    pub retry_backoff: Duration,
    pub fanout_deadline: Duration,
    pub module_breaker: BreakerConfig,
    /// Extra backend calls allowed to fix malformed structured output
    pub validation_retries: u32,
    /// Timeout for the action-selection call
    pub selection_timeout: Duration,
}

impl Default for DecisionParams {
    fn default() -> Self {
        Self {
            module_timeout: Duration::from_secs(30),
            max_attempts: 3,
            retry_backoff: Duration::from_millis(250),
            fanout_deadline: Duration::from_secs(120),
            module_breaker: BreakerConfig::default(),
            validation_retries: 2,
            selection_timeout: Duration::from_secs(30),
        }
    }
}

impl DecisionParams {
    /// Longest a single decision can take: the fan-out deadline plus the
    /// selection call and its one guardrail re-run.
    pub fn decision_budget(&self) -> Duration {
        self.fanout_deadline
            .saturating_add(self.selection_timeout.saturating_mul(2))
    }

    // ==================== Builder Methods ====================

    pub fn with_module_timeout(mut self, timeout: Duration) -> Self {
        self.module_timeout = timeout;
        self
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    pub fn with_fanout_deadline(mut self, deadline: Duration) -> Self {
        self.fanout_deadline = deadline;
        self
    }

    pub fn with_module_breaker(mut self, breaker: BreakerConfig) -> Self {
        self.module_breaker = breaker;
        self
    }

    pub fn with_validation_retries(mut self, retries: u32) -> Self {
        self.validation_retries = retries;
        self
    }

    pub fn with_selection_timeout(mut self, timeout: Duration) -> Self {
        self.selection_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let params = DecisionParams::default();
        assert_eq!(params.module_timeout, Duration::from_secs(30));
        assert_eq!(params.max_attempts, 3);
        assert_eq!(params.module_breaker.failure_threshold, 3);
    }

    #[test]
    fn test_decision_budget_covers_rerun() {
        let params = DecisionParams::default()
            .with_fanout_deadline(Duration::from_secs(60))
            .with_selection_timeout(Duration::from_secs(20));
        assert_eq!(params.decision_budget(), Duration::from_secs(100));
    }

    #[test]
    fn test_max_attempts_never_zero() {
        assert_eq!(DecisionParams::default().with_max_attempts(0).max_attempts, 1);
    }
}
