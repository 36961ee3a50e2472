//! Per-provider failure isolation.
//!
//! ```text
//!            N consecutive failures within window
//!   Closed ─────────────────────────────────────► Open
//!     ▲                                            │
//!     │ one success              cooldown elapsed  │
//!     │                                            ▼
//!     └──────────────── HalfOpen ◄─────────────────┘
//!                          │
//!                          └── one failure ──► Open
//! ```
//!
//! The breaker is a plain state machine: callers pass `now` so behaviour is
//! deterministic under test, and shared owners wrap it in a lock. The only
//! externally forced transition is [`CircuitBreaker::reset`].

use crate::core::current_timestamp;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};

/// Thresholds for a circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakerConfig {
    /// Consecutive failures that open the breaker
    pub failure_threshold: u32,
    /// Failures older than this no longer count toward the threshold
    pub window: Duration,
    /// Time an open breaker waits before letting a probe through
    pub cooldown: Duration,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            window: Duration::from_secs(60),
            cooldown: Duration::from_secs(30),
        }
    }
}

impl BreakerConfig {
    pub fn with_failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold.max(1);
        self
    }

    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }
}

/// Breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

impl BreakerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            BreakerState::Closed => "closed",
            BreakerState::Open => "open",
            BreakerState::HalfOpen => "half_open",
        }
    }
}

impl fmt::Display for BreakerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A recorded state change, kept for health reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakerTransition {
    pub from: BreakerState,
    pub to: BreakerState,
    pub reason: String,
    /// Wall-clock milliseconds since the Unix epoch
    pub timestamp: u64,
}

/// Point-in-time view of a breaker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakerSnapshot {
    pub state: BreakerState,
    pub consecutive_failures: u32,
    pub transition_count: u64,
    pub last_transition: Option<BreakerTransition>,
}

/// Closed / open / half-open failure tracker.
#[derive(Debug, Clone)]
pub struct CircuitBreaker {
    config: BreakerConfig,
    state: BreakerState,
    consecutive_failures: u32,
    recent_failures: VecDeque<Instant>,
    opened_at: Option<Instant>,
    transition_count: u64,
    last_transition: Option<BreakerTransition>,
}

impl CircuitBreaker {
    pub fn new(config: BreakerConfig) -> Self {
        Self {
            config,
            state: BreakerState::Closed,
            consecutive_failures: 0,
            recent_failures: VecDeque::new(),
            opened_at: None,
            transition_count: 0,
            last_transition: None,
        }
    }

    pub fn config(&self) -> &BreakerConfig {
        &self.config
    }

    /// Current state, applying the open → half-open cooldown if it elapsed.
    pub fn poll(&mut self, now: Instant) -> BreakerState {
        if self.state == BreakerState::Open
            && let Some(opened_at) = self.opened_at
            && now.saturating_duration_since(opened_at) >= self.config.cooldown
        {
            self.transition(BreakerState::HalfOpen, "cooldown elapsed");
        }
        self.state
    }

    /// State as it would be observed at `now`, without recording anything.
    pub fn peek(&self, now: Instant) -> BreakerState {
        match (self.state, self.opened_at) {
            (BreakerState::Open, Some(opened_at))
                if now.saturating_duration_since(opened_at) >= self.config.cooldown =>
            {
                BreakerState::HalfOpen
            }
            (state, _) => state,
        }
    }

    /// Whether a call may go through (closed or half-open).
    pub fn allows_request(&mut self, now: Instant) -> bool {
        self.poll(now) != BreakerState::Open
    }

    pub fn record_success(&mut self, now: Instant) {
        match self.poll(now) {
            BreakerState::HalfOpen => {
                self.clear_failures();
                self.transition(BreakerState::Closed, "probe succeeded");
            }
            BreakerState::Closed => self.clear_failures(),
            // A call admitted before the breaker opened; the cooldown still applies.
            BreakerState::Open => {}
        }
    }

    pub fn record_failure(&mut self, now: Instant) {
        match self.poll(now) {
            BreakerState::HalfOpen => {
                self.consecutive_failures += 1;
                self.opened_at = Some(now);
                self.transition(BreakerState::Open, "probe failed");
            }
            BreakerState::Closed => {
                self.consecutive_failures += 1;
                self.recent_failures.push_back(now);
                while let Some(&oldest) = self.recent_failures.front() {
                    if now.saturating_duration_since(oldest) > self.config.window {
                        self.recent_failures.pop_front();
                    } else {
                        break;
                    }
                }
                if self.recent_failures.len() as u32 >= self.config.failure_threshold {
                    self.opened_at = Some(now);
                    self.transition(BreakerState::Open, "failure threshold reached");
                }
            }
            BreakerState::Open => {
                self.consecutive_failures += 1;
            }
        }
    }

    /// Force the breaker closed (administrative reset).
    pub fn reset(&mut self) {
        self.clear_failures();
        self.opened_at = None;
        if self.state != BreakerState::Closed {
            self.transition(BreakerState::Closed, "manual reset");
        }
    }

    pub fn snapshot(&self, now: Instant) -> BreakerSnapshot {
        BreakerSnapshot {
            state: self.peek(now),
            consecutive_failures: self.consecutive_failures,
            transition_count: self.transition_count,
            last_transition: self.last_transition.clone(),
        }
    }

    fn clear_failures(&mut self) {
        self.consecutive_failures = 0;
        self.recent_failures.clear();
    }

    fn transition(&mut self, to: BreakerState, reason: &str) {
        let from = self.state;
        self.state = to;
        self.transition_count += 1;
        self.last_transition = Some(BreakerTransition {
            from,
            to,
            reason: reason.to_string(),
            timestamp: current_timestamp(),
        });
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(BreakerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breaker() -> CircuitBreaker {
        CircuitBreaker::new(
            BreakerConfig::default()
                .with_window(Duration::from_secs(60))
                .with_cooldown(Duration::from_secs(10)),
        )
    }

    #[test]
    fn test_opens_after_three_consecutive_failures() {
        let mut b = breaker();
        let t0 = Instant::now();

        b.record_failure(t0);
        b.record_failure(t0);
        assert_eq!(b.poll(t0), BreakerState::Closed);
        b.record_failure(t0);
        assert_eq!(b.poll(t0), BreakerState::Open);
        assert!(!b.allows_request(t0));
    }

    #[test]
    fn test_success_resets_consecutive_count() {
        let mut b = breaker();
        let t0 = Instant::now();

        b.record_failure(t0);
        b.record_failure(t0);
        b.record_success(t0);
        b.record_failure(t0);
        b.record_failure(t0);
        assert_eq!(b.poll(t0), BreakerState::Closed);
    }

    #[test]
    fn test_failures_outside_window_do_not_count() {
        let mut b = breaker();
        let t0 = Instant::now();

        b.record_failure(t0);
        b.record_failure(t0);
        b.record_failure(t0 + Duration::from_secs(61));
        assert_eq!(b.poll(t0 + Duration::from_secs(61)), BreakerState::Closed);
    }

    #[test]
    fn test_half_open_after_cooldown_then_closes_on_success() {
        let mut b = breaker();
        let t0 = Instant::now();
        for _ in 0..3 {
            b.record_failure(t0);
        }

        let later = t0 + Duration::from_secs(10);
        assert_eq!(b.peek(later), BreakerState::HalfOpen);
        assert_eq!(b.poll(later), BreakerState::HalfOpen);
        assert!(b.allows_request(later));

        b.record_success(later);
        assert_eq!(b.poll(later), BreakerState::Closed);
        assert_eq!(b.snapshot(later).consecutive_failures, 0);
    }

    #[test]
    fn test_half_open_failure_reopens() {
        let mut b = breaker();
        let t0 = Instant::now();
        for _ in 0..3 {
            b.record_failure(t0);
        }

        let later = t0 + Duration::from_secs(10);
        b.record_failure(later);
        assert_eq!(b.poll(later), BreakerState::Open);
        // The cooldown restarts from the failed probe.
        assert_eq!(b.poll(later + Duration::from_secs(5)), BreakerState::Open);
        assert_eq!(
            b.poll(later + Duration::from_secs(10)),
            BreakerState::HalfOpen
        );
    }

    #[test]
    fn test_reset_forces_closed() {
        let mut b = breaker();
        let t0 = Instant::now();
        for _ in 0..3 {
            b.record_failure(t0);
        }
        b.reset();
        assert_eq!(b.poll(t0), BreakerState::Closed);

        let snapshot = b.snapshot(t0);
        assert_eq!(snapshot.transition_count, 2);
        let last = snapshot.last_transition.unwrap();
        assert_eq!(last.from, BreakerState::Open);
        assert_eq!(last.to, BreakerState::Closed);
        assert_eq!(last.reason, "manual reset");
    }

    #[test]
    fn test_transitions_are_counted() {
        let mut b = breaker();
        let t0 = Instant::now();
        for _ in 0..3 {
            b.record_failure(t0);
        }
        let later = t0 + Duration::from_secs(10);
        b.record_success(later);
        // closed -> open -> half_open -> closed
        assert_eq!(b.snapshot(later).transition_count, 3);
    }
}
