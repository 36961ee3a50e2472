//! Per-round outcome reported by a mode processor.

use crate::escalation::Escalation;
use crate::state::AgentState;
use serde::{Deserialize, Serialize};

/// What one round accomplished.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundResult {
    pub round: u64,
    pub state: AgentState,
    /// Name of the processor that ran
    pub processor: String,
    /// Tasks activated this round
    pub activated: usize,
    /// Thoughts that reached a terminal pipeline outcome
    pub processed: usize,
    /// Thoughts that failed (including timeouts)
    pub failed: usize,
    /// True when no requester work was processed; system thoughts do not count
    pub idle: bool,
    pub errors: Vec<String>,
    /// Escalations raised while processing this round's thoughts
    pub escalations: Vec<Escalation>,
    pub elapsed_ms: u64,
}

impl RoundResult {
    pub fn new(round: u64, state: AgentState, processor: impl Into<String>) -> Self {
        Self {
            round,
            state,
            processor: processor.into(),
            activated: 0,
            processed: 0,
            failed: 0,
            idle: true,
            errors: Vec::new(),
            escalations: Vec::new(),
            elapsed_ms: 0,
        }
    }

    pub fn record_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
    }

    pub fn with_elapsed_ms(mut self, elapsed_ms: u64) -> Self {
        self.elapsed_ms = elapsed_ms;
        self
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty() || self.failed > 0
    }
}
