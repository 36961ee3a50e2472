//! Escalations: failures that are reported as data instead of crashing a round.

use crate::core::current_timestamp;
use crate::core::ids::{TaskId, ThoughtId};
use crate::task::Thought;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a thought was escalated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationKind {
    /// A judgment module exhausted its retries (or its breaker was open)
    DmaFailure,
    /// A follow-up would have exceeded the configured round maximum
    RoundLimitExceeded,
    /// The registry had no usable provider for a capability
    ProviderExhausted,
    /// The selected action was outside the task's permitted set
    ConfigurationError,
}

impl EscalationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EscalationKind::DmaFailure => "dma_failure",
            EscalationKind::RoundLimitExceeded => "round_limit_exceeded",
            EscalationKind::ProviderExhausted => "provider_exhausted",
            EscalationKind::ConfigurationError => "configuration_error",
        }
    }
}

impl fmt::Display for EscalationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A thought escalation event.
///
/// Escalations signal upstream; they never choose a fallback themselves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Escalation {
    pub thought_id: ThoughtId,
    pub task_id: TaskId,
    pub kind: EscalationKind,
    /// Judgment module name, for module failures
    pub module: Option<String>,
    pub last_error: String,
    pub attempts: u32,
    pub round: u64,
    pub timestamp: u64,
}

impl Escalation {
    pub fn new(thought: &Thought, kind: EscalationKind, last_error: impl Into<String>, round: u64) -> Self {
        Self {
            thought_id: thought.id.clone(),
            task_id: thought.task_id.clone(),
            kind,
            module: None,
            last_error: last_error.into(),
            attempts: 0,
            round,
            timestamp: current_timestamp(),
        }
    }

    /// A judgment module that failed after `attempts` tries.
    pub fn dma_failure(
        thought: &Thought,
        module: impl Into<String>,
        last_error: impl Into<String>,
        attempts: u32,
        round: u64,
    ) -> Self {
        let mut escalation = Self::new(thought, EscalationKind::DmaFailure, last_error, round);
        escalation.module = Some(module.into());
        escalation.attempts = attempts;
        escalation
    }

    pub fn round_limit(thought: &Thought, max_rounds: u32, round: u64) -> Self {
        Self::new(
            thought,
            EscalationKind::RoundLimitExceeded,
            format!(
                "follow-up would reach round {} (max {})",
                thought.round_count + 1,
                max_rounds
            ),
            round,
        )
    }

    pub fn summary(&self) -> String {
        match &self.module {
            Some(module) => format!(
                "{} [{}] after {} attempt(s): {}",
                self.kind, module, self.attempts, self.last_error
            ),
            None => format!("{}: {}", self.kind, self.last_error),
        }
    }
}
