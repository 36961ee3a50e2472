//! What a finished run looked like.

use crate::lifecycle::TaskCounts;
use mindloop_domain::{AgentState, Escalation, RoundResult, StateTransition};
use serde::Serialize;

/// Summary of one round-loop run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub final_state: AgentState,
    pub rounds: u64,
    pub transitions: Vec<StateTransition>,
    pub processed: usize,
    pub failed: usize,
    pub escalations: Vec<Escalation>,
    /// Round-level error entries, in order
    pub errors: Vec<String>,
    pub tasks: TaskCounts,
    pub shutdown_reason: String,
    /// Whether in-flight work finished before the shutdown deadline
    pub drained: bool,
    pub started_at: String,
    pub finished_at: String,
    pub elapsed_ms: u64,
}

/// Running totals collected while the loop runs.
#[derive(Debug, Default)]
pub(crate) struct Totals {
    pub processed: usize,
    pub failed: usize,
    pub escalations: Vec<Escalation>,
    pub errors: Vec<String>,
}

impl Totals {
    pub fn add(&mut self, result: &RoundResult) {
        self.processed += result.processed;
        self.failed += result.failed;
        self.escalations.extend(result.escalations.iter().cloned());
        self.errors
            .extend(result.errors.iter().map(|e| format!("round {}: {}", result.round, e)));
    }
}

impl RunSummary {
    pub fn succeeded(&self) -> bool {
        self.failed == 0 && self.escalations.is_empty()
    }
}
