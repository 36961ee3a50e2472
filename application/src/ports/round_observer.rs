//! Round progress port
//!
//! Callbacks for displaying scheduler progress. Implementations live in the
//! presentation layer; every method has an empty default.

use mindloop_domain::{
    ActionType, AgentState, Escalation, RoundResult, StateTransition, ThoughtId,
};

/// Callback for progress updates from the round loop
pub trait RoundObserver: Send + Sync {
    fn on_round_start(&self, _round: u64, _state: AgentState) {}

    /// A thought finished the pipeline (`action` is `None` when it failed
    /// before an action was chosen).
    fn on_thought_processed(&self, _thought: &ThoughtId, _action: Option<ActionType>, _success: bool) {}

    fn on_escalation(&self, _escalation: &Escalation) {}

    fn on_round_complete(&self, _result: &RoundResult) {}

    fn on_transition(&self, _transition: &StateTransition) {}

    fn on_paused(&self, _paused: bool) {}

    fn on_shutdown(&self, _reason: &str) {}
}

/// No-op observer for when progress reporting is not needed
pub struct NoRoundProgress;

impl RoundObserver for NoRoundProgress {}
