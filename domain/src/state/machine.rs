//! The state machine: current mode, round counter and transition history.

use super::agent_state::AgentState;
use super::transition::{self, GuardContext, TransitionTrigger};
use crate::core::current_timestamp;
use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// One applied transition. History entries are never modified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateTransition {
    pub from: AgentState,
    pub to: AgentState,
    /// Round in which the transition was applied
    pub round: u64,
    pub reason: String,
    pub trigger: TransitionTrigger,
    pub timestamp: u64,
}

/// Validated operating-mode state machine.
///
/// Owns the round number, which only ever increases, and the full
/// append-only transition history. A rejected transition leaves every field
/// untouched.
#[derive(Debug, Clone)]
pub struct StateMachine {
    current: AgentState,
    round: u64,
    history: Vec<StateTransition>,
}

impl StateMachine {
    /// A machine in the initial bootstrap state at round 0.
    pub fn new() -> Self {
        Self::starting_in(AgentState::Bootstrap)
    }

    /// A machine starting in an arbitrary state (e.g. skipping bootstrap).
    pub fn starting_in(state: AgentState) -> Self {
        Self {
            current: state,
            round: 0,
            history: Vec::new(),
        }
    }

    pub fn current(&self) -> AgentState {
        self.current
    }

    pub fn round(&self) -> u64 {
        self.round
    }

    pub fn history(&self) -> &[StateTransition] {
        &self.history
    }

    pub fn is_shutdown(&self) -> bool {
        self.current.is_terminal()
    }

    /// Advance to the next round and return its number.
    pub fn begin_round(&mut self) -> u64 {
        self.round += 1;
        self.round
    }

    /// Check whether a transition would be accepted.
    pub fn can_transition(
        &self,
        to: AgentState,
        trigger: TransitionTrigger,
        ctx: &GuardContext,
    ) -> Result<(), DomainError> {
        transition::validate(self.current, to, trigger, ctx)
            .map(|_| ())
            .map_err(|reason| DomainError::InvalidTransition {
                from: self.current,
                to,
                reason,
            })
    }

    /// Validate and apply a transition, recording it in the history.
    pub fn transition(
        &mut self,
        to: AgentState,
        trigger: TransitionTrigger,
        reason: impl Into<String>,
        ctx: &GuardContext,
    ) -> Result<&StateTransition, DomainError> {
        self.can_transition(to, trigger, ctx)?;

        let from = self.current;
        self.current = to;
        self.history.push(StateTransition {
            from,
            to,
            round: self.round,
            reason: reason.into(),
            trigger,
            timestamp: current_timestamp(),
        });
        self.history
            .last()
            .ok_or_else(|| DomainError::InvariantViolation("transition history is empty".into()))
    }

    /// The automatic transition the current conditions call for, if any.
    pub fn suggest_auto(&self, ctx: &GuardContext) -> Option<AgentState> {
        if self.is_shutdown() {
            return None;
        }
        transition::suggest_auto(self.current, ctx)
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn done() -> GuardContext {
        GuardContext {
            bootstrap_complete: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_starts_in_bootstrap_at_round_zero() {
        let machine = StateMachine::new();
        assert_eq!(machine.current(), AgentState::Bootstrap);
        assert_eq!(machine.round(), 0);
        assert!(machine.history().is_empty());
    }

    #[test]
    fn test_rounds_are_monotonic() {
        let mut machine = StateMachine::new();
        assert_eq!(machine.begin_round(), 1);
        assert_eq!(machine.begin_round(), 2);
        assert_eq!(machine.round(), 2);
    }

    #[test]
    fn test_valid_transition_is_recorded() {
        let mut machine = StateMachine::new();
        machine.begin_round();
        machine.begin_round();

        let record = machine
            .transition(AgentState::NormalWork, TransitionTrigger::Auto, "bootstrap done", &done())
            .unwrap()
            .clone();

        assert_eq!(record.from, AgentState::Bootstrap);
        assert_eq!(record.to, AgentState::NormalWork);
        assert_eq!(record.round, 2);
        assert_eq!(record.reason, "bootstrap done");
        assert_eq!(machine.current(), AgentState::NormalWork);
        assert_eq!(machine.history().len(), 1);
    }

    #[test]
    fn test_invalid_transition_leaves_state_untouched() {
        let mut machine = StateMachine::new();
        let err = machine
            .transition(
                AgentState::NormalWork,
                TransitionTrigger::Auto,
                "too early",
                &GuardContext::default(),
            )
            .unwrap_err();

        assert!(matches!(err, DomainError::InvalidTransition { .. }));
        assert_eq!(machine.current(), AgentState::Bootstrap);
        assert!(machine.history().is_empty());
    }

    #[test]
    fn test_shutdown_is_terminal() {
        let mut machine = StateMachine::starting_in(AgentState::NormalWork);
        machine
            .transition(AgentState::Shutdown, TransitionTrigger::Manual, "operator", &done())
            .unwrap();
        assert!(machine.is_shutdown());
        assert!(machine
            .transition(AgentState::NormalWork, TransitionTrigger::Manual, "again", &done())
            .is_err());
        assert_eq!(machine.suggest_auto(&done()), None);
    }

    #[test]
    fn test_suggest_auto_from_bootstrap() {
        let machine = StateMachine::new();
        assert_eq!(machine.suggest_auto(&GuardContext::default()), None);
        assert_eq!(machine.suggest_auto(&done()), Some(AgentState::NormalWork));
    }
}
