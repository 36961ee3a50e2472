//! Directed transition table between operating modes.
//!
//! Every edge carries the triggers that may use it and a guard predicate.
//! `any → shutdown` is always allowed; nothing leaves shutdown.

use super::agent_state::AgentState;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What initiated a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionTrigger {
    /// Decided by the round loop from observed conditions
    Auto,
    /// Requested through the administrative surface
    Manual,
}

impl fmt::Display for TransitionTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransitionTrigger::Auto => write!(f, "auto"),
            TransitionTrigger::Manual => write!(f, "manual"),
        }
    }
}

/// Consecutive idle rounds before the agent winds down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdleThresholds {
    /// normal-work → low-activity
    pub low_activity_after: u32,
    /// normal-work / low-activity → idle-reflection
    pub idle_reflection_after: u32,
}

impl Default for IdleThresholds {
    fn default() -> Self {
        Self {
            low_activity_after: 5,
            idle_reflection_after: 15,
        }
    }
}

/// Observed conditions a guard is evaluated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GuardContext {
    pub bootstrap_complete: bool,
    /// Consecutive rounds that processed no requester work
    pub idle_rounds: u32,
    /// Pending tasks or thoughts exist
    pub pending_work: bool,
    pub thresholds: IdleThresholds,
}

impl GuardContext {
    /// Idle for at least `rounds` with nothing waiting.
    fn idle_for(&self, rounds: u32) -> bool {
        !self.pending_work && self.idle_rounds >= rounds
    }
}

/// Predicate attached to a transition edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionGuard {
    Always,
    /// Every bootstrap step reached a terminal status
    BootstrapComplete,
    /// Idle for at least the low-activity threshold
    IdleForLowActivity,
    /// Idle for at least the idle-reflection threshold
    IdleForReflection,
    /// New work has arrived
    PendingWork,
}

impl TransitionGuard {
    /// Check the guard. Idle thresholds only bind automatic transitions; an
    /// operator may wind the agent down at any time.
    pub fn check(&self, ctx: &GuardContext, trigger: TransitionTrigger) -> Result<(), String> {
        let manual = trigger == TransitionTrigger::Manual;
        match self {
            TransitionGuard::Always => Ok(()),
            TransitionGuard::BootstrapComplete if ctx.bootstrap_complete => Ok(()),
            TransitionGuard::BootstrapComplete => {
                Err("bootstrap steps are not all complete".to_string())
            }
            TransitionGuard::IdleForLowActivity
                if manual || ctx.idle_for(ctx.thresholds.low_activity_after) =>
            {
                Ok(())
            }
            TransitionGuard::IdleForLowActivity => Err(format!(
                "idle for {} rounds (pending work: {}), low-activity needs {}",
                ctx.idle_rounds, ctx.pending_work, ctx.thresholds.low_activity_after
            )),
            TransitionGuard::IdleForReflection
                if manual || ctx.idle_for(ctx.thresholds.idle_reflection_after) =>
            {
                Ok(())
            }
            TransitionGuard::IdleForReflection => Err(format!(
                "idle for {} rounds (pending work: {}), idle-reflection needs {}",
                ctx.idle_rounds, ctx.pending_work, ctx.thresholds.idle_reflection_after
            )),
            TransitionGuard::PendingWork if manual || ctx.pending_work => Ok(()),
            TransitionGuard::PendingWork => Err("no pending work".to_string()),
        }
    }
}

/// One edge of the transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionRule {
    pub from: AgentState,
    pub to: AgentState,
    pub auto: bool,
    pub manual: bool,
    pub guard: TransitionGuard,
}

impl TransitionRule {
    const fn new(
        from: AgentState,
        to: AgentState,
        auto: bool,
        manual: bool,
        guard: TransitionGuard,
    ) -> Self {
        Self {
            from,
            to,
            auto,
            manual,
            guard,
        }
    }

    pub fn accepts(&self, trigger: TransitionTrigger) -> bool {
        match trigger {
            TransitionTrigger::Auto => self.auto,
            TransitionTrigger::Manual => self.manual,
        }
    }
}

use AgentState::*;
use TransitionGuard::*;

/// The edge table, excluding the implicit `any → shutdown` edges.
///
/// Order matters for [`suggest_auto`]: the first passing automatic edge from
/// a state wins, so waking on new work is listed before winding down further
/// and deeper idle before shallower idle.
pub const TRANSITIONS: &[TransitionRule] = &[
    TransitionRule::new(Bootstrap, NormalWork, true, true, BootstrapComplete),
    TransitionRule::new(NormalWork, Exploratory, false, true, Always),
    TransitionRule::new(Exploratory, NormalWork, false, true, Always),
    TransitionRule::new(NormalWork, IdleReflection, true, true, IdleForReflection),
    TransitionRule::new(NormalWork, LowActivity, true, true, IdleForLowActivity),
    TransitionRule::new(LowActivity, NormalWork, true, true, PendingWork),
    TransitionRule::new(LowActivity, IdleReflection, true, true, IdleForReflection),
    TransitionRule::new(IdleReflection, NormalWork, true, true, PendingWork),
];

const SHUTDOWN_RULES: [TransitionRule; 5] = [
    TransitionRule::new(Bootstrap, Shutdown, true, true, Always),
    TransitionRule::new(NormalWork, Shutdown, true, true, Always),
    TransitionRule::new(Exploratory, Shutdown, true, true, Always),
    TransitionRule::new(LowActivity, Shutdown, true, true, Always),
    TransitionRule::new(IdleReflection, Shutdown, true, true, Always),
];

/// Look up the edge between two states.
pub fn find_rule(from: AgentState, to: AgentState) -> Option<&'static TransitionRule> {
    TRANSITIONS
        .iter()
        .chain(SHUTDOWN_RULES.iter())
        .find(|rule| rule.from == from && rule.to == to)
}

/// Validate a transition without applying it.
pub fn validate(
    from: AgentState,
    to: AgentState,
    trigger: TransitionTrigger,
    ctx: &GuardContext,
) -> Result<&'static TransitionRule, String> {
    if from.is_terminal() {
        return Err("shutdown is terminal".to_string());
    }
    if from == to {
        return Err(format!("already in {}", from));
    }
    let rule = find_rule(from, to).ok_or_else(|| "no such edge".to_string())?;
    if !rule.accepts(trigger) {
        return Err(format!("edge does not accept {} transitions", trigger));
    }
    rule.guard.check(ctx, trigger)?;
    Ok(rule)
}

/// First automatic transition out of `from` whose guard passes.
pub fn suggest_auto(from: AgentState, ctx: &GuardContext) -> Option<AgentState> {
    TRANSITIONS
        .iter()
        .filter(|rule| rule.from == from && rule.auto)
        .find(|rule| rule.guard.check(ctx, TransitionTrigger::Auto).is_ok())
        .map(|rule| rule.to)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idle(rounds: u32) -> GuardContext {
        GuardContext {
            idle_rounds: rounds,
            ..Default::default()
        }
    }

    #[test]
    fn test_bootstrap_requires_completion() {
        let ctx = GuardContext::default();
        assert!(validate(Bootstrap, NormalWork, TransitionTrigger::Auto, &ctx).is_err());

        let done = GuardContext {
            bootstrap_complete: true,
            ..Default::default()
        };
        assert!(validate(Bootstrap, NormalWork, TransitionTrigger::Auto, &done).is_ok());
    }

    #[test]
    fn test_exploratory_is_manual_only() {
        let ctx = GuardContext::default();
        assert!(validate(NormalWork, Exploratory, TransitionTrigger::Auto, &ctx).is_err());
        assert!(validate(NormalWork, Exploratory, TransitionTrigger::Manual, &ctx).is_ok());
        assert!(validate(Exploratory, NormalWork, TransitionTrigger::Manual, &ctx).is_ok());
    }

    #[test]
    fn test_unknown_edge_rejected() {
        let err = validate(Bootstrap, Exploratory, TransitionTrigger::Manual, &GuardContext::default())
            .unwrap_err();
        assert_eq!(err, "no such edge");
    }

    #[test]
    fn test_shutdown_always_allowed_and_terminal() {
        let ctx = GuardContext::default();
        for state in AgentState::ALL.into_iter().filter(|s| !s.is_terminal()) {
            assert!(validate(state, Shutdown, TransitionTrigger::Manual, &ctx).is_ok());
        }
        assert!(validate(Shutdown, NormalWork, TransitionTrigger::Manual, &ctx).is_err());
    }

    #[test]
    fn test_idle_guards_bind_auto_only() {
        assert!(validate(NormalWork, LowActivity, TransitionTrigger::Auto, &idle(2)).is_err());
        assert!(validate(NormalWork, LowActivity, TransitionTrigger::Manual, &idle(2)).is_ok());
    }

    #[test]
    fn test_suggest_auto_prefers_deeper_idle() {
        assert_eq!(suggest_auto(NormalWork, &idle(0)), None);
        assert_eq!(suggest_auto(NormalWork, &idle(5)), Some(LowActivity));
        assert_eq!(suggest_auto(NormalWork, &idle(15)), Some(IdleReflection));
        assert_eq!(suggest_auto(LowActivity, &idle(15)), Some(IdleReflection));
    }

    #[test]
    fn test_suggest_auto_wakes_on_pending_work() {
        let ctx = GuardContext {
            pending_work: true,
            idle_rounds: 20,
            ..Default::default()
        };
        assert_eq!(suggest_auto(LowActivity, &ctx), Some(NormalWork));
        assert_eq!(suggest_auto(IdleReflection, &ctx), Some(NormalWork));
    }
}
