//! Domain layer for mindloop
//!
//! Pure types and rules of the agent's cognitive core. No I/O and no async
//! runtime live here.
//!
//! # Core Concepts
//!
//! ## Tasks and thoughts
//!
//! A **Task** is a unit of intent; each task is worked through as a chain of
//! **Thoughts**, one reasoning step each. A thought resolves into exactly one
//! of ten **actions** (see [`ActionType`]), bounded by the task's
//! [`ActionProfile`].
//!
//! ## Judgment
//!
//! Judgment modules evaluate a thought from a fixed set of roles (ethical,
//! common-sense, domain) and produce [`Verdict`]s that feed action selection.
//!
//! ## Operating modes
//!
//! The [`StateMachine`] moves the agent through [`AgentState`]s:
//!
//! ```text
//! bootstrap ──► normal-work ◄──► exploratory
//!                  │    ▲
//!                  ▼    │
//!            low-activity ──► idle-reflection
//!
//! any ──► shutdown (terminal)
//! ```
//!
//! ## Failure isolation
//!
//! Providers of abstract capabilities carry a [`CircuitBreaker`]; module
//! failures surface as [`Escalation`]s rather than crashing a round.

pub mod action;
pub mod audit;
pub mod capability;
pub mod config;
pub mod core;
pub mod escalation;
pub mod judgment;
pub mod prompt;
pub mod round;
pub mod state;
pub mod task;

// Re-export commonly used types
pub use action::{
    ActionDecision, ActionParams, ActionParseError, ActionProfile, ActionType, DecisionSource,
    ProfileCatalog, parse_action_decision,
};
pub use audit::{AuditKind, AuditRecord};
pub use capability::{
    BreakerConfig, BreakerSnapshot, BreakerState, BreakerTransition, CapabilityKind,
    CapabilityProvider, CircuitBreaker, ProviderPriority, SelectionStrategy,
};
pub use config::OutputFormat;
pub use core::{current_timestamp, error::DomainError, ids::{TaskId, ThoughtId}, string::preview};
pub use escalation::{Escalation, EscalationKind};
pub use judgment::{
    EthicalDecision, JudgmentRole, Verdict, VerdictParseError, VerdictPayload, parse_verdict,
};
pub use prompt::{JudgmentTemplate, SelectionTemplate};
pub use round::RoundResult;
pub use state::{
    AgentState, GuardContext, IdleThresholds, StateMachine, StateTransition, TransitionTrigger,
};
pub use task::{
    BootstrapStepRef, Priority, QueueClass, QueueItem, Task, TaskOrigin, TaskStatus, Thought,
    ThoughtContext, ThoughtKind, ThoughtStatus,
};
