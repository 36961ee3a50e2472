//! Operating modes and the validated state machine that moves between them.
//!
//! - [`AgentState`] — the six operating modes
//! - [`transition`] — the directed transition table and its guards
//! - [`StateMachine`] — current mode, round numbering and append-only history

pub mod agent_state;
pub mod machine;
pub mod transition;

pub use agent_state::AgentState;
pub use machine::{StateMachine, StateTransition};
pub use transition::{GuardContext, IdleThresholds, TransitionGuard, TransitionRule, TransitionTrigger};
