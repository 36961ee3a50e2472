//! Actions: the fixed set of things a thought can resolve into.
//!
//! - [`ActionType`] — the ten action kinds
//! - [`ActionParams`] — typed parameters, one variant per kind
//! - [`ActionDecision`] — a selected action plus its rationale
//! - [`ActionProfile`] / [`ProfileCatalog`] — permitted-action sets

pub mod decision;
pub mod parsing;
pub mod profile;

pub use decision::{ActionDecision, ActionParams, ActionType, DecisionSource};
pub use parsing::{ActionParseError, parse_action_decision};
pub use profile::{ActionProfile, ProfileCatalog};
