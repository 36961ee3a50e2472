//! Judgment domain
//!
//! Judgment modules evaluate a thought from one perspective each and return
//! a [`Verdict`]. The set of roles is closed:
//!
//! | Role | Looks at | Payload |
//! |------|----------|---------|
//! | Ethical | principle alignment | decision + flags |
//! | CommonSense | plausibility | score + flags |
//! | Domain | domain-specific fit | alignment score + flags + recommendation |
//!
//! Verdicts are immutable once produced and are consumed only by the action
//! selector and the guardrail chain.

pub mod parsing;
pub mod verdict;

pub use parsing::{VerdictParseError, parse_verdict};
pub use verdict::{EthicalDecision, JudgmentRole, Verdict, VerdictPayload};
