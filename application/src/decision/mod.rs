//! The parallel decision pipeline for a single thought.

pub mod guardrails;
pub mod orchestrator;
pub mod selector;

pub use guardrails::{
    ConfidenceGuardrail, ContentPolicyGuardrail, EthicalFlagGuardrail, Guardrail, GuardrailChain,
    GuardrailVerdict, RationaleGuardrail, ReviewInput, ReviewOutcome,
};
pub use orchestrator::{Decision, DecisionOrchestrator, PIPELINE_EXHAUSTED};
pub use selector::{ActionSelector, PONDER_SENTINEL, SELECTOR_HANDLER, SelectionError};
