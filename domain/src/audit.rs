//! Immutable audit records.
//!
//! Every dispatch, escalation and state transition produces exactly one
//! record. Records are distinct from tracing output: they are data that can
//! be queried after the fact.

use crate::action::ActionDecision;
use crate::core::current_timestamp;
use crate::escalation::Escalation;
use crate::state::StateTransition;
use crate::task::Thought;
use serde::{Deserialize, Serialize};

/// Category of an audit record, used for querying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditKind {
    Dispatch,
    Escalation,
    Transition,
    Reflection,
    Admin,
}

/// `{timestamp, actor, action, outcome}` plus the subject it concerns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub timestamp: u64,
    pub kind: AuditKind,
    /// Component that acted (e.g. "thought_pipeline", "state_machine")
    pub actor: String,
    pub action: String,
    pub outcome: String,
    /// Thought or task id, when the record concerns one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub details: serde_json::Value,
}

impl AuditRecord {
    pub fn new(
        kind: AuditKind,
        actor: impl Into<String>,
        action: impl Into<String>,
        outcome: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: current_timestamp(),
            kind,
            actor: actor.into(),
            action: action.into(),
            outcome: outcome.into(),
            subject: None,
            details: serde_json::Value::Null,
        }
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }

    /// An action handed to the executor.
    pub fn dispatch(thought: &Thought, decision: &ActionDecision, outcome: impl Into<String>) -> Self {
        Self::new(
            AuditKind::Dispatch,
            "thought_pipeline",
            decision.action_type().as_str(),
            outcome,
        )
        .with_subject(thought.id.as_str())
        .with_details(serde_json::json!({
            "task_id": thought.task_id.as_str(),
            "rationale": decision.rationale,
            "source": decision.source,
        }))
    }

    pub fn escalation(escalation: &Escalation) -> Self {
        Self::new(
            AuditKind::Escalation,
            escalation.module.as_deref().unwrap_or("thought_pipeline"),
            escalation.kind.as_str(),
            escalation.last_error.clone(),
        )
        .with_subject(escalation.thought_id.as_str())
        .with_details(serde_json::to_value(escalation).unwrap_or_default())
    }

    pub fn transition(transition: &StateTransition) -> Self {
        Self::new(
            AuditKind::Transition,
            "state_machine",
            format!("{} -> {}", transition.from, transition.to),
            transition.reason.clone(),
        )
        .with_details(serde_json::json!({
            "round": transition.round,
            "trigger": transition.trigger,
        }))
    }
}
