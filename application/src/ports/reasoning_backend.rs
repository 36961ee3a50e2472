//! Reasoning backend port
//!
//! A reasoning backend turns a prompt into structured JSON. Judgment
//! modules and the action selector reach backends only through the
//! [`ReasoningRouter`](crate::reasoning::ReasoningRouter), which picks a
//! provider from the capability registry.

use async_trait::async_trait;
use mindloop_domain::{
    ActionType, JudgmentRole, Thought, ThoughtContext, Verdict,
};
use serde_json::{Value, json};
use std::time::Duration;
use thiserror::Error;

/// Errors a reasoning backend can report
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BackendError {
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    #[error("Malformed output: {0}")]
    MalformedOutput(String),

    #[error("Backend timed out after {0:?}")]
    Timeout(Duration),
}

impl BackendError {
    /// Whether the failure says something about the provider's health.
    ///
    /// Malformed output is a content problem handled by validation retries,
    /// not a reason to trip the provider's breaker.
    pub fn counts_against_provider(&self) -> bool {
        !matches!(self, BackendError::MalformedOutput(_))
    }
}

/// What a prompt is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptPurpose {
    Judgment(JudgmentRole),
    ActionSelection,
}

impl PromptPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            PromptPurpose::Judgment(role) => role.as_str(),
            PromptPurpose::ActionSelection => "action_selection",
        }
    }
}

/// A fully rendered prompt plus machine-readable metadata.
#[derive(Debug, Clone)]
pub struct PromptContext {
    pub purpose: PromptPurpose,
    pub system: String,
    pub user: String,
    /// Corrections appended after failed validation, oldest first
    pub corrections: Vec<String>,
    /// Structured facts about the thought (used by offline backends)
    pub metadata: Value,
}

impl PromptContext {
    pub fn new(purpose: PromptPurpose, system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            purpose,
            system: system.into(),
            user: user.into(),
            corrections: Vec::new(),
            metadata: Value::Null,
        }
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn push_correction(&mut self, correction: impl Into<String>) {
        self.corrections.push(correction.into());
    }

    /// The user prompt followed by any corrections.
    pub fn full_user_prompt(&self) -> String {
        if self.corrections.is_empty() {
            return self.user.clone();
        }
        let mut prompt = self.user.clone();
        for correction in &self.corrections {
            prompt.push_str("\n\n");
            prompt.push_str(correction);
        }
        prompt
    }
}

/// Structured facts about a thought, attached to every prompt as metadata.
pub fn thought_metadata(thought: &Thought, ctx: &ThoughtContext) -> Value {
    json!({
        "thought_id": thought.id.as_str(),
        "task_id": thought.task_id.as_str(),
        "kind": thought.kind.as_str(),
        "content": thought.content,
        "task": ctx.task.description,
        "priority": ctx.task.priority.value(),
        "state": ctx.state.as_str(),
        "round": ctx.round,
        "round_count": thought.round_count,
        "ponder_notes": thought.ponder_notes,
        "bootstrap_step": ctx.task.bootstrap_step.as_ref().map(|s| s.name.clone()),
        "requires_speak": ctx.task.requires_speak(),
        "prior_actions": ctx.prior_actions.iter().map(ActionType::as_str).collect::<Vec<_>>(),
        "objection": ctx.objection,
        "speculative": ctx.speculative,
    })
}

/// Metadata for the action-selection prompt: thought facts plus verdicts.
pub fn selection_metadata(
    thought: &Thought,
    ctx: &ThoughtContext,
    verdicts: &[Verdict],
    permitted: &[ActionType],
) -> Value {
    let mut metadata = thought_metadata(thought, ctx);
    if let Value::Object(map) = &mut metadata {
        map.insert(
            "permitted".to_string(),
            json!(permitted.iter().map(ActionType::as_str).collect::<Vec<_>>()),
        );
        map.insert(
            "verdicts".to_string(),
            serde_json::to_value(verdicts).unwrap_or_default(),
        );
    }
    metadata
}

/// Port for reasoning backends
#[async_trait]
pub trait ReasoningBackend: Send + Sync {
    /// Invoke the backend and return its JSON answer.
    async fn invoke(&self, prompt: &PromptContext) -> Result<Value, BackendError>;
}
