//! Action selection: the final, sequential reasoning call of the pipeline.

use crate::ports::reasoning_backend::{PromptContext, PromptPurpose, selection_metadata};
use crate::reasoning::{InvocationError, StructuredInvoker};
use mindloop_domain::{
    ActionDecision, ActionType, AgentState, DecisionSource, ProfileCatalog, SelectionTemplate,
    Thought, ThoughtContext, Verdict, parse_action_decision,
};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Handler name the selector resolves reasoning providers with.
pub const SELECTOR_HANDLER: &str = "action_selector";

/// Thought content that always resolves to ponder.
pub const PONDER_SENTINEL: &str = "ponder";

/// Errors from action selection
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SelectionError {
    #[error(transparent)]
    Invocation(#[from] InvocationError),

    #[error("Action selection timed out after {0:?}")]
    Timeout(Duration),
}

/// Chooses one action from the verdicts.
///
/// Two guard rules apply regardless of what the backend answers:
///
/// 1. A thought whose content is exactly `ponder` resolves to ponder without
///    a reasoning call.
/// 2. In bootstrap, a step that must speak may not complete before a speak
///    action was taken for its task; such a completion becomes ponder.
pub struct ActionSelector {
    invoker: StructuredInvoker,
    template: SelectionTemplate,
    profiles: Arc<ProfileCatalog>,
    timeout: Duration,
}

impl ActionSelector {
    pub fn new(invoker: StructuredInvoker, profiles: Arc<ProfileCatalog>, timeout: Duration) -> Self {
        Self {
            invoker,
            template: SelectionTemplate::default(),
            profiles,
            timeout,
        }
    }

    pub fn with_template(mut self, template: SelectionTemplate) -> Self {
        self.template = template;
        self
    }

    pub fn profiles(&self) -> &Arc<ProfileCatalog> {
        &self.profiles
    }

    pub async fn select(
        &self,
        thought: &Thought,
        ctx: &ThoughtContext,
        verdicts: &[Verdict],
    ) -> Result<ActionDecision, SelectionError> {
        if thought.content.trim() == PONDER_SENTINEL {
            debug!(thought_id = %thought.id, "Ponder sentinel matched");
            return Ok(ActionDecision::ponder(
                vec!["Forced ponder requested by thought content.".to_string()],
                "thought content is the ponder sentinel",
                DecisionSource::GuardRule,
            ));
        }

        // Unknown profiles fail the permitted-action check later; the prompt
        // still needs a list to show.
        let permitted: Vec<ActionType> = self
            .profiles
            .get(&ctx.task.profile)
            .map(|p| p.permitted.iter().copied().collect())
            .unwrap_or_else(|| ActionType::ALL.to_vec());
        let summaries: Vec<String> = verdicts.iter().map(Verdict::summary).collect();

        let prompt = PromptContext::new(
            PromptPurpose::ActionSelection,
            self.template.system_prompt(ctx.speculative),
            self.template
                .render(&thought.content, &ctx.render(thought), &summaries, &permitted),
        )
        .with_metadata(selection_metadata(thought, ctx, verdicts, &permitted));

        let decision = tokio::time::timeout(
            self.timeout,
            self.invoker
                .invoke(SELECTOR_HANDLER, prompt, parse_action_decision),
        )
        .await
        .map_err(|_| SelectionError::Timeout(self.timeout))??;

        if ctx.state == AgentState::Bootstrap
            && ctx.task.requires_speak()
            && decision.action_type() == ActionType::CompleteTask
            && !ctx.has_prior_speak()
        {
            info!(
                thought_id = %thought.id,
                task_id = %ctx.task.id,
                "Bootstrap step tried to complete before speaking, forcing ponder"
            );
            return Ok(ActionDecision::ponder(
                vec!["This step must speak before it can complete. What should be said?".to_string()],
                "bootstrap step requires a speak action before completion",
                DecisionSource::GuardRule,
            ));
        }

        Ok(decision)
    }
}
