//! Common-sense evaluator: plausibility of a thought.

use super::{EvaluationError, Evaluate};
use crate::ports::reasoning_backend::{PromptContext, PromptPurpose, thought_metadata};
use crate::reasoning::StructuredInvoker;
use async_trait::async_trait;
use mindloop_domain::{JudgmentRole, JudgmentTemplate, Thought, ThoughtContext, Verdict, parse_verdict};

/// Recognized options for the common-sense evaluator.
#[derive(Debug, Clone)]
pub struct CommonSenseOptions {
    /// Extra checks spelled out in the prompt
    pub checks: Vec<String>,
    pub template: JudgmentTemplate,
}

impl Default for CommonSenseOptions {
    fn default() -> Self {
        Self {
            checks: vec![
                "Physical plausibility".to_string(),
                "Internal consistency with the task".to_string(),
                "Information that is assumed but missing".to_string(),
            ],
            template: JudgmentTemplate::default_for(JudgmentRole::CommonSense),
        }
    }
}

pub struct CommonSenseEvaluator {
    name: String,
    invoker: StructuredInvoker,
    options: CommonSenseOptions,
}

impl CommonSenseEvaluator {
    pub fn new(name: impl Into<String>, invoker: StructuredInvoker, options: CommonSenseOptions) -> Self {
        Self {
            name: name.into(),
            invoker,
            options,
        }
    }
}

#[async_trait]
impl Evaluate for CommonSenseEvaluator {
    fn name(&self) -> &str {
        &self.name
    }

    fn role(&self) -> JudgmentRole {
        JudgmentRole::CommonSense
    }

    async fn evaluate(&self, thought: &Thought, ctx: &ThoughtContext) -> Result<Verdict, EvaluationError> {
        let checks = self
            .options
            .checks
            .iter()
            .map(|c| format!("- {}", c))
            .collect::<Vec<_>>()
            .join("\n");
        let user = self
            .options
            .template
            .render(&thought.content, &ctx.render(thought), &[("Checks", checks)]);
        let prompt = PromptContext::new(
            PromptPurpose::Judgment(JudgmentRole::CommonSense),
            self.options.template.system.clone(),
            user,
        )
        .with_metadata(thought_metadata(thought, ctx));

        Ok(self
            .invoker
            .invoke(&self.name, prompt, |value| {
                parse_verdict(JudgmentRole::CommonSense, &self.name, None, value)
            })
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::judgment::test_support::invoker_answering;
    use mindloop_domain::{AgentState, Task, ThoughtKind, VerdictPayload};
    use serde_json::json;

    #[tokio::test]
    async fn test_plausibility_verdict() {
        let (invoker, _) = invoker_answering(json!({
            "plausibility": 0.9,
            "rationale": "ordinary request",
            "confidence": 0.8
        }));
        let evaluator = CommonSenseEvaluator::new("common_sense", invoker, CommonSenseOptions::default());

        let task = Task::new("water the plants");
        let thought = Thought::new(&task, ThoughtKind::Seed, "water the plants", 1);
        let ctx = ThoughtContext::new(task, AgentState::NormalWork, 1);
        let verdict = evaluator.evaluate(&thought, &ctx).await.unwrap();

        assert_eq!(evaluator.role(), JudgmentRole::CommonSense);
        assert!(matches!(verdict.payload, VerdictPayload::CommonSense { plausibility, .. } if plausibility == 0.9));
    }
}
