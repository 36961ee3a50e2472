//! Ethical evaluator: checks a thought against guiding principles.

use super::{EvaluationError, Evaluate};
use crate::ports::reasoning_backend::{PromptContext, PromptPurpose, thought_metadata};
use crate::reasoning::StructuredInvoker;
use async_trait::async_trait;
use mindloop_domain::{JudgmentRole, JudgmentTemplate, Thought, ThoughtContext, Verdict, parse_verdict};

/// Recognized options for the ethical evaluator.
#[derive(Debug, Clone)]
pub struct EthicalOptions {
    /// Principles listed in the prompt, in order
    pub principles: Vec<String>,
    pub template: JudgmentTemplate,
}

impl Default for EthicalOptions {
    fn default() -> Self {
        Self {
            principles: vec![
                "Do good and avoid harm.".to_string(),
                "Be honest and transparent.".to_string(),
                "Respect the autonomy and privacy of the people involved.".to_string(),
                "Treat people fairly.".to_string(),
            ],
            template: JudgmentTemplate::default_for(JudgmentRole::Ethical),
        }
    }
}

pub struct EthicalEvaluator {
    name: String,
    invoker: StructuredInvoker,
    options: EthicalOptions,
}

impl EthicalEvaluator {
    pub fn new(name: impl Into<String>, invoker: StructuredInvoker, options: EthicalOptions) -> Self {
        Self {
            name: name.into(),
            invoker,
            options,
        }
    }
}

#[async_trait]
impl Evaluate for EthicalEvaluator {
    fn name(&self) -> &str {
        &self.name
    }

    fn role(&self) -> JudgmentRole {
        JudgmentRole::Ethical
    }

    async fn evaluate(&self, thought: &Thought, ctx: &ThoughtContext) -> Result<Verdict, EvaluationError> {
        let principles = self
            .options
            .principles
            .iter()
            .map(|p| format!("- {}", p))
            .collect::<Vec<_>>()
            .join("\n");
        let user = self.options.template.render(
            &thought.content,
            &ctx.render(thought),
            &[("Principles", principles)],
        );
        let prompt = PromptContext::new(
            PromptPurpose::Judgment(JudgmentRole::Ethical),
            self.options.template.system.clone(),
            user,
        )
        .with_metadata(thought_metadata(thought, ctx));

        let verdict = self
            .invoker
            .invoke(&self.name, prompt, |value| {
                parse_verdict(JudgmentRole::Ethical, &self.name, None, value)
            })
            .await?;
        Ok(verdict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::judgment::test_support::invoker_answering;
    use mindloop_domain::{AgentState, EthicalDecision, Task, ThoughtKind, VerdictPayload};
    use serde_json::json;

    #[tokio::test]
    async fn test_evaluate_renders_principles_and_parses_verdict() {
        let (invoker, backend) = invoker_answering(json!({
            "decision": "concern",
            "flags": ["privacy"],
            "rationale": "mentions a home address",
            "confidence": 0.7
        }));
        let options = EthicalOptions {
            principles: vec!["Protect privacy.".into()],
            ..Default::default()
        };
        let evaluator = EthicalEvaluator::new("ethical", invoker, options);

        let task = Task::new("share the address");
        let thought = Thought::new(&task, ThoughtKind::Seed, "share the address", 1);
        let ctx = ThoughtContext::new(task, AgentState::NormalWork, 1);
        let verdict = evaluator.evaluate(&thought, &ctx).await.unwrap();

        assert_eq!(verdict.module, "ethical");
        assert!(matches!(
            verdict.payload,
            VerdictPayload::Ethical {
                decision: EthicalDecision::Concern,
                ..
            }
        ));

        let seen = backend.seen.lock().unwrap();
        assert!(seen[0].user.contains("## Principles\n- Protect privacy."));
        assert_eq!(seen[0].purpose, PromptPurpose::Judgment(JudgmentRole::Ethical));
        assert_eq!(seen[0].metadata["content"], "share the address");
    }

    #[tokio::test]
    async fn test_invalid_answer_is_an_evaluation_error() {
        let (invoker, _) = invoker_answering(json!({"decision": "maybe", "rationale": "r", "confidence": 0.5}));
        let evaluator = EthicalEvaluator::new("ethical", invoker, EthicalOptions::default());

        let task = Task::new("t");
        let thought = Thought::new(&task, ThoughtKind::Seed, "t", 1);
        let ctx = ThoughtContext::new(task, AgentState::NormalWork, 1);

        let err = evaluator.evaluate(&thought, &ctx).await.unwrap_err();
        assert!(matches!(err, EvaluationError::Invocation(_)));
    }
}
