//! Domain evaluator: fit of a thought within one knowledge domain.

use super::{EvaluationError, Evaluate};
use crate::ports::reasoning_backend::{PromptContext, PromptPurpose, thought_metadata};
use crate::reasoning::StructuredInvoker;
use async_trait::async_trait;
use mindloop_domain::{JudgmentRole, JudgmentTemplate, Thought, ThoughtContext, Verdict, parse_verdict};

/// Recognized options for a domain evaluator.
#[derive(Debug, Clone)]
pub struct DomainOptions {
    /// Domain name (e.g. "moderation", "scheduling")
    pub domain: String,
    /// Domain facts and rules supplied to the prompt
    pub knowledge: Vec<String>,
    pub template: JudgmentTemplate,
}

impl DomainOptions {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            knowledge: Vec::new(),
            template: JudgmentTemplate::default_for(JudgmentRole::Domain),
        }
    }

    pub fn with_knowledge(mut self, knowledge: Vec<String>) -> Self {
        self.knowledge = knowledge;
        self
    }
}

pub struct DomainEvaluator {
    name: String,
    invoker: StructuredInvoker,
    options: DomainOptions,
}

impl DomainEvaluator {
    pub fn new(name: impl Into<String>, invoker: StructuredInvoker, options: DomainOptions) -> Self {
        Self {
            name: name.into(),
            invoker,
            options,
        }
    }

    pub fn domain(&self) -> &str {
        &self.options.domain
    }
}

#[async_trait]
impl Evaluate for DomainEvaluator {
    fn name(&self) -> &str {
        &self.name
    }

    fn role(&self) -> JudgmentRole {
        JudgmentRole::Domain
    }

    async fn evaluate(&self, thought: &Thought, ctx: &ThoughtContext) -> Result<Verdict, EvaluationError> {
        let knowledge = self
            .options
            .knowledge
            .iter()
            .map(|k| format!("- {}", k))
            .collect::<Vec<_>>()
            .join("\n");
        let user = self.options.template.render(
            &thought.content,
            &ctx.render(thought),
            &[
                ("Domain", self.options.domain.clone()),
                ("Domain knowledge", knowledge),
            ],
        );
        let prompt = PromptContext::new(
            PromptPurpose::Judgment(JudgmentRole::Domain),
            self.options.template.system.clone(),
            user,
        )
        .with_metadata(thought_metadata(thought, ctx));

        let domain = self.options.domain.as_str();
        Ok(self
            .invoker
            .invoke(&self.name, prompt, |value| {
                parse_verdict(JudgmentRole::Domain, &self.name, Some(domain), value)
            })
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::judgment::test_support::invoker_answering;
    use mindloop_domain::{ActionType, AgentState, Task, ThoughtKind, VerdictPayload};
    use serde_json::json;

    #[tokio::test]
    async fn test_domain_verdict_carries_domain_and_recommendation() {
        let (invoker, backend) = invoker_answering(json!({
            "alignment": 0.6,
            "recommended_action": "speak",
            "rationale": "a reply is expected",
            "confidence": 0.9
        }));
        let options = DomainOptions::new("support").with_knowledge(vec!["Reply within a day.".into()]);
        let evaluator = DomainEvaluator::new("domain:support", invoker, options);

        let task = Task::new("answer the ticket");
        let thought = Thought::new(&task, ThoughtKind::Seed, "answer the ticket", 1);
        let ctx = ThoughtContext::new(task, AgentState::NormalWork, 1);
        let verdict = evaluator.evaluate(&thought, &ctx).await.unwrap();

        match verdict.payload {
            VerdictPayload::Domain {
                domain,
                recommended_action,
                ..
            } => {
                assert_eq!(domain, "support");
                assert_eq!(recommended_action, Some(ActionType::Speak));
            }
            other => panic!("unexpected payload {:?}", other),
        }
        assert!(backend.seen.lock().unwrap()[0].user.contains("- Reply within a day."));
    }
}
