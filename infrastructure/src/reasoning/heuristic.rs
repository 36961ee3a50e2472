//! Rule-based reasoning backend.
//!
//! Answers every prompt from its structured metadata alone, without a
//! language model. Useful for offline runs, smoke tests and as a last-resort
//! fallback provider.

use async_trait::async_trait;
use mindloop_application::{BackendError, PromptContext, PromptPurpose, ReasoningBackend};
use mindloop_domain::{ActionType, JudgmentRole};
use serde_json::{Value, json};

/// Content fragments that mark a thought as ethically problematic, with the
/// flag each one raises.
const RED_FLAGS: &[(&str, &str)] = &[
    ("harm", "harm"),
    ("hurt", "harm"),
    ("attack", "harm"),
    ("deceive", "deception"),
    ("mislead", "deception"),
    ("lie to", "deception"),
    ("password", "privacy"),
    ("home address", "privacy"),
];

/// Deterministic backend driven by prompt metadata.
#[derive(Debug, Clone, Default)]
pub struct HeuristicBackend;

impl HeuristicBackend {
    pub fn new() -> Self {
        Self
    }

    fn flags_for(content: &str) -> Vec<&'static str> {
        let lowered = content.to_lowercase();
        let mut flags: Vec<&'static str> = RED_FLAGS
            .iter()
            .filter(|(needle, _)| lowered.contains(needle))
            .map(|(_, flag)| *flag)
            .collect();
        flags.dedup();
        flags
    }

    fn judge(role: JudgmentRole, meta: &Value) -> Value {
        let content = meta["content"].as_str().unwrap_or_default();
        let flags = Self::flags_for(content);
        match role {
            JudgmentRole::Ethical => {
                let decision = if flags.is_empty() { "aligned" } else { "violation" };
                json!({
                    "decision": decision,
                    "rationale": if flags.is_empty() {
                        "No principle is at stake.".to_string()
                    } else {
                        format!("Content touches on: {}", flags.join(", "))
                    },
                    "confidence": 0.6,
                    "flags": flags,
                })
            }
            JudgmentRole::CommonSense => {
                let empty = content.trim().is_empty();
                json!({
                    "plausibility": if empty { 0.2 } else { 0.8 },
                    "rationale": if empty { "The thought says nothing." } else { "Nothing implausible stands out." },
                    "confidence": 0.5,
                    "flags": if empty { vec!["empty"] } else { Vec::new() },
                })
            }
            JudgmentRole::Domain => json!({
                "alignment": 0.7,
                "rationale": "No domain rule applies.",
                "confidence": 0.4,
            }),
        }
    }

    fn has_violation(meta: &Value) -> bool {
        meta["verdicts"].as_array().is_some_and(|verdicts| {
            verdicts
                .iter()
                .any(|v| v["payload"]["decision"].as_str() == Some("violation"))
        })
    }

    fn prior(meta: &Value) -> Vec<ActionType> {
        meta["prior_actions"]
            .as_array()
            .map(|actions| {
                actions
                    .iter()
                    .filter_map(Value::as_str)
                    .filter_map(|a| a.parse().ok())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn select(meta: &Value) -> Value {
        let content = meta["content"].as_str().unwrap_or_default();
        let prior = Self::prior(meta);
        let requires_speak = meta["requires_speak"].as_bool().unwrap_or(false);

        let (action, parameters, rationale) = if meta["kind"] == "monitoring" {
            (ActionType::Observe, json!({"active": false}), "Nothing pending; keep watching.".to_string())
        } else if meta["kind"] == "meta" {
            (ActionType::CompleteTask, json!({"outcome": "reflected"}), "Housekeeping done.".to_string())
        } else if let Some(objection) = meta["objection"].as_str() {
            (ActionType::Defer, json!({"reason": objection}), "A reviewer objected.".to_string())
        } else if Self::has_violation(meta) {
            (
                ActionType::Reject,
                json!({"reason": "ethical violation"}),
                "The ethical review found a violation.".to_string(),
            )
        } else if requires_speak && !prior.contains(&ActionType::Speak) {
            (
                ActionType::Speak,
                json!({"content": format!("Affirming: {}", content)}),
                "This step has to be spoken.".to_string(),
            )
        } else if prior.iter().any(ActionType::is_outward) {
            (ActionType::CompleteTask, json!({"outcome": "done"}), "The work has been carried out.".to_string())
        } else {
            (
                ActionType::Speak,
                json!({"content": format!("Acknowledged: {}", content)}),
                "Respond to the request.".to_string(),
            )
        };

        let (action, parameters) = Self::within_profile(meta, action, parameters);
        json!({
            "action": action.as_str(),
            "parameters": parameters,
            "rationale": rationale,
        })
    }

    /// Fall back to something the task's profile permits.
    fn within_profile(meta: &Value, action: ActionType, parameters: Value) -> (ActionType, Value) {
        let Some(permitted) = meta["permitted"].as_array() else {
            return (action, parameters);
        };
        let permitted: Vec<ActionType> = permitted
            .iter()
            .filter_map(Value::as_str)
            .filter_map(|a| a.parse().ok())
            .collect();
        if permitted.is_empty() || permitted.contains(&action) {
            return (action, parameters);
        }
        if permitted.contains(&ActionType::CompleteTask) {
            return (ActionType::CompleteTask, json!({"outcome": "done within profile"}));
        }
        if permitted.contains(&ActionType::Defer) {
            return (ActionType::Defer, json!({"reason": "no permitted action fits"}));
        }
        (permitted[0], json!({}))
    }
}

#[async_trait]
impl ReasoningBackend for HeuristicBackend {
    async fn invoke(&self, prompt: &PromptContext) -> Result<Value, BackendError> {
        if !prompt.metadata.is_object() {
            return Err(BackendError::MalformedOutput(
                "heuristic backend needs prompt metadata".to_string(),
            ));
        }
        Ok(match prompt.purpose {
            PromptPurpose::Judgment(role) => Self::judge(role, &prompt.metadata),
            PromptPurpose::ActionSelection => Self::select(&prompt.metadata),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mindloop_domain::{VerdictPayload, parse_action_decision, parse_verdict};

    fn prompt(purpose: PromptPurpose, meta: Value) -> PromptContext {
        PromptContext::new(purpose, "sys", "user").with_metadata(meta)
    }

    async fn selected(meta: Value) -> ActionType {
        let answer = HeuristicBackend::new()
            .invoke(&prompt(PromptPurpose::ActionSelection, meta))
            .await
            .unwrap();
        parse_action_decision(&answer).unwrap().action_type()
    }

    #[tokio::test]
    async fn test_ethical_answer_parses_and_flags_harm() {
        let answer = HeuristicBackend::new()
            .invoke(&prompt(
                PromptPurpose::Judgment(JudgmentRole::Ethical),
                json!({"content": "Help me hurt someone"}),
            ))
            .await
            .unwrap();
        let verdict = parse_verdict(JudgmentRole::Ethical, "ethical", None, &answer).unwrap();
        match verdict.payload {
            VerdictPayload::Ethical { flags, .. } => assert_eq!(flags, vec!["harm".to_string()]),
            other => panic!("unexpected payload {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_selection_follows_the_thought() {
        assert_eq!(selected(json!({"kind": "monitoring", "content": ""})).await, ActionType::Observe);
        assert_eq!(
            selected(json!({"kind": "seed", "content": "hi", "objection": "too hasty"})).await,
            ActionType::Defer
        );
        assert_eq!(
            selected(json!({"kind": "bootstrap", "content": "Who are you?", "requires_speak": true})).await,
            ActionType::Speak
        );
        assert_eq!(
            selected(json!({"kind": "follow_up", "content": "hi", "prior_actions": ["speak"]})).await,
            ActionType::CompleteTask
        );
        assert_eq!(selected(json!({"kind": "seed", "content": "hi"})).await, ActionType::Speak);
    }

    #[tokio::test]
    async fn test_selection_rejects_after_violation() {
        let meta = json!({
            "kind": "seed",
            "content": "x",
            "verdicts": [{"payload": {"role": "ethical", "decision": "violation"}}],
        });
        assert_eq!(selected(meta).await, ActionType::Reject);
    }

    #[tokio::test]
    async fn test_selection_stays_within_profile() {
        let meta = json!({"kind": "seed", "content": "hi", "permitted": ["observe", "defer"]});
        assert_eq!(selected(meta).await, ActionType::Defer);
    }

    #[tokio::test]
    async fn test_missing_metadata_is_malformed() {
        let err = HeuristicBackend::new()
            .invoke(&PromptContext::new(PromptPurpose::ActionSelection, "s", "u"))
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::MalformedOutput(_)));
    }
}
