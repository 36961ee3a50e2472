//! Template for the final action-selection call.

use crate::action::ActionType;
use serde::{Deserialize, Serialize};

/// Prompt for choosing one action from the permitted set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionTemplate {
    pub system: String,
    /// Added to the system prompt in exploratory mode
    pub speculative_hint: String,
}

impl Default for SelectionTemplate {
    fn default() -> Self {
        Self {
            system: SELECTION_SYSTEM.to_string(),
            speculative_hint: SPECULATIVE_HINT.to_string(),
        }
    }
}

impl SelectionTemplate {
    pub fn system_prompt(&self, speculative: bool) -> String {
        if speculative {
            format!("{}\n\n{}", self.system, self.speculative_hint)
        } else {
            self.system.clone()
        }
    }

    /// Render the user prompt from the thought, its context and verdict summaries.
    pub fn render(
        &self,
        thought: &str,
        context: &str,
        verdicts: &[String],
        permitted: &[ActionType],
    ) -> String {
        let mut prompt = format!("## Thought\n{}\n\n## Context\n{}\n", thought, context);

        prompt.push_str("\n## Evaluations\n");
        if verdicts.is_empty() {
            prompt.push_str("(no evaluations available)\n");
        } else {
            for verdict in verdicts {
                prompt.push_str(&format!("- {}\n", verdict));
            }
        }

        let names: Vec<&str> = permitted.iter().map(|a| a.as_str()).collect();
        prompt.push_str(&format!("\n## Permitted actions\n{}\n", names.join(", ")));
        prompt.push_str(SELECTION_FORMAT);
        prompt
    }
}

const SELECTION_SYSTEM: &str = r#"You choose the next action for an autonomous agent.
Weigh every evaluation you are given. Prefer ponder when information is missing and defer when the step should go to a human."#;

const SPECULATIVE_HINT: &str = r#"You are in an exploratory mode: unconventional but safe options are welcome."#;

const SELECTION_FORMAT: &str = r#"
Reply with one JSON object:
{"action": "<one permitted action>", "parameters": {...}, "rationale": "..."}

Parameters by action:
- observe: {"channel": "...", "active": false}
- speak: {"content": "...", "channel": "..."}
- invoke_tool: {"name": "...", "arguments": {...}}
- reject: {"reason": "..."}
- ponder: {"questions": ["..."]}
- defer: {"reason": "..."}
- memorize: {"key": "...", "value": "..."}
- recall: {"query": "..."}
- forget: {"key": "...", "reason": "..."}
- complete_task: {"outcome": "..."}"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_lists_permitted_actions_and_verdicts() {
        let template = SelectionTemplate::default();
        let prompt = template.render(
            "greet",
            "Task: greet",
            &["ethical: aligned".into()],
            &[ActionType::Speak, ActionType::Ponder],
        );
        assert!(prompt.contains("- ethical: aligned"));
        assert!(prompt.contains("## Permitted actions\nspeak, ponder"));
    }

    #[test]
    fn test_speculative_hint_only_when_requested() {
        let template = SelectionTemplate::default();
        assert!(!template.system_prompt(false).contains("exploratory"));
        assert!(template.system_prompt(true).contains("exploratory"));
    }

    #[test]
    fn test_missing_verdicts_are_stated() {
        let prompt = SelectionTemplate::default().render("x", "y", &[], &ActionType::ALL);
        assert!(prompt.contains("(no evaluations available)"));
    }
}
