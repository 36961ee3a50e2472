//! Snapshot of everything a thought is evaluated against.

use super::entities::{Task, Thought};
use crate::action::ActionType;
use crate::state::AgentState;
use serde::{Deserialize, Serialize};

/// Read-only context built once per thought before evaluation.
///
/// Judgment modules and the action selector only ever borrow it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThoughtContext {
    pub task: Task,
    pub state: AgentState,
    pub round: u64,
    /// Actions already taken for this task, oldest first
    pub prior_actions: Vec<ActionType>,
    /// Guardrail objection injected on a re-run
    pub objection: Option<String>,
    /// Speculative prompt variants are allowed (exploratory mode)
    pub speculative: bool,
}

impl ThoughtContext {
    pub fn new(task: Task, state: AgentState, round: u64) -> Self {
        Self {
            task,
            state,
            round,
            prior_actions: Vec::new(),
            objection: None,
            speculative: false,
        }
    }

    pub fn with_prior_actions(mut self, actions: Vec<ActionType>) -> Self {
        self.prior_actions = actions;
        self
    }

    pub fn with_speculative(mut self, speculative: bool) -> Self {
        self.speculative = speculative;
        self
    }

    /// A copy carrying a guardrail objection for the re-run.
    pub fn with_objection(&self, objection: impl Into<String>) -> Self {
        let mut ctx = self.clone();
        ctx.objection = Some(objection.into());
        ctx
    }

    pub fn has_prior_speak(&self) -> bool {
        self.prior_actions.contains(&ActionType::Speak)
    }

    /// Plain-text rendering used inside prompts.
    pub fn render(&self, thought: &Thought) -> String {
        let mut out = format!(
            "Task: {}\nTask priority: {}\nAgent state: {}\nRound: {}\nThought depth: {}\n",
            self.task.description,
            self.task.priority.value(),
            self.state,
            self.round,
            thought.round_count
        );

        if let Some(step) = &self.task.bootstrap_step {
            out.push_str(&format!("Bootstrap step: {}\n", step.name));
        }
        if let Some(note) = &thought.context_note {
            out.push_str(&format!("Context: {}\n", note));
        }
        if !self.prior_actions.is_empty() {
            let actions: Vec<&str> = self.prior_actions.iter().map(|a| a.as_str()).collect();
            out.push_str(&format!("Actions so far: {}\n", actions.join(", ")));
        }
        if !thought.ponder_notes.is_empty() {
            out.push_str("Earlier reflections:\n");
            for note in &thought.ponder_notes {
                out.push_str(&format!("- {}\n", note));
            }
        }
        if let Some(objection) = &self.objection {
            out.push_str(&format!("Reviewer objection to the previous choice: {}\n", objection));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::ThoughtKind;

    #[test]
    fn test_prior_speak_detection() {
        let ctx = ThoughtContext::new(Task::new("t"), AgentState::Bootstrap, 1);
        assert!(!ctx.has_prior_speak());

        let ctx = ctx.with_prior_actions(vec![ActionType::Ponder, ActionType::Speak]);
        assert!(ctx.has_prior_speak());
    }

    #[test]
    fn test_render_includes_notes_and_objection() {
        let task = Task::new("summarise the log");
        let mut thought = Thought::new(&task, ThoughtKind::Seed, "go", 2);
        thought.ponder_notes.push("which log?".into());

        let ctx = ThoughtContext::new(task, AgentState::NormalWork, 2).with_objection("too hasty");
        let text = ctx.render(&thought);

        assert!(text.contains("Task: summarise the log"));
        assert!(text.contains("Agent state: normal-work"));
        assert!(text.contains("- which log?"));
        assert!(text.contains("Reviewer objection to the previous choice: too hasty"));
    }
}
