//! Action types, typed parameters and the selected decision.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The ten action kinds a thought can resolve into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Observe,
    Speak,
    InvokeTool,
    Reject,
    Ponder,
    Defer,
    Memorize,
    Recall,
    Forget,
    CompleteTask,
}

impl ActionType {
    pub const ALL: [ActionType; 10] = [
        ActionType::Observe,
        ActionType::Speak,
        ActionType::InvokeTool,
        ActionType::Reject,
        ActionType::Ponder,
        ActionType::Defer,
        ActionType::Memorize,
        ActionType::Recall,
        ActionType::Forget,
        ActionType::CompleteTask,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::Observe => "observe",
            ActionType::Speak => "speak",
            ActionType::InvokeTool => "invoke_tool",
            ActionType::Reject => "reject",
            ActionType::Ponder => "ponder",
            ActionType::Defer => "defer",
            ActionType::Memorize => "memorize",
            ActionType::Recall => "recall",
            ActionType::Forget => "forget",
            ActionType::CompleteTask => "complete_task",
        }
    }

    /// Actions with effects outside the agent (the ones guardrails scrutinise).
    pub fn is_outward(&self) -> bool {
        matches!(
            self,
            ActionType::Speak | ActionType::InvokeTool | ActionType::Memorize | ActionType::Forget
        )
    }

    /// Actions that end the thought chain for their task.
    pub fn is_terminal_for_task(&self) -> bool {
        matches!(
            self,
            ActionType::CompleteTask | ActionType::Reject | ActionType::Defer
        )
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ActionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "observe" => Ok(ActionType::Observe),
            "speak" => Ok(ActionType::Speak),
            "invoke_tool" | "tool" => Ok(ActionType::InvokeTool),
            "reject" => Ok(ActionType::Reject),
            "ponder" => Ok(ActionType::Ponder),
            "defer" => Ok(ActionType::Defer),
            "memorize" => Ok(ActionType::Memorize),
            "recall" => Ok(ActionType::Recall),
            "forget" => Ok(ActionType::Forget),
            "complete_task" | "task_complete" => Ok(ActionType::CompleteTask),
            _ => Err(format!("Invalid action type: {}", s)),
        }
    }
}

/// Typed parameters, one variant per [`ActionType`].
///
/// Serialized adjacently tagged: `{"action": "speak", "parameters": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "parameters", rename_all = "snake_case")]
pub enum ActionParams {
    Observe {
        #[serde(default)]
        channel: Option<String>,
        #[serde(default)]
        active: bool,
    },
    Speak {
        content: String,
        #[serde(default)]
        channel: Option<String>,
    },
    InvokeTool {
        name: String,
        #[serde(default)]
        arguments: serde_json::Map<String, serde_json::Value>,
    },
    Reject {
        reason: String,
    },
    Ponder {
        #[serde(default)]
        questions: Vec<String>,
    },
    Defer {
        reason: String,
        #[serde(default)]
        defer_until: Option<u64>,
    },
    Memorize {
        key: String,
        value: String,
    },
    Recall {
        query: String,
    },
    Forget {
        key: String,
        #[serde(default)]
        reason: String,
    },
    CompleteTask {
        #[serde(default)]
        outcome: String,
    },
}

impl ActionParams {
    pub fn action_type(&self) -> ActionType {
        match self {
            ActionParams::Observe { .. } => ActionType::Observe,
            ActionParams::Speak { .. } => ActionType::Speak,
            ActionParams::InvokeTool { .. } => ActionType::InvokeTool,
            ActionParams::Reject { .. } => ActionType::Reject,
            ActionParams::Ponder { .. } => ActionType::Ponder,
            ActionParams::Defer { .. } => ActionType::Defer,
            ActionParams::Memorize { .. } => ActionType::Memorize,
            ActionParams::Recall { .. } => ActionType::Recall,
            ActionParams::Forget { .. } => ActionType::Forget,
            ActionParams::CompleteTask { .. } => ActionType::CompleteTask,
        }
    }
}

/// Which stage produced a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionSource {
    /// The action selector's reasoning call
    Selector,
    /// A hard-coded selector guard rule
    GuardRule,
    /// Rewritten by a guardrail
    Guardrail,
    /// Safe fallback after evaluation failure
    Fallback,
}

/// A selected action with its typed parameters and rationale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionDecision {
    #[serde(flatten)]
    pub params: ActionParams,
    pub rationale: String,
    pub source: DecisionSource,
}

impl ActionDecision {
    pub fn new(params: ActionParams, rationale: impl Into<String>, source: DecisionSource) -> Self {
        Self {
            params,
            rationale: rationale.into(),
            source,
        }
    }

    pub fn action_type(&self) -> ActionType {
        self.params.action_type()
    }

    /// The universal safe fallback.
    pub fn defer(reason: impl Into<String>, source: DecisionSource) -> Self {
        let reason = reason.into();
        Self::new(
            ActionParams::Defer {
                reason: reason.clone(),
                defer_until: None,
            },
            reason,
            source,
        )
    }

    pub fn ponder(questions: Vec<String>, rationale: impl Into<String>, source: DecisionSource) -> Self {
        Self::new(ActionParams::Ponder { questions }, rationale, source)
    }

    /// Content of a speak action, if this is one.
    pub fn spoken_content(&self) -> Option<&str> {
        match &self.params {
            ActionParams::Speak { content, .. } => Some(content),
            _ => None,
        }
    }
}
