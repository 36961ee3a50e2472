//! Structured-output parsing for action selection.
//!
//! The reasoning backend answers an action-selection prompt with a JSON
//! object:
//!
//! ```json
//! {"action": "speak", "parameters": {"content": "hi"}, "rationale": "..."}
//! ```
//!
//! Parsing is strict about the action name and parameter shape, lenient
//! about spelling (`complete-task`, `COMPLETE_TASK`) and about a missing
//! `parameters` object for actions whose parameters are all optional.

use super::decision::{ActionDecision, ActionParams, ActionType, DecisionSource};
use serde_json::{Map, Value};
use thiserror::Error;

/// Why a backend answer could not be turned into an [`ActionDecision`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ActionParseError {
    #[error("expected a JSON object, got {0}")]
    NotAnObject(String),

    #[error("missing field '{0}'")]
    MissingField(&'static str),

    #[error("unknown action '{0}'")]
    UnknownAction(String),

    #[error("invalid parameters for {action}: {reason}")]
    InvalidParameters { action: ActionType, reason: String },
}

/// Parse a backend answer into a decision attributed to the selector.
pub fn parse_action_decision(value: &Value) -> Result<ActionDecision, ActionParseError> {
    let object = value
        .as_object()
        .ok_or_else(|| ActionParseError::NotAnObject(type_name(value).to_string()))?;

    let action_name = object
        .get("action")
        .and_then(Value::as_str)
        .ok_or(ActionParseError::MissingField("action"))?;
    let action: ActionType = action_name
        .parse()
        .map_err(|_| ActionParseError::UnknownAction(action_name.to_string()))?;

    let rationale = object
        .get("rationale")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .ok_or(ActionParseError::MissingField("rationale"))?;

    let parameters = match object.get("parameters") {
        Some(Value::Object(map)) => Value::Object(map.clone()),
        Some(Value::Null) | None => Value::Object(Map::new()),
        Some(other) => {
            return Err(ActionParseError::InvalidParameters {
                action,
                reason: format!("expected object, got {}", type_name(other)),
            });
        }
    };

    let tagged = serde_json::json!({
        "action": action.as_str(),
        "parameters": parameters,
    });
    let params: ActionParams =
        serde_json::from_value(tagged).map_err(|e| ActionParseError::InvalidParameters {
            action,
            reason: e.to_string(),
        })?;

    Ok(ActionDecision::new(params, rationale, DecisionSource::Selector))
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_speak() {
        let decision = parse_action_decision(&json!({
            "action": "speak",
            "parameters": {"content": "Hello, operator."},
            "rationale": "the task asks for a greeting"
        }))
        .unwrap();

        assert_eq!(decision.action_type(), ActionType::Speak);
        assert_eq!(decision.spoken_content(), Some("Hello, operator."));
        assert_eq!(decision.source, DecisionSource::Selector);
    }

    #[test]
    fn test_missing_parameters_for_optional_action() {
        let decision = parse_action_decision(&json!({
            "action": "complete-task",
            "rationale": "done"
        }))
        .unwrap();
        assert_eq!(
            decision.params,
            ActionParams::CompleteTask {
                outcome: String::new()
            }
        );
    }

    #[test]
    fn test_missing_required_parameter_is_rejected() {
        let err = parse_action_decision(&json!({
            "action": "speak",
            "parameters": {},
            "rationale": "r"
        }))
        .unwrap_err();
        assert!(matches!(
            err,
            ActionParseError::InvalidParameters {
                action: ActionType::Speak,
                ..
            }
        ));
    }

    #[test]
    fn test_unknown_action() {
        let err = parse_action_decision(&json!({"action": "dance", "rationale": "r"})).unwrap_err();
        assert_eq!(err, ActionParseError::UnknownAction("dance".into()));
    }

    #[test]
    fn test_missing_rationale() {
        let err = parse_action_decision(&json!({"action": "ponder"})).unwrap_err();
        assert_eq!(err, ActionParseError::MissingField("rationale"));
    }

    #[test]
    fn test_blank_rationale_is_missing() {
        let err = parse_action_decision(&json!({
            "action": "speak",
            "parameters": {"content": "hi"},
            "rationale": "   "
        }))
        .unwrap_err();
        assert_eq!(err, ActionParseError::MissingField("rationale"));
    }

    #[test]
    fn test_not_an_object() {
        let err = parse_action_decision(&json!("speak")).unwrap_err();
        assert_eq!(err, ActionParseError::NotAnObject("string".into()));
    }
}
