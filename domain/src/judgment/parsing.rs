//! Structured-output validation for judgment verdicts.
//!
//! Pure functions: given the JSON a reasoning backend returned for a
//! judgment prompt, build a [`Verdict`] or explain what is wrong with it.
//! Judgment modules feed the error text back to the backend when they retry.
//!
//! | Role | Required fields |
//! |------|-----------------|
//! | ethical | `decision` (aligned/concern/violation), `rationale`, `confidence` |
//! | common_sense | `plausibility` (0..1), `rationale`, `confidence` |
//! | domain | `alignment` (0..1), `rationale`, `confidence` |
//!
//! `flags` (list of strings) is optional everywhere; `recommended_action`
//! is optional for domain verdicts.

use super::verdict::{EthicalDecision, JudgmentRole, Verdict, VerdictPayload};
use crate::action::ActionType;
use serde_json::Value;
use thiserror::Error;

/// Why a backend answer is not a valid verdict.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum VerdictParseError {
    #[error("expected a JSON object")]
    NotAnObject,

    #[error("missing field '{0}'")]
    MissingField(&'static str),

    #[error("field '{field}' must be between 0 and 1, got {value}")]
    OutOfRange { field: &'static str, value: f64 },

    #[error("field '{field}' is invalid: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

/// Parse a backend answer into a verdict for `role`.
///
/// `module` names the producing module; `domain` is the knowledge domain of
/// a domain module and is ignored for other roles.
pub fn parse_verdict(
    role: JudgmentRole,
    module: &str,
    domain: Option<&str>,
    value: &Value,
) -> Result<Verdict, VerdictParseError> {
    let object = value.as_object().ok_or(VerdictParseError::NotAnObject)?;

    let rationale = object
        .get("rationale")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .ok_or(VerdictParseError::MissingField("rationale"))?;
    let confidence = unit_field(object.get("confidence"), "confidence")?;
    let flags = flags_field(object.get("flags"))?;

    let payload = match role {
        JudgmentRole::Ethical => {
            let raw = object
                .get("decision")
                .and_then(Value::as_str)
                .ok_or(VerdictParseError::MissingField("decision"))?;
            let decision = match raw.trim().to_lowercase().as_str() {
                "aligned" | "approve" | "ok" => EthicalDecision::Aligned,
                "concern" | "caution" => EthicalDecision::Concern,
                "violation" | "reject" => EthicalDecision::Violation,
                other => {
                    return Err(VerdictParseError::InvalidField {
                        field: "decision",
                        reason: format!("unknown decision '{}'", other),
                    });
                }
            };
            VerdictPayload::Ethical { decision, flags }
        }
        JudgmentRole::CommonSense => VerdictPayload::CommonSense {
            plausibility: unit_field(object.get("plausibility"), "plausibility")?,
            flags,
        },
        JudgmentRole::Domain => {
            let recommended_action = match object.get("recommended_action") {
                None | Some(Value::Null) => None,
                Some(Value::String(s)) => Some(s.parse::<ActionType>().map_err(|reason| {
                    VerdictParseError::InvalidField {
                        field: "recommended_action",
                        reason,
                    }
                })?),
                Some(_) => {
                    return Err(VerdictParseError::InvalidField {
                        field: "recommended_action",
                        reason: "expected a string".into(),
                    });
                }
            };
            VerdictPayload::Domain {
                domain: domain.unwrap_or("general").to_string(),
                alignment: unit_field(object.get("alignment"), "alignment")?,
                flags,
                recommended_action,
            }
        }
    };

    Ok(Verdict::new(module, payload, rationale, confidence))
}

fn unit_field(value: Option<&Value>, field: &'static str) -> Result<f64, VerdictParseError> {
    let number = value
        .and_then(Value::as_f64)
        .ok_or(VerdictParseError::MissingField(field))?;
    if !(0.0..=1.0).contains(&number) {
        return Err(VerdictParseError::OutOfRange {
            field,
            value: number,
        });
    }
    Ok(number)
}

fn flags_field(value: Option<&Value>) -> Result<Vec<String>, VerdictParseError> {
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| VerdictParseError::InvalidField {
                        field: "flags",
                        reason: "every flag must be a string".into(),
                    })
            })
            .collect(),
        Some(_) => Err(VerdictParseError::InvalidField {
            field: "flags",
            reason: "expected a list of strings".into(),
        }),
    }
}
