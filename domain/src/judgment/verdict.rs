//! Verdict types produced by judgment modules.

use crate::action::ActionType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of judgment module roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JudgmentRole {
    Ethical,
    CommonSense,
    Domain,
}

impl JudgmentRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            JudgmentRole::Ethical => "ethical",
            JudgmentRole::CommonSense => "common_sense",
            JudgmentRole::Domain => "domain",
        }
    }
}

impl fmt::Display for JudgmentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for JudgmentRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "ethical" | "ethics" => Ok(JudgmentRole::Ethical),
            "common_sense" | "commonsense" | "csdma" => Ok(JudgmentRole::CommonSense),
            "domain" | "dsdma" => Ok(JudgmentRole::Domain),
            _ => Err(format!("Invalid judgment role: {}", s)),
        }
    }
}

/// Outcome of an ethical evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EthicalDecision {
    Aligned,
    Concern,
    Violation,
}

/// Role-specific verdict content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum VerdictPayload {
    Ethical {
        decision: EthicalDecision,
        flags: Vec<String>,
    },
    CommonSense {
        /// 0.0 (implausible) to 1.0 (entirely plausible)
        plausibility: f64,
        flags: Vec<String>,
    },
    Domain {
        domain: String,
        /// 0.0 to 1.0
        alignment: f64,
        flags: Vec<String>,
        recommended_action: Option<ActionType>,
    },
}

impl VerdictPayload {
    pub fn role(&self) -> JudgmentRole {
        match self {
            VerdictPayload::Ethical { .. } => JudgmentRole::Ethical,
            VerdictPayload::CommonSense { .. } => JudgmentRole::CommonSense,
            VerdictPayload::Domain { .. } => JudgmentRole::Domain,
        }
    }

    pub fn flags(&self) -> &[String] {
        match self {
            VerdictPayload::Ethical { flags, .. }
            | VerdictPayload::CommonSense { flags, .. }
            | VerdictPayload::Domain { flags, .. } => flags,
        }
    }
}

/// Structured result of one judgment module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    /// Name of the module that produced it (e.g. "ethical", "domain:medical")
    pub module: String,
    pub payload: VerdictPayload,
    pub rationale: String,
    /// 0.0 to 1.0
    pub confidence: f64,
}

impl Verdict {
    pub fn new(
        module: impl Into<String>,
        payload: VerdictPayload,
        rationale: impl Into<String>,
        confidence: f64,
    ) -> Self {
        Self {
            module: module.into(),
            payload,
            rationale: rationale.into(),
            confidence: clamp_unit(confidence),
        }
    }

    pub fn role(&self) -> JudgmentRole {
        self.payload.role()
    }

    /// Whether an ethical verdict reports a violation.
    pub fn is_ethical_violation(&self) -> bool {
        matches!(
            self.payload,
            VerdictPayload::Ethical {
                decision: EthicalDecision::Violation,
                ..
            }
        )
    }

    /// One-line summary for prompts and logs.
    pub fn summary(&self) -> String {
        let detail = match &self.payload {
            VerdictPayload::Ethical { decision, .. } => format!("{:?}", decision).to_lowercase(),
            VerdictPayload::CommonSense { plausibility, .. } => {
                format!("plausibility {:.2}", plausibility)
            }
            VerdictPayload::Domain {
                domain, alignment, ..
            } => format!("{} alignment {:.2}", domain, alignment),
        };
        let flags = self.payload.flags();
        if flags.is_empty() {
            format!("{}: {} (confidence {:.2})", self.module, detail, self.confidence)
        } else {
            format!(
                "{}: {} (confidence {:.2}; flags: {})",
                self.module,
                detail,
                self.confidence,
                flags.join(", ")
            )
        }
    }
}

pub(crate) fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
