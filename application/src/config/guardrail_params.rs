//! Guardrail ("conscience") parameters.

use std::fmt;

/// Built-in guardrails, in the order they may be chained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GuardrailKind {
    EthicalFlag,
    Confidence,
    ContentPolicy,
    Rationale,
}

impl GuardrailKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GuardrailKind::EthicalFlag => "ethical_flag",
            GuardrailKind::Confidence => "confidence",
            GuardrailKind::ContentPolicy => "content_policy",
            GuardrailKind::Rationale => "rationale",
        }
    }
}

impl fmt::Display for GuardrailKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for GuardrailKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "ethical_flag" | "ethical" => Ok(GuardrailKind::EthicalFlag),
            "confidence" => Ok(GuardrailKind::Confidence),
            "content_policy" | "content" => Ok(GuardrailKind::ContentPolicy),
            "rationale" => Ok(GuardrailKind::Rationale),
            _ => Err(format!("Invalid guardrail: {}", s)),
        }
    }
}

/// Controls the post-decision guardrail chain.
#[derive(Debug, Clone, PartialEq)]
pub struct GuardrailParams {
    pub enabled: bool,
    /// Guardrails to run, in order
    pub chain: Vec<GuardrailKind>,
    /// Ethical flags that block outward actions
    pub severe_flags: Vec<String>,
    /// Mean verdict confidence below which outward actions are questioned
    pub min_confidence: f64,
    /// Terms that may not appear in spoken content (case-insensitive)
    pub blocked_terms: Vec<String>,
}

impl Default for GuardrailParams {
    fn default() -> Self {
        Self {
            enabled: true,
            chain: vec![
                GuardrailKind::EthicalFlag,
                GuardrailKind::ContentPolicy,
                GuardrailKind::Confidence,
                GuardrailKind::Rationale,
            ],
            severe_flags: vec!["harm".into(), "deception".into(), "privacy".into()],
            min_confidence: 0.3,
            blocked_terms: Vec::new(),
        }
    }
}

impl GuardrailParams {
    // ==================== Builder Methods ====================

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    pub fn with_chain(mut self, chain: Vec<GuardrailKind>) -> Self {
        self.chain = chain;
        self
    }

    pub fn with_severe_flags(mut self, flags: Vec<String>) -> Self {
        self.severe_flags = flags;
        self
    }

    pub fn with_min_confidence(mut self, confidence: f64) -> Self {
        self.min_confidence = confidence;
        self
    }

    pub fn with_blocked_terms(mut self, terms: Vec<String>) -> Self {
        self.blocked_terms = terms;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_str() {
        assert_eq!("content-policy".parse::<GuardrailKind>(), Ok(GuardrailKind::ContentPolicy));
        assert!("vibes".parse::<GuardrailKind>().is_err());
    }

    #[test]
    fn test_default_chain_runs_all_four() {
        assert_eq!(GuardrailParams::default().chain.len(), 4);
        assert!(!GuardrailParams::disabled().enabled);
    }
}
