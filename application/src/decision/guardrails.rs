//! Post-selection guardrails.
//!
//! Guardrails run in configured order over the selected decision. Each one
//! may pass it, rewrite it (always toward a safer action) or ask for one
//! re-run of action selection with an objection. A thought gets at most one
//! re-run; a second re-run request is turned into a defer.

use crate::config::{GuardrailKind, GuardrailParams};
use mindloop_domain::{
    ActionDecision, ActionParams, DecisionSource, Thought, ThoughtContext, Verdict, VerdictPayload,
};
use tracing::{debug, warn};

/// What a guardrail sees besides the decision itself.
pub struct ReviewInput<'a> {
    pub thought: &'a Thought,
    pub ctx: &'a ThoughtContext,
    pub verdicts: &'a [Verdict],
    /// The single re-run for this thought was already spent
    pub rerun_used: bool,
}

/// Result of one guardrail check.
#[derive(Debug, Clone, PartialEq)]
pub enum GuardrailVerdict {
    Pass,
    Rewrite {
        decision: ActionDecision,
        reason: String,
    },
    Rerun {
        objection: String,
    },
}

/// A single post-decision check.
pub trait Guardrail: Send + Sync {
    fn name(&self) -> &str;

    fn check(&self, decision: &ActionDecision, input: &ReviewInput<'_>) -> GuardrailVerdict;
}

/// Outcome of running the whole chain.
#[derive(Debug, Clone, PartialEq)]
pub enum ReviewOutcome {
    /// Final decision (possibly rewritten)
    Approved(ActionDecision),
    /// Selection must run again with this objection in context
    Rerun { guardrail: String, objection: String },
}

// ==================== Built-in Guardrails ====================

/// Severe ethical flags (or an outright violation) veto outward actions.
pub struct EthicalFlagGuardrail {
    severe_flags: Vec<String>,
}

impl EthicalFlagGuardrail {
    pub fn new(severe_flags: Vec<String>) -> Self {
        Self {
            severe_flags: severe_flags.into_iter().map(|f| f.to_lowercase()).collect(),
        }
    }
}

impl Guardrail for EthicalFlagGuardrail {
    fn name(&self) -> &str {
        "ethical_flag"
    }

    fn check(&self, decision: &ActionDecision, input: &ReviewInput<'_>) -> GuardrailVerdict {
        if !decision.action_type().is_outward() {
            return GuardrailVerdict::Pass;
        }

        let mut hits: Vec<String> = Vec::new();
        for verdict in input.verdicts {
            if verdict.is_ethical_violation() {
                hits.push(format!("{} reports a violation", verdict.module));
            }
            if let VerdictPayload::Ethical { flags, .. } = &verdict.payload {
                hits.extend(
                    flags
                        .iter()
                        .filter(|f| self.severe_flags.contains(&f.to_lowercase()))
                        .cloned(),
                );
            }
        }

        if hits.is_empty() {
            return GuardrailVerdict::Pass;
        }
        let reason = format!("severe ethical concern: {}", hits.join(", "));
        GuardrailVerdict::Rewrite {
            decision: ActionDecision::defer(reason.clone(), DecisionSource::Guardrail),
            reason,
        }
    }
}

/// Low mean verdict confidence on an outward action asks for a re-run.
pub struct ConfidenceGuardrail {
    min_confidence: f64,
}

impl ConfidenceGuardrail {
    pub fn new(min_confidence: f64) -> Self {
        Self { min_confidence }
    }
}

impl Guardrail for ConfidenceGuardrail {
    fn name(&self) -> &str {
        "confidence"
    }

    fn check(&self, decision: &ActionDecision, input: &ReviewInput<'_>) -> GuardrailVerdict {
        if !decision.action_type().is_outward() || input.verdicts.is_empty() {
            return GuardrailVerdict::Pass;
        }
        let mean = input.verdicts.iter().map(|v| v.confidence).sum::<f64>()
            / input.verdicts.len() as f64;
        if mean >= self.min_confidence {
            return GuardrailVerdict::Pass;
        }
        GuardrailVerdict::Rerun {
            objection: format!(
                "mean evaluation confidence {:.2} is below {:.2}; choose a more cautious action or justify '{}'",
                mean,
                self.min_confidence,
                decision.action_type()
            ),
        }
    }
}

/// Blocked terms in spoken content rewrite the decision to defer.
pub struct ContentPolicyGuardrail {
    blocked_terms: Vec<String>,
}

impl ContentPolicyGuardrail {
    pub fn new(blocked_terms: Vec<String>) -> Self {
        Self {
            blocked_terms: blocked_terms
                .into_iter()
                .map(|t| t.to_lowercase())
                .filter(|t| !t.trim().is_empty())
                .collect(),
        }
    }
}

impl Guardrail for ContentPolicyGuardrail {
    fn name(&self) -> &str {
        "content_policy"
    }

    fn check(&self, decision: &ActionDecision, _input: &ReviewInput<'_>) -> GuardrailVerdict {
        let Some(content) = decision.spoken_content() else {
            return GuardrailVerdict::Pass;
        };
        let lowered = content.to_lowercase();
        match self.blocked_terms.iter().find(|term| lowered.contains(term.as_str())) {
            Some(term) => {
                let reason = format!("spoken content contains blocked term '{}'", term);
                GuardrailVerdict::Rewrite {
                    decision: ActionDecision::defer(reason.clone(), DecisionSource::Guardrail),
                    reason,
                }
            }
            None => GuardrailVerdict::Pass,
        }
    }
}

/// Every dispatched action must carry a rationale.
pub struct RationaleGuardrail;

impl Guardrail for RationaleGuardrail {
    fn name(&self) -> &str {
        "rationale"
    }

    fn check(&self, decision: &ActionDecision, _input: &ReviewInput<'_>) -> GuardrailVerdict {
        if decision.rationale.trim().is_empty() {
            GuardrailVerdict::Rerun {
                objection: "the previous choice had no rationale; explain the action you pick".into(),
            }
        } else {
            GuardrailVerdict::Pass
        }
    }
}

// ==================== Chain ====================

/// Ordered guardrail chain.
#[derive(Default)]
pub struct GuardrailChain {
    guardrails: Vec<Box<dyn Guardrail>>,
}

impl GuardrailChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the configured built-in chain (empty when disabled).
    pub fn from_params(params: &GuardrailParams) -> Self {
        if !params.enabled {
            return Self::new();
        }
        params
            .chain
            .iter()
            .fold(Self::new(), |chain, kind| match kind {
                GuardrailKind::EthicalFlag => {
                    chain.with(EthicalFlagGuardrail::new(params.severe_flags.clone()))
                }
                GuardrailKind::Confidence => {
                    chain.with(ConfidenceGuardrail::new(params.min_confidence))
                }
                GuardrailKind::ContentPolicy => {
                    chain.with(ContentPolicyGuardrail::new(params.blocked_terms.clone()))
                }
                GuardrailKind::Rationale => chain.with(RationaleGuardrail),
            })
    }

    pub fn with(mut self, guardrail: impl Guardrail + 'static) -> Self {
        self.guardrails.push(Box::new(guardrail));
        self
    }

    pub fn names(&self) -> Vec<&str> {
        self.guardrails.iter().map(|g| g.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.guardrails.is_empty()
    }

    /// Run every guardrail over `decision` in order.
    pub fn review(&self, decision: ActionDecision, input: &ReviewInput<'_>) -> ReviewOutcome {
        let mut current = decision;

        for guardrail in &self.guardrails {
            match guardrail.check(&current, input) {
                GuardrailVerdict::Pass => {}
                GuardrailVerdict::Rewrite { decision, reason } => {
                    warn!(
                        thought_id = %input.thought.id,
                        guardrail = guardrail.name(),
                        from = %current.action_type(),
                        to = %decision.action_type(),
                        reason = %reason,
                        "Guardrail rewrote decision"
                    );
                    current = decision;
                }
                GuardrailVerdict::Rerun { objection } if input.rerun_used => {
                    debug!(
                        thought_id = %input.thought.id,
                        guardrail = guardrail.name(),
                        "Re-run already used, deferring"
                    );
                    current = ActionDecision::new(
                        ActionParams::Defer {
                            reason: objection.clone(),
                            defer_until: None,
                        },
                        format!("{} objection persisted after re-run: {}", guardrail.name(), objection),
                        DecisionSource::Guardrail,
                    );
                }
                GuardrailVerdict::Rerun { objection } => {
                    return ReviewOutcome::Rerun {
                        guardrail: guardrail.name().to_string(),
                        objection,
                    };
                }
            }
        }

        ReviewOutcome::Approved(current)
    }
}
