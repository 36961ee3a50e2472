//! Decision orchestrator: parallel judgment fan-out, sequential selection,
//! guardrail review.
//!
//! # Flow
//!
//! ```text
//!            ┌─► ethical ──────┐
//! thought ───┼─► common_sense ─┼─► verdicts ─► selector ─► guardrails ─► decision
//!            └─► domain:* ─────┘                  ▲             │
//!                                                 └── one re-run┘
//! ```
//!
//! Each module launch is protected by a per-attempt timeout, bounded
//! retries with linear backoff and a circuit breaker keyed by module name.
//! The fan-in waits for every launch up to the fan-out deadline; stragglers
//! past it are aborted. A failed module becomes a `dma_failure` escalation
//! and never aborts the others.

use super::guardrails::{GuardrailChain, ReviewInput, ReviewOutcome};
use super::selector::{ActionSelector, SelectionError};
use crate::config::DecisionParams;
use crate::judgment::{EvaluationError, Evaluate, JudgmentModule};
use crate::ports::audit_sink::AuditSink;
use crate::reasoning::InvocationError;
use mindloop_domain::{
    ActionDecision, AuditRecord, BreakerSnapshot, CircuitBreaker, DecisionSource, Escalation,
    EscalationKind, Thought, ThoughtContext, Verdict,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Rationale of the forced defer when every module failed.
pub const PIPELINE_EXHAUSTED: &str = "evaluation pipeline exhausted";

/// Everything the orchestrator produced for one thought.
#[derive(Debug, Clone)]
pub struct Decision {
    pub action: ActionDecision,
    /// Verdicts in module registration order (failed modules are absent)
    pub verdicts: Vec<Verdict>,
    pub escalations: Vec<Escalation>,
    /// Guardrail re-runs used (0 or 1)
    pub reruns: u32,
}

/// A module launch that did not produce a verdict.
struct ModuleFailure {
    error: EvaluationError,
    attempts: u32,
}

type Breakers = Arc<Mutex<HashMap<String, CircuitBreaker>>>;

fn lock_breakers(breakers: &Mutex<HashMap<String, CircuitBreaker>>) -> MutexGuard<'_, HashMap<String, CircuitBreaker>> {
    breakers.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct DecisionOrchestrator {
    modules: Vec<Arc<JudgmentModule>>,
    selector: ActionSelector,
    guardrails: GuardrailChain,
    params: DecisionParams,
    breakers: Breakers,
    audit: Arc<dyn AuditSink>,
}

impl DecisionOrchestrator {
    pub fn new(
        modules: Vec<JudgmentModule>,
        selector: ActionSelector,
        params: DecisionParams,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        let breakers = modules
            .iter()
            .map(|m| (m.name().to_string(), CircuitBreaker::new(params.module_breaker)))
            .collect();
        Self {
            modules: modules.into_iter().map(Arc::new).collect(),
            selector,
            guardrails: GuardrailChain::new(),
            params,
            breakers: Arc::new(Mutex::new(breakers)),
            audit,
        }
    }

    pub fn with_guardrails(mut self, guardrails: GuardrailChain) -> Self {
        self.guardrails = guardrails;
        self
    }

    pub fn selector(&self) -> &ActionSelector {
        &self.selector
    }

    pub fn module_names(&self) -> Vec<&str> {
        self.modules.iter().map(|m| m.name()).collect()
    }

    /// Breaker snapshot per judgment module, sorted by name.
    pub fn module_health(&self) -> Vec<(String, BreakerSnapshot)> {
        let now = Instant::now();
        let breakers = lock_breakers(&self.breakers);
        let sorted: BTreeMap<_, _> = breakers
            .iter()
            .map(|(name, breaker)| (name.clone(), breaker.snapshot(now)))
            .collect();
        sorted.into_iter().collect()
    }

    /// Force a module's breaker closed. Returns false for unknown modules.
    pub fn reset_module_breaker(&self, name: &str) -> bool {
        match lock_breakers(&self.breakers).get_mut(name) {
            Some(breaker) => {
                breaker.reset();
                info!(module = name, "Module breaker reset");
                true
            }
            None => false,
        }
    }

    /// Decide an action for `thought`. Always yields a decision.
    pub async fn decide(&self, thought: &Thought, ctx: &ThoughtContext) -> Decision {
        let (verdicts, failures) = self.fan_out(thought, ctx).await;

        let mut escalations = Vec::with_capacity(failures.len());
        for (module, failure) in &failures {
            let escalation = Escalation::dma_failure(
                thought,
                module.clone(),
                failure.error.to_string(),
                failure.attempts,
                ctx.round,
            );
            warn!(
                thought_id = %thought.id,
                module = %module,
                attempts = failure.attempts,
                error = %failure.error,
                "Judgment module failed"
            );
            self.audit.record(AuditRecord::escalation(&escalation));
            escalations.push(escalation);
        }

        if !self.modules.is_empty() && verdicts.is_empty() {
            warn!(thought_id = %thought.id, "All judgment modules failed, deferring");
            return Decision {
                action: ActionDecision::defer(PIPELINE_EXHAUSTED, DecisionSource::Fallback),
                verdicts,
                escalations,
                reruns: 0,
            };
        }

        let mut reruns = 0;
        let mut selection_ctx: Option<ThoughtContext> = None;
        let action = loop {
            let current_ctx = selection_ctx.as_ref().unwrap_or(ctx);
            let selected = match self.selector.select(thought, current_ctx, &verdicts).await {
                Ok(decision) => decision,
                Err(e) => {
                    let escalation = selection_escalation(thought, &e, ctx.round);
                    self.audit.record(AuditRecord::escalation(&escalation));
                    escalations.push(escalation);
                    warn!(thought_id = %thought.id, error = %e, "Action selection failed, deferring");
                    break ActionDecision::defer(
                        format!("action selection failed: {}", e),
                        DecisionSource::Fallback,
                    );
                }
            };

            let input = ReviewInput {
                thought,
                ctx: current_ctx,
                verdicts: &verdicts,
                rerun_used: reruns > 0,
            };
            match self.guardrails.review(selected, &input) {
                ReviewOutcome::Approved(decision) => break decision,
                ReviewOutcome::Rerun {
                    guardrail,
                    objection,
                } => {
                    info!(
                        thought_id = %thought.id,
                        guardrail = %guardrail,
                        "Guardrail requested a re-run of action selection"
                    );
                    reruns += 1;
                    selection_ctx = Some(ctx.with_objection(objection));
                }
            }
        };

        debug!(
            thought_id = %thought.id,
            action = %action.action_type(),
            source = ?action.source,
            verdicts = verdicts.len(),
            "Decision made"
        );

        Decision {
            action,
            verdicts,
            escalations,
            reruns,
        }
    }

    // ==================== Fan-out / Fan-in ====================

    async fn fan_out(
        &self,
        thought: &Thought,
        ctx: &ThoughtContext,
    ) -> (Vec<Verdict>, Vec<(String, ModuleFailure)>) {
        if self.modules.is_empty() {
            return (Vec::new(), Vec::new());
        }

        let thought = Arc::new(thought.clone());
        let ctx = Arc::new(ctx.clone());
        let mut join_set = JoinSet::new();
        let mut pending: BTreeMap<usize, String> = BTreeMap::new();

        for (index, module) in self.modules.iter().enumerate() {
            pending.insert(index, module.name().to_string());
            let module = Arc::clone(module);
            let thought = Arc::clone(&thought);
            let ctx = Arc::clone(&ctx);
            let breakers = Arc::clone(&self.breakers);
            let params = self.params.clone();

            join_set.spawn(async move {
                let result = evaluate_protected(&module, &thought, &ctx, &breakers, &params).await;
                (index, result)
            });
        }

        let deadline = tokio::time::Instant::now() + self.params.fanout_deadline;
        let mut verdicts: BTreeMap<usize, Verdict> = BTreeMap::new();
        let mut failures: Vec<(usize, String, ModuleFailure)> = Vec::new();

        loop {
            let joined = match tokio::time::timeout_at(deadline, join_set.join_next()).await {
                Ok(Some(joined)) => joined,
                Ok(None) => break,
                Err(_) => {
                    warn!(
                        thought_id = %thought.id,
                        stragglers = pending.len(),
                        "Fan-out deadline elapsed, aborting remaining modules"
                    );
                    join_set.abort_all();
                    break;
                }
            };

            match joined {
                Ok((index, Ok(verdict))) => {
                    pending.remove(&index);
                    verdicts.insert(index, verdict);
                }
                Ok((index, Err(failure))) => {
                    if let Some(name) = pending.remove(&index) {
                        failures.push((index, name, failure));
                    }
                }
                // The module stays pending and is reported below.
                Err(e) => warn!(error = %e, "Judgment task join error"),
            }
        }

        // Anything still pending was aborted or panicked.
        for (index, name) in pending {
            failures.push((
                index,
                name,
                ModuleFailure {
                    error: EvaluationError::Timeout(self.params.fanout_deadline),
                    attempts: 0,
                },
            ));
        }
        failures.sort_by_key(|(index, _, _)| *index);

        (
            verdicts.into_values().collect(),
            failures
                .into_iter()
                .map(|(_, name, failure)| (name, failure))
                .collect(),
        )
    }
}

/// One module launch with breaker, timeout and retries.
async fn evaluate_protected(
    module: &JudgmentModule,
    thought: &Thought,
    ctx: &ThoughtContext,
    breakers: &Mutex<HashMap<String, CircuitBreaker>>,
    params: &DecisionParams,
) -> Result<Verdict, ModuleFailure> {
    let name = module.name();
    let mut last_error = EvaluationError::CircuitOpen(name.to_string());

    for attempt in 1..=params.max_attempts {
        let allowed = lock_breakers(breakers)
            .get_mut(name)
            .is_none_or(|b| b.allows_request(Instant::now()));
        if !allowed {
            debug!(module = name, attempt, "Module breaker open, skipping call");
            return Err(ModuleFailure {
                error: EvaluationError::CircuitOpen(name.to_string()),
                attempts: attempt - 1,
            });
        }

        let outcome = tokio::time::timeout(params.module_timeout, module.evaluate(thought, ctx)).await;
        let error = match outcome {
            Ok(Ok(verdict)) => {
                if let Some(breaker) = lock_breakers(breakers).get_mut(name) {
                    breaker.record_success(Instant::now());
                }
                return Ok(verdict);
            }
            Ok(Err(e)) => e,
            Err(_) => EvaluationError::Timeout(params.module_timeout),
        };

        if let Some(breaker) = lock_breakers(breakers).get_mut(name) {
            breaker.record_failure(Instant::now());
        }
        debug!(module = name, attempt, error = %error, "Module attempt failed");
        last_error = error;

        if attempt < params.max_attempts {
            tokio::time::sleep(params.retry_backoff * attempt).await;
        }
    }

    Err(ModuleFailure {
        error: last_error,
        attempts: params.max_attempts,
    })
}

fn selection_escalation(thought: &Thought, error: &SelectionError, round: u64) -> Escalation {
    let kind = match error {
        SelectionError::Invocation(InvocationError::Unavailable(_)) => {
            EscalationKind::ProviderExhausted
        }
        _ => EscalationKind::DmaFailure,
    };
    let mut escalation = Escalation::new(thought, kind, error.to_string(), round);
    escalation.module = Some(super::selector::SELECTOR_HANDLER.to_string());
    escalation
}
