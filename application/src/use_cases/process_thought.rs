//! Thought pipeline
//!
//! Carries one thought from pending to a terminal status: decision,
//! permitted-action check, dispatch, audit and follow-up policy.

use crate::decision::DecisionOrchestrator;
use crate::lifecycle::{LifecycleError, TaskLifecycleManager, ThoughtLifecycleManager};
use crate::ports::action_executor::ActionExecutor;
use crate::ports::audit_sink::AuditSink;
use mindloop_domain::{
    ActionDecision, ActionParams, ActionType, AgentState, AuditRecord, DecisionSource, DomainError,
    Escalation, EscalationKind, TaskId, TaskStatus, Thought, ThoughtContext, ThoughtId,
    ThoughtStatus,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that abort a thought before a decision could be dispatched.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

/// How one thought left the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct ThoughtOutcome {
    pub thought_id: ThoughtId,
    pub task_id: TaskId,
    /// `None` when the thought failed before an action was chosen
    pub action: Option<ActionType>,
    pub status: ThoughtStatus,
    pub follow_up: Option<ThoughtId>,
    pub escalations: Vec<Escalation>,
}

impl ThoughtOutcome {
    fn new(thought: &Thought) -> Self {
        Self {
            thought_id: thought.id.clone(),
            task_id: thought.task_id.clone(),
            action: None,
            status: ThoughtStatus::Failed,
            follow_up: None,
            escalations: Vec::new(),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.status != ThoughtStatus::Failed
    }
}

/// Per-round settings the processor hands to the pipeline.
#[derive(Debug, Clone, Copy)]
pub struct PipelineRound {
    pub round: u64,
    pub state: AgentState,
    pub speculative: bool,
}

impl PipelineRound {
    pub fn new(round: u64, state: AgentState) -> Self {
        Self {
            round,
            state,
            speculative: false,
        }
    }

    pub fn speculative(mut self, speculative: bool) -> Self {
        self.speculative = speculative;
        self
    }
}

pub struct ThoughtPipeline {
    tasks: Arc<TaskLifecycleManager>,
    thoughts: Arc<ThoughtLifecycleManager>,
    orchestrator: Arc<DecisionOrchestrator>,
    executor: Arc<dyn ActionExecutor>,
    audit: Arc<dyn AuditSink>,
}

impl ThoughtPipeline {
    pub fn new(
        tasks: Arc<TaskLifecycleManager>,
        thoughts: Arc<ThoughtLifecycleManager>,
        orchestrator: Arc<DecisionOrchestrator>,
        executor: Arc<dyn ActionExecutor>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            tasks,
            thoughts,
            orchestrator,
            executor,
            audit,
        }
    }

    pub fn orchestrator(&self) -> &Arc<DecisionOrchestrator> {
        &self.orchestrator
    }

    /// Process one pending thought.
    ///
    /// Only store or invariant failures are returned as errors; every other
    /// failure ends in the returned outcome.
    pub async fn process(&self, id: &ThoughtId, round: PipelineRound) -> Result<ThoughtOutcome, PipelineError> {
        let thought = self.thoughts.mark_processing(id).await?;
        let mut outcome = ThoughtOutcome::new(&thought);

        let task = self.tasks.get_task(&thought.task_id).await?;
        let prior = self.thoughts.prior_actions(&task.id).await?;
        let ctx = ThoughtContext::new(task, round.state, round.round)
            .with_prior_actions(prior)
            .with_speculative(round.speculative);

        let decision = self.orchestrator.decide(&thought, &ctx).await;
        outcome.escalations.extend(decision.escalations);
        let mut action = decision.action;

        // Permitted-action violations fail the thought; the action is never
        // swapped for another one.
        if let Err(err) = self.check_permitted(&ctx, &action) {
            return self.fail_on_configuration(&thought, err, outcome).await;
        }

        let needs_follow_up = !thought.kind.is_system() && !action.action_type().is_terminal_for_task();
        if needs_follow_up && !self.thoughts.can_follow_up(&thought) {
            let escalation = Escalation::round_limit(&thought, self.thoughts.max_rounds(), round.round);
            self.audit.record(AuditRecord::escalation(&escalation));
            warn!(thought_id = %thought.id, round_count = thought.round_count, "Round limit reached, deferring");
            outcome.escalations.push(escalation);
            action = ActionDecision::defer(
                format!(
                    "thought chain reached the maximum of {} rounds",
                    self.thoughts.max_rounds()
                ),
                DecisionSource::Fallback,
            );
            if let Err(err) = self.check_permitted(&ctx, &action) {
                return self.fail_on_configuration(&thought, err, outcome).await;
            }
        }

        let action_type = action.action_type();
        outcome.action = Some(action_type);

        let ack = match self.executor.dispatch(&action, &thought).await {
            Ok(ack) => ack,
            Err(err) => {
                self.audit
                    .record(AuditRecord::dispatch(&thought, &action, format!("error: {}", err)));
                self.thoughts.mark_failed(&thought.id, &err.to_string()).await?;
                if !thought.kind.is_system() && self.thoughts.can_follow_up(&thought) {
                    let next = self
                        .thoughts
                        .follow_up(
                            &thought,
                            format!("The {} action failed: {}", action_type, err),
                            Vec::new(),
                            round.round,
                        )
                        .await?;
                    outcome.follow_up = Some(next.id);
                }
                return Ok(outcome);
            }
        };
        self.audit
            .record(AuditRecord::dispatch(&thought, &action, ack.summary.clone()));
        debug!(thought_id = %thought.id, action = %action_type, "Action dispatched");

        let record = Some((action_type, action.rationale.clone()));
        if thought.kind.is_system() {
            self.thoughts.finish(&thought.id, ThoughtStatus::Completed, record).await?;
            outcome.status = ThoughtStatus::Completed;
            return Ok(outcome);
        }

        match &action.params {
            ActionParams::Ponder { questions } => {
                self.thoughts.finish(&thought.id, ThoughtStatus::Completed, record).await?;
                let next = self
                    .thoughts
                    .follow_up(&thought, thought.content.clone(), questions.clone(), round.round)
                    .await?;
                outcome.follow_up = Some(next.id);
                outcome.status = ThoughtStatus::Completed;
            }
            ActionParams::CompleteTask { outcome: summary } => {
                self.thoughts.finish(&thought.id, ThoughtStatus::Completed, record).await?;
                self.finish_task(&thought.task_id, TaskStatus::Completed, summary).await?;
                outcome.status = ThoughtStatus::Completed;
            }
            ActionParams::Reject { reason } => {
                self.thoughts.finish(&thought.id, ThoughtStatus::Completed, record).await?;
                self.finish_task(&thought.task_id, TaskStatus::Failed, reason).await?;
                outcome.status = ThoughtStatus::Completed;
            }
            ActionParams::Defer { reason, .. } => {
                self.thoughts.finish(&thought.id, ThoughtStatus::Deferred, record).await?;
                self.finish_task(&thought.task_id, TaskStatus::Deferred, reason).await?;
                outcome.status = ThoughtStatus::Deferred;
            }
            _ => {
                self.thoughts.finish(&thought.id, ThoughtStatus::Completed, record).await?;
                let next = self
                    .thoughts
                    .follow_up(
                        &thought,
                        format!("Result of {}: {}", action_type, ack.summary),
                        Vec::new(),
                        round.round,
                    )
                    .await?;
                outcome.follow_up = Some(next.id);
                outcome.status = ThoughtStatus::Completed;
            }
        }

        info!(
            thought_id = %thought.id,
            task_id = %thought.task_id,
            action = %action_type,
            status = %outcome.status,
            "Thought processed"
        );
        Ok(outcome)
    }

    fn check_permitted(&self, ctx: &ThoughtContext, action: &ActionDecision) -> Result<(), DomainError> {
        self.orchestrator
            .selector()
            .profiles()
            .check(&ctx.task.profile, action.action_type())
    }

    async fn fail_on_configuration(
        &self,
        thought: &Thought,
        err: DomainError,
        mut outcome: ThoughtOutcome,
    ) -> Result<ThoughtOutcome, PipelineError> {
        let escalation = Escalation::new(
            thought,
            EscalationKind::ConfigurationError,
            err.to_string(),
            thought.round_created,
        );
        self.audit.record(AuditRecord::escalation(&escalation));
        outcome.escalations.push(escalation);

        warn!(thought_id = %thought.id, error = %err, "Configuration error, failing thought");
        self.thoughts.mark_failed(&thought.id, &err.to_string()).await?;
        if !thought.kind.is_system() {
            self.finish_task(&thought.task_id, TaskStatus::Failed, &err.to_string()).await?;
        }
        outcome.status = ThoughtStatus::Failed;
        Ok(outcome)
    }

    /// Finish the owning task unless something already finished it.
    async fn finish_task(&self, id: &TaskId, status: TaskStatus, outcome: &str) -> Result<(), LifecycleError> {
        let task = self.tasks.get_task(id).await?;
        if task.status.is_terminal() {
            return Ok(());
        }
        match status {
            TaskStatus::Completed => self.tasks.complete_task(id, outcome).await?,
            TaskStatus::Failed => self.tasks.fail_task(id, outcome).await?,
            _ => self.tasks.defer_task(id, outcome).await?,
        };
        Ok(())
    }
}
