//! Round loop
//!
//! Drives the state machine one round at a time:
//!
//! ```text
//! ┌─► boundary: admin requests, shutdown check, pause gate
//! │   begin_round → processor for current mode → RoundResult
//! │   idle accounting → bootstrap failure check → auto transition
//! └── sleep(round_interval)
//! ```
//!
//! Shutdown closes task activation, lets the running round drain until the
//! shutdown deadline, then applies the final `→ shutdown` transition.

mod control;
mod summary;

pub use control::{AdminControl, ControlError};
pub use summary::RunSummary;

use crate::config::{BootstrapStep, SchedulerParams};
use crate::lifecycle::{LifecycleError, TaskLifecycleManager, ThoughtLifecycleManager};
use crate::ports::audit_sink::AuditSink;
use crate::ports::round_observer::RoundObserver;
use crate::use_cases::processors::ModeProcessor;
use chrono::Utc;
use control::{ControlReceiver, Gate, TransitionRequest};
use mindloop_domain::{
    AgentState, AuditKind, AuditRecord, GuardContext, RoundResult, StateMachine, TransitionTrigger,
};
use std::sync::Arc;
use std::time::Instant;
use summary::Totals;
use tracing::{debug, error, info, warn};

/// Owns the state machine and runs the processors.
pub struct AgentOrchestrator {
    machine: StateMachine,
    processors: Vec<Arc<dyn ModeProcessor>>,
    tasks: Arc<TaskLifecycleManager>,
    thoughts: Arc<ThoughtLifecycleManager>,
    observer: Arc<dyn RoundObserver>,
    audit: Arc<dyn AuditSink>,
    params: SchedulerParams,
    bootstrap_steps: Vec<BootstrapStep>,
    control: AdminControl,
    receiver: ControlReceiver,
}

impl AgentOrchestrator {
    pub fn new(
        processors: Vec<Arc<dyn ModeProcessor>>,
        tasks: Arc<TaskLifecycleManager>,
        thoughts: Arc<ThoughtLifecycleManager>,
        observer: Arc<dyn RoundObserver>,
        audit: Arc<dyn AuditSink>,
        params: SchedulerParams,
        bootstrap_steps: Vec<BootstrapStep>,
    ) -> Self {
        let machine = if params.skip_bootstrap {
            StateMachine::starting_in(AgentState::NormalWork)
        } else {
            StateMachine::new()
        };
        let (control, receiver) = AdminControl::new(machine.current());
        Self {
            machine,
            processors,
            tasks,
            thoughts,
            observer,
            audit,
            params,
            bootstrap_steps,
            control,
            receiver,
        }
    }

    /// Handle for administrative calls; clone freely.
    pub fn control(&self) -> AdminControl {
        self.control.clone()
    }

    pub fn state(&self) -> AgentState {
        self.machine.current()
    }

    /// Run rounds until shutdown is requested, the round limit is reached,
    /// or bootstrap fails.
    pub async fn run(mut self) -> RunSummary {
        let started = Instant::now();
        let started_at = Utc::now().to_rfc3339();
        let mut totals = Totals::default();
        let mut idle_rounds: u32 = 0;
        let mut drained = true;

        info!(state = %self.machine.current(), "Round loop started");

        let reason = loop {
            self.drain_requests(idle_rounds).await;
            if self.machine.is_shutdown() {
                break "shutdown transition requested".to_string();
            }
            if self.control.is_shutdown_requested() {
                break self.requested_reason();
            }
            if let Some(max) = self.params.max_rounds
                && self.machine.round() >= max
            {
                break format!("reached the limit of {} rounds", max);
            }
            if !self.wait_for_gate(idle_rounds).await {
                if self.machine.is_shutdown() {
                    break "shutdown transition requested".to_string();
                }
                break self.requested_reason();
            }

            let state = self.machine.current();
            let Some(processor) = self.processors.iter().find(|p| p.can_run(state)).cloned() else {
                error!(state = %state, "No processor for state");
                break format!("no processor registered for {}", state);
            };

            let round = self.machine.begin_round();
            self.observer.on_round_start(round, state);
            debug!(round, state = %state, processor = processor.name(), "Round started");

            let (result, finished) = self.run_processor(processor.as_ref(), round, state).await;
            drained &= finished;
            totals.add(&result);
            self.observer.on_round_complete(&result);
            if result.idle {
                idle_rounds = idle_rounds.saturating_add(1);
            } else {
                idle_rounds = 0;
            }

            if self.control.is_shutdown_requested() {
                break self.requested_reason();
            }
            if state == AgentState::Bootstrap {
                match self.tasks.bootstrap_failure(&self.bootstrap_steps).await {
                    Ok(Some(task)) => {
                        error!(task_id = %task.id, status = %task.status, "Bootstrap step failed");
                        break format!("bootstrap step {} ended {}", task.id, task.status);
                    }
                    Ok(None) => {}
                    Err(err) => warn!(error = %err, "Could not check bootstrap progress"),
                }
            }

            self.auto_transition(idle_rounds).await;

            tokio::select! {
                biased;
                _ = self.control.cancellation().cancelled() => {}
                _ = tokio::time::sleep(self.params.round_interval) => {}
            }
        };

        self.finish(reason, totals, drained, started, started_at, idle_rounds)
            .await
    }

    /// Run one round; on shutdown, give it until the deadline to finish.
    async fn run_processor(
        &self,
        processor: &dyn ModeProcessor,
        round: u64,
        state: AgentState,
    ) -> (RoundResult, bool) {
        let cancel = self.control.cancellation().clone();
        let round_fut = processor.run_round(round);
        tokio::pin!(round_fut);

        tokio::select! {
            biased;
            result = &mut round_fut => (result, true),
            _ = cancel.cancelled() => {
                self.tasks.begin_shutdown();
                info!(round, deadline = ?self.params.shutdown_deadline, "Draining in-flight work");
                match tokio::time::timeout(self.params.shutdown_deadline, &mut round_fut).await {
                    Ok(result) => (result, true),
                    Err(_) => {
                        warn!(round, "Shutdown deadline elapsed, abandoning round");
                        let mut result = RoundResult::new(round, state, processor.name());
                        result.record_error("round abandoned at the shutdown deadline");
                        match self.thoughts.fail_in_flight("shutdown deadline").await {
                            Ok(0) => {}
                            Ok(failed) => info!(round, failed, "Failed thoughts left in flight"),
                            Err(err) => result.record_error(format!("failing in-flight thoughts: {}", err)),
                        }
                        (result, false)
                    }
                }
            }
        }
    }

    /// Block while paused. Returns `false` when shutdown arrived meanwhile.
    async fn wait_for_gate(&mut self, idle_rounds: u32) -> bool {
        let mut announced = false;
        loop {
            let gate: Gate = *self.receiver.gate.borrow_and_update();
            if !gate.paused {
                if announced {
                    self.observer.on_paused(false);
                    self.audit_admin("resume");
                }
                return true;
            }
            if gate.step_tokens > 0 {
                self.control.consume_step();
                debug!("Single step granted");
                return true;
            }
            if !announced {
                announced = true;
                info!(round = self.machine.round(), "Round loop paused");
                self.observer.on_paused(true);
                self.audit_admin("pause");
            }

            let cancel = self.control.cancellation().clone();
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return false,
                changed = self.receiver.gate.changed() => {
                    if changed.is_err() {
                        return false;
                    }
                }
                request = self.receiver.requests.recv() => {
                    if let Some(request) = request {
                        self.apply_request(request, idle_rounds).await;
                        if self.machine.is_shutdown() {
                            return false;
                        }
                    }
                }
            }
        }
    }

    async fn drain_requests(&mut self, idle_rounds: u32) {
        while let Ok(request) = self.receiver.requests.try_recv() {
            self.apply_request(request, idle_rounds).await;
        }
    }

    async fn apply_request(&mut self, request: TransitionRequest, idle_rounds: u32) {
        let ctx = self.guard_context(idle_rounds).await;
        let answer = match self
            .machine
            .transition(request.to, TransitionTrigger::Manual, request.reason, &ctx)
        {
            Ok(transition) => {
                let transition = transition.clone();
                info!(from = %transition.from, to = %transition.to, "Manual transition applied");
                self.audit.record(AuditRecord::transition(&transition));
                self.observer.on_transition(&transition);
                self.control.publish_state(transition.to);
                Ok(transition)
            }
            Err(err) => {
                warn!(error = %err, "Manual transition rejected");
                self.audit.record(AuditRecord::new(
                    AuditKind::Admin,
                    "operator",
                    format!("transition -> {}", request.to),
                    format!("rejected: {}", err),
                ));
                Err(ControlError::Rejected(err))
            }
        };
        // The requester may have given up waiting.
        let _ = request.reply.send(answer);
    }

    async fn auto_transition(&mut self, idle_rounds: u32) {
        let ctx = self.guard_context(idle_rounds).await;
        let Some(to) = self.machine.suggest_auto(&ctx) else {
            return;
        };
        let reason = auto_reason(self.machine.current(), to, &ctx);
        match self.machine.transition(to, TransitionTrigger::Auto, reason, &ctx) {
            Ok(transition) => {
                let transition = transition.clone();
                info!(from = %transition.from, to = %transition.to, reason = %transition.reason, "State transition");
                self.audit.record(AuditRecord::transition(&transition));
                self.observer.on_transition(&transition);
                self.control.publish_state(transition.to);
            }
            Err(err) => warn!(error = %err, "Suggested transition rejected"),
        }
    }

    async fn guard_context(&self, idle_rounds: u32) -> GuardContext {
        let bootstrap_complete = self.params.skip_bootstrap
            || self
                .tasks
                .bootstrap_complete(&self.bootstrap_steps)
                .await
                .unwrap_or(false);
        let pending_work = match self.pending_work().await {
            Ok(pending) => pending,
            Err(err) => {
                warn!(error = %err, "Could not count pending work");
                true
            }
        };
        GuardContext {
            bootstrap_complete,
            idle_rounds,
            pending_work,
            thresholds: self.params.idle,
        }
    }

    async fn pending_work(&self) -> Result<bool, LifecycleError> {
        Ok(self.tasks.pending_requester_tasks().await? > 0 || self.thoughts.pending_work().await? > 0)
    }

    fn requested_reason(&self) -> String {
        self.control
            .shutdown_reason()
            .unwrap_or_else(|| "shutdown requested".to_string())
    }

    fn audit_admin(&self, action: &str) {
        self.audit.record(AuditRecord::new(
            AuditKind::Admin,
            "operator",
            action,
            format!("at round {}", self.machine.round()),
        ));
    }

    async fn finish(
        mut self,
        reason: String,
        totals: Totals,
        drained: bool,
        started: Instant,
        started_at: String,
        idle_rounds: u32,
    ) -> RunSummary {
        self.tasks.begin_shutdown();
        if !self.machine.is_shutdown() {
            let ctx = self.guard_context(idle_rounds).await;
            match self
                .machine
                .transition(AgentState::Shutdown, TransitionTrigger::Manual, reason.clone(), &ctx)
            {
                Ok(transition) => {
                    let transition = transition.clone();
                    self.audit.record(AuditRecord::transition(&transition));
                    self.observer.on_transition(&transition);
                }
                Err(err) => error!(error = %err, "Final shutdown transition rejected"),
            }
        }
        self.control.publish_state(self.machine.current());
        self.observer.on_shutdown(&reason);

        let tasks = match self.tasks.counts().await {
            Ok(counts) => counts,
            Err(err) => {
                warn!(error = %err, "Could not count tasks for the summary");
                Default::default()
            }
        };
        info!(
            rounds = self.machine.round(),
            processed = totals.processed,
            failed = totals.failed,
            reason = %reason,
            "Round loop stopped"
        );

        RunSummary {
            final_state: self.machine.current(),
            rounds: self.machine.round(),
            transitions: self.machine.history().to_vec(),
            processed: totals.processed,
            failed: totals.failed,
            escalations: totals.escalations,
            errors: totals.errors,
            tasks,
            shutdown_reason: reason,
            drained,
            started_at,
            finished_at: Utc::now().to_rfc3339(),
            elapsed_ms: started.elapsed().as_millis() as u64,
        }
    }
}

fn auto_reason(from: AgentState, to: AgentState, ctx: &GuardContext) -> String {
    match (from, to) {
        (AgentState::Bootstrap, AgentState::NormalWork) => "bootstrap sequence complete".to_string(),
        (_, AgentState::NormalWork) => "pending work arrived".to_string(),
        (_, AgentState::Shutdown) => "shutdown".to_string(),
        _ => format!("idle for {} rounds", ctx.idle_rounds),
    }
}
