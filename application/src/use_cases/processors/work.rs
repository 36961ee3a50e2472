//! Work-mode processors: normal-work, exploratory, low-activity and
//! idle-reflection share one round shape and differ in admission policy.

use super::batch::process_queue;
use super::reflection::ReflectionActivities;
use super::{ModeProcessor, ProcessorServices};
use crate::lifecycle::{ActivationOrder, ActivationPolicy, LifecycleError};
use crate::use_cases::process_thought::PipelineRound;
use async_trait::async_trait;
use mindloop_domain::{AgentState, Priority, QueueItem, RoundResult, ThoughtKind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, info, warn};

/// The four work modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkMode {
    Normal,
    /// Arrival order and speculative prompts
    Exploratory,
    /// High-priority admission plus garbage collection
    LowActivity,
    /// Low-activity admission plus periodic reflection
    IdleReflection,
}

impl WorkMode {
    pub fn state(&self) -> AgentState {
        match self {
            WorkMode::Normal => AgentState::NormalWork,
            WorkMode::Exploratory => AgentState::Exploratory,
            WorkMode::LowActivity => AgentState::LowActivity,
            WorkMode::IdleReflection => AgentState::IdleReflection,
        }
    }

    /// Only tasks and thoughts at or above the high-priority threshold
    fn restricted(&self) -> bool {
        matches!(self, WorkMode::LowActivity | WorkMode::IdleReflection)
    }

    fn emits_monitoring(&self) -> bool {
        matches!(self, WorkMode::Normal | WorkMode::Exploratory)
    }

    fn order(&self) -> ActivationOrder {
        match self {
            WorkMode::Exploratory => ActivationOrder::Arrival,
            _ => ActivationOrder::Priority,
        }
    }
}

pub struct WorkProcessor {
    mode: WorkMode,
    services: ProcessorServices,
    reflection: Option<ReflectionActivities>,
    /// Rounds this processor has run
    rounds_run: AtomicU64,
}

impl WorkProcessor {
    pub fn new(mode: WorkMode, services: ProcessorServices) -> Self {
        let reflection =
            (mode == WorkMode::IdleReflection).then(|| ReflectionActivities::new(services.clone()));
        Self {
            mode,
            services,
            reflection,
            rounds_run: AtomicU64::new(0),
        }
    }

    pub fn mode(&self) -> WorkMode {
        self.mode
    }

    fn threshold(&self) -> Priority {
        if self.mode.restricted() {
            self.services.scheduler.high_priority_threshold
        } else {
            Priority::MIN
        }
    }

    async fn activate_and_seed(&self, round: u64, result: &mut RoundResult) -> Result<(), LifecycleError> {
        let s = &self.services;
        let policy = ActivationPolicy::new(s.scheduler.activation_batch)
            .with_order(self.mode.order())
            .with_min_priority(self.threshold());
        let activated = s.tasks.activate_with(policy).await?;
        result.activated = activated.len();
        for task in &activated {
            s.thoughts.seed_thought(task, round).await?;
        }
        Ok(())
    }

    async fn populate(&self, round: u64) -> Result<usize, LifecycleError> {
        let s = &self.services;
        let threshold = self.threshold();
        s.thoughts
            .populate_queue(&s.queue, round, s.scheduler.queue_capacity, |t| {
                t.priority >= threshold || t.kind == ThoughtKind::Meta
            })
            .await
    }

    /// One monitoring thought on the system task, queued for this round.
    async fn emit_monitoring(&self, round: u64) -> Result<(), LifecycleError> {
        let s = &self.services;
        let system = s.tasks.ensure_system_task().await?;
        let thought = s
            .thoughts
            .create_system_thought(
                &system,
                ThoughtKind::Monitoring,
                format!(
                    "No work was queued in round {}. Observe the environment and report anything that needs attention.",
                    round
                ),
                round,
            )
            .await?;
        if s.queue.push(QueueItem::from_thought(&thought, round)).is_err() {
            debug!(round, "Queue full, monitoring thought left pending");
        }
        Ok(())
    }

    /// Archive terminal thoughts, then tasks no thought refers to anymore.
    async fn collect_garbage(&self) -> Result<(usize, usize), LifecycleError> {
        let s = &self.services;
        let thoughts = s.thoughts.cleanup(s.lifecycle.thought_retention).await?;
        let referenced = s.thoughts.referenced_tasks().await?;
        let tasks = s.tasks.cleanup(s.lifecycle.task_retention, &referenced).await?;
        if tasks > 0 {
            s.thoughts.prune_seeded().await?;
        }
        Ok((tasks, thoughts))
    }

    async fn reflect(&self, round: u64, result: &mut RoundResult) {
        let Some(reflection) = &self.reflection else {
            return;
        };
        if !reflection.is_due(self.rounds_run.load(Ordering::SeqCst)) {
            return;
        }
        if let Err(err) = reflection.benchmark_pulse(round).await {
            result.record_error(format!("benchmark pulse: {}", err));
        }
        if let Err(err) = reflection.pattern_analysis(round).await {
            result.record_error(format!("pattern analysis: {}", err));
        }
    }
}

#[async_trait]
impl ModeProcessor for WorkProcessor {
    fn name(&self) -> &'static str {
        self.mode.state().as_str()
    }

    fn can_run(&self, state: AgentState) -> bool {
        state == self.mode.state()
    }

    async fn run_round(&self, round: u64) -> RoundResult {
        let started = Instant::now();
        self.rounds_run.fetch_add(1, Ordering::SeqCst);
        let state = self.mode.state();
        let mut result = RoundResult::new(round, state, self.name());

        if let Err(err) = self.activate_and_seed(round, &mut result).await {
            warn!(round, error = %err, "Activation failed");
            result.record_error(format!("activation: {}", err));
        }

        let added = match self.populate(round).await {
            Ok(added) => added,
            Err(err) => {
                warn!(round, error = %err, "Queue population failed");
                result.record_error(format!("queue population: {}", err));
                0
            }
        };

        if added == 0
            && self.mode.emits_monitoring()
            && !self.services.tasks.is_shutting_down()
            && let Err(err) = self.emit_monitoring(round).await
        {
            result.record_error(format!("monitoring thought: {}", err));
        }

        let pipeline_round = PipelineRound::new(round, state).speculative(self.mode == WorkMode::Exploratory);
        process_queue(&self.services, pipeline_round, &mut result).await;

        if self.mode.restricted() {
            match self.collect_garbage().await {
                Ok((0, 0)) => {}
                Ok((tasks, thoughts)) => info!(round, tasks, thoughts, "Garbage collected"),
                Err(err) => result.record_error(format!("garbage collection: {}", err)),
            }
        }
        self.reflect(round, &mut result).await;

        debug!(
            round,
            mode = state.as_str(),
            activated = result.activated,
            processed = result.processed,
            failed = result.failed,
            "Round finished"
        );
        result.with_elapsed_ms(started.elapsed().as_millis() as u64)
    }
}
