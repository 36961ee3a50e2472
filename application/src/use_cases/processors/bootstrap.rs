//! Bootstrap processor: the ordered identity, integrity and capability
//! affirmation sequence.
//!
//! *Blocking* mode drives one step at a time to a terminal status (each
//! under the step timeout) before touching the next, all within one round.
//! *Non-blocking* mode activates and seeds every step in its first round and
//! returns; later rounds process the step chains as an ordinary batch.

use super::batch::{process_queue, record};
use super::{ModeProcessor, ProcessorServices};
use crate::lifecycle::LifecycleError;
use crate::use_cases::process_thought::PipelineRound;
use async_trait::async_trait;
use mindloop_domain::{AgentState, QueueItem, RoundResult, Task, TaskId, TaskStatus, ThoughtStatus};
use std::collections::HashSet;
use std::time::Instant;
use tracing::{debug, info, warn};

pub struct BootstrapProcessor {
    services: ProcessorServices,
}

impl BootstrapProcessor {
    pub fn new(services: ProcessorServices) -> Self {
        Self { services }
    }

    /// Make sure the step task is active and seeded. Returns whether this
    /// call activated it.
    async fn start_step(&self, task: &Task, round: u64) -> Result<bool, LifecycleError> {
        let s = &self.services;
        let activated = if task.status == TaskStatus::Pending {
            s.tasks.activate_task(&task.id).await?;
            true
        } else {
            false
        };
        s.thoughts.seed_thought(task, round).await?;
        Ok(activated)
    }

    async fn run_blocking(&self, round: u64, result: &mut RoundResult) -> Result<(), LifecycleError> {
        let s = &self.services;
        let steps = &s.lifecycle.bootstrap_steps;
        let step_timeout = s.scheduler.bootstrap_step_timeout;

        for task in s.tasks.ensure_bootstrap_tasks(steps).await? {
            if task.status.is_terminal() {
                if task.status != TaskStatus::Completed {
                    break;
                }
                continue;
            }
            if s.tasks.is_shutting_down() {
                break;
            }
            if self.start_step(&task, round).await? {
                result.activated += 1;
            }
            info!(task_id = %task.id, step = %task.description, "Bootstrap step started");

            if tokio::time::timeout(step_timeout, self.drive_step(&task.id, round, result))
                .await
                .is_err()
            {
                warn!(task_id = %task.id, ?step_timeout, "Bootstrap step timed out");
                result.record_error(format!("bootstrap step {} timed out after {:?}", task.id, step_timeout));
                self.abandon_step(&task.id, "bootstrap step timed out").await?;
            }

            let finished = s.tasks.get_task(&task.id).await?;
            if finished.status != TaskStatus::Completed {
                warn!(task_id = %task.id, status = %finished.status, "Bootstrap step did not complete");
                break;
            }
        }
        Ok(())
    }

    /// Process the step's pending thoughts until its task is terminal.
    async fn drive_step(&self, task_id: &TaskId, round: u64, result: &mut RoundResult) {
        let s = &self.services;
        let timeout = s.scheduler.thought_timeout;
        let pipeline_round = PipelineRound::new(round, AgentState::Bootstrap);

        loop {
            let task = match s.tasks.get_task(task_id).await {
                Ok(task) => task,
                Err(err) => {
                    result.record_error(format!("bootstrap step {}: {}", task_id, err));
                    return;
                }
            };
            if task.status.is_terminal() || s.tasks.is_shutting_down() {
                return;
            }

            let pending: Vec<_> = match s.thoughts.thoughts_for_task(task_id).await {
                Ok(thoughts) => thoughts
                    .into_iter()
                    .filter(|t| t.status == ThoughtStatus::Pending)
                    .collect(),
                Err(err) => {
                    result.record_error(format!("bootstrap step {}: {}", task_id, err));
                    return;
                }
            };
            if pending.is_empty() {
                warn!(task_id = %task_id, "Bootstrap step stalled without pending thoughts");
                result.record_error(format!("bootstrap step {} stalled", task_id));
                if let Err(err) = self.abandon_step(task_id, "bootstrap step stalled").await {
                    result.record_error(format!("bootstrap step {}: {}", task_id, err));
                }
                return;
            }

            for thought in pending {
                let item = QueueItem::from_thought(&thought, round);
                let processed =
                    tokio::time::timeout(timeout, s.pipeline.process(&thought.id, pipeline_round)).await;
                record(s, &item, processed, timeout, result).await;
            }
        }
    }

    /// Fail the step task and whatever of its chain is still open.
    async fn abandon_step(&self, task_id: &TaskId, reason: &str) -> Result<(), LifecycleError> {
        let s = &self.services;
        for thought in s.thoughts.thoughts_for_task(task_id).await? {
            s.thoughts.mark_failed(&thought.id, reason).await?;
        }
        if !s.tasks.get_task(task_id).await?.status.is_terminal() {
            s.tasks.fail_task(task_id, reason).await?;
        }
        Ok(())
    }

    async fn run_non_blocking(&self, round: u64, result: &mut RoundResult) -> Result<(), LifecycleError> {
        let s = &self.services;
        let tasks = s.tasks.ensure_bootstrap_tasks(&s.lifecycle.bootstrap_steps).await?;

        let mut seeded = 0;
        for task in tasks.iter().filter(|t| !t.status.is_terminal()) {
            if s.tasks.is_shutting_down() {
                break;
            }
            if task.status == TaskStatus::Pending {
                s.tasks.activate_task(&task.id).await?;
                result.activated += 1;
            }
            if s.thoughts.seed_thought(task, round).await?.is_some() {
                seeded += 1;
            }
        }
        if seeded > 0 {
            info!(round, seeded, "Bootstrap steps enqueued");
            return Ok(());
        }

        let ids: HashSet<TaskId> = tasks.into_iter().map(|t| t.id).collect();
        let added = s
            .thoughts
            .populate_queue(&s.queue, round, s.scheduler.queue_capacity, |t| ids.contains(&t.task_id))
            .await?;
        debug!(round, added, "Bootstrap thoughts queued");
        process_queue(s, PipelineRound::new(round, AgentState::Bootstrap), result).await;
        Ok(())
    }
}

#[async_trait]
impl ModeProcessor for BootstrapProcessor {
    fn name(&self) -> &'static str {
        AgentState::Bootstrap.as_str()
    }

    fn can_run(&self, state: AgentState) -> bool {
        state == AgentState::Bootstrap
    }

    async fn run_round(&self, round: u64) -> RoundResult {
        let started = Instant::now();
        let mut result = RoundResult::new(round, AgentState::Bootstrap, self.name());

        let run = if self.services.scheduler.bootstrap_blocking {
            self.run_blocking(round, &mut result).await
        } else {
            self.run_non_blocking(round, &mut result).await
        };
        if let Err(err) = run {
            warn!(round, error = %err, "Bootstrap round failed");
            result.record_error(format!("bootstrap: {}", err));
        }
        result.with_elapsed_ms(started.elapsed().as_millis() as u64)
    }
}
