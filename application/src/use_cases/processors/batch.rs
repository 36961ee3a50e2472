//! Bounded concurrent batch processing of the round's queue.

use super::ProcessorServices;
use crate::use_cases::process_thought::{PipelineError, PipelineRound, ThoughtOutcome};
use mindloop_domain::{QueueItem, RoundResult};
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::error::Elapsed;
use tracing::{debug, error, warn};

/// Drain the queue in batches of `batch_concurrency` thoughts.
///
/// Each thought gets its own timeout; a thought that hits it is failed.
/// Once shutdown has begun no new batch is started. Whatever is still
/// queued at the end is dropped, since batches never span rounds.
pub(crate) async fn process_queue(services: &ProcessorServices, round: PipelineRound, result: &mut RoundResult) {
    let concurrency = services.scheduler.batch_concurrency.max(1);
    let timeout = services.scheduler.thought_timeout;

    loop {
        if services.tasks.is_shutting_down() {
            debug!(round = round.round, left = services.queue.len(), "Shutdown requested, not starting another batch");
            break;
        }
        let batch = services.queue.pop_batch(concurrency);
        if batch.is_empty() {
            break;
        }

        let mut set = JoinSet::new();
        for item in batch {
            let pipeline = services.pipeline.clone();
            set.spawn(async move {
                let processed = tokio::time::timeout(timeout, pipeline.process(&item.thought_id, round)).await;
                (item, processed)
            });
        }

        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((item, processed)) => record(services, &item, processed, timeout, result).await,
                Err(join_err) => {
                    error!(error = %join_err, "Thought worker panicked");
                    result.failed += 1;
                    result.record_error(format!("thought worker panicked: {}", join_err));
                }
            }
        }
    }

    services.queue.clear();
}

/// What a pipeline run under a timeout produced.
pub(crate) type Processed = Result<Result<ThoughtOutcome, PipelineError>, Elapsed>;

/// Fold one thought's pipeline result into the round result and notify
/// the observer. Errors and timeouts fail the thought.
pub(crate) async fn record(
    services: &ProcessorServices,
    item: &QueueItem,
    processed: Processed,
    timeout: Duration,
    result: &mut RoundResult,
) {
    match processed {
        Ok(Ok(outcome)) => {
            let success = outcome.succeeded();
            if success {
                result.processed += 1;
            } else {
                result.failed += 1;
            }
            if !item.kind.is_system() {
                result.idle = false;
            }
            for escalation in &outcome.escalations {
                services.observer.on_escalation(escalation);
            }
            result.escalations.extend(outcome.escalations);
            services
                .observer
                .on_thought_processed(&item.thought_id, outcome.action, success);
        }
        Ok(Err(err)) => {
            warn!(thought_id = %item.thought_id, error = %err, "Thought pipeline error");
            result.failed += 1;
            result.record_error(format!("thought {}: {}", item.thought_id, err));
            fail_quietly(services, item, &err.to_string()).await;
            services.observer.on_thought_processed(&item.thought_id, None, false);
        }
        Err(_) => {
            warn!(thought_id = %item.thought_id, ?timeout, "Thought timed out");
            result.failed += 1;
            result.record_error(format!("thought {} timed out after {:?}", item.thought_id, timeout));
            fail_quietly(services, item, "processing timed out").await;
            services.observer.on_thought_processed(&item.thought_id, None, false);
        }
    }
}

async fn fail_quietly(services: &ProcessorServices, item: &QueueItem, reason: &str) {
    if let Err(err) = services.thoughts.mark_failed(&item.thought_id, reason).await {
        error!(thought_id = %item.thought_id, error = %err, "Could not mark thought failed");
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::fixture;
    use super::*;
    use crate::config::{LifecycleParams, SchedulerParams};
    use crate::ports::store::TaskStore;
    use mindloop_domain::{AgentState, Task, TaskStatus, ThoughtStatus};
    use serde_json::json;

    #[tokio::test]
    async fn test_processes_queue_in_batches() {
        let f = fixture(
            json!({"action": "complete_task", "rationale": "done"}),
            SchedulerParams::default().with_batch_concurrency(2),
            LifecycleParams::default(),
        );
        let s = &f.services;
        for i in 0..5 {
            let mut task = Task::new(format!("task {}", i));
            task.set_status(TaskStatus::Active);
            f.store.insert_task(task.clone()).await.unwrap();
            s.thoughts.seed_thought(&task, 1).await.unwrap();
        }
        s.thoughts.populate_queue(&s.queue, 1, 10, |_| true).await.unwrap();

        let mut result = RoundResult::new(1, AgentState::NormalWork, "normal-work");
        process_queue(s, PipelineRound::new(1, AgentState::NormalWork), &mut result).await;

        assert_eq!(result.processed, 5);
        assert_eq!(result.failed, 0);
        assert!(!result.idle);
        assert!(s.queue.is_empty());
        assert_eq!(s.thoughts.count(ThoughtStatus::Completed).await.unwrap(), 5);
        assert_eq!(f.executor.0.lock().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_shutdown_stops_before_next_batch() {
        let f = fixture(
            json!({"action": "complete_task", "rationale": "done"}),
            SchedulerParams::default(),
            LifecycleParams::default(),
        );
        let s = &f.services;
        let mut task = Task::new("late");
        task.set_status(TaskStatus::Active);
        f.store.insert_task(task.clone()).await.unwrap();
        s.thoughts.seed_thought(&task, 1).await.unwrap();
        s.thoughts.populate_queue(&s.queue, 1, 10, |_| true).await.unwrap();
        s.tasks.begin_shutdown();

        let mut result = RoundResult::new(1, AgentState::NormalWork, "normal-work");
        process_queue(s, PipelineRound::new(1, AgentState::NormalWork), &mut result).await;

        assert_eq!(result.processed, 0);
        assert!(result.idle);
        assert!(s.queue.is_empty());
        assert_eq!(s.thoughts.count(ThoughtStatus::Pending).await.unwrap(), 1);
    }
}
