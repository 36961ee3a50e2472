//! Non-thought activities of idle-reflection rounds.

use super::ProcessorServices;
use crate::lifecycle::LifecycleError;
use mindloop_domain::{AuditKind, AuditRecord, BreakerState, ThoughtStatus, current_timestamp};
use serde_json::json;
use std::sync::Mutex;
use std::sync::PoisonError;
use tracing::info;

/// Benchmark pulses and pattern analysis, emitted as reflection audit
/// records.
pub struct ReflectionActivities {
    services: ProcessorServices,
    /// Completion time floor for the next pattern analysis
    analysed_until: Mutex<u64>,
}

impl ReflectionActivities {
    pub fn new(services: ProcessorServices) -> Self {
        Self {
            services,
            analysed_until: Mutex::new(0),
        }
    }

    /// Whether `round` is due for reflection activities.
    pub fn is_due(&self, reflection_round: u64) -> bool {
        let interval = self.services.scheduler.reflection_interval_rounds.max(1);
        reflection_round % interval == 0
    }

    /// Snapshot of provider health and queue/task/thought counters.
    pub async fn benchmark_pulse(&self, round: u64) -> Result<AuditRecord, LifecycleError> {
        let s = &self.services;
        let health = s.registry.health();
        let open = health
            .iter()
            .filter(|h| h.breaker.state != BreakerState::Closed)
            .count();
        let tasks = s.tasks.counts().await?;
        let pending = s.thoughts.count(ThoughtStatus::Pending).await?;

        info!(
            round,
            providers = health.len(),
            unhealthy = open,
            pending_thoughts = pending,
            active_tasks = tasks.active,
            "Benchmark pulse"
        );
        let record = AuditRecord::new(
            AuditKind::Reflection,
            "idle_reflection",
            "benchmark_pulse",
            format!("{} provider(s), {} not closed", health.len(), open),
        )
        .with_details(json!({
            "round": round,
            "providers": health,
            "queue": {"len": s.queue.len(), "capacity": s.queue.capacity()},
            "tasks": tasks,
            "pending_thoughts": pending,
        }));
        s.audit.record(record.clone());
        Ok(record)
    }

    /// Distribution of actions chosen since the previous analysis.
    pub async fn pattern_analysis(&self, round: u64) -> Result<AuditRecord, LifecycleError> {
        let since = *self
            .analysed_until
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let now = current_timestamp();
        let distribution = self.services.thoughts.action_distribution(since).await?;
        *self
            .analysed_until
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = now;

        let total: usize = distribution.values().sum();
        let dominant = distribution
            .iter()
            .max_by_key(|(_, count)| **count)
            .map(|(action, _)| action.as_str())
            .unwrap_or("none");
        info!(round, total, dominant, "Pattern analysis");

        let counts: serde_json::Map<String, serde_json::Value> = distribution
            .iter()
            .map(|(action, count)| (action.as_str().to_string(), json!(count)))
            .collect();
        let record = AuditRecord::new(
            AuditKind::Reflection,
            "idle_reflection",
            "pattern_analysis",
            format!("{} action(s), most frequent: {}", total, dominant),
        )
        .with_details(json!({
            "round": round,
            "since": since,
            "distribution": counts,
        }));
        self.services.audit.record(record.clone());
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::fixture;
    use super::*;
    use crate::config::{LifecycleParams, SchedulerParams};
    use crate::ports::audit_sink::AuditSink;
    use crate::ports::store::TaskStore;
    use mindloop_domain::{ActionType, Task, TaskStatus};
    use serde_json::json;

    #[tokio::test]
    async fn test_pattern_analysis_counts_actions_once() {
        let f = fixture(
            json!({"action": "observe", "rationale": "r"}),
            SchedulerParams::default(),
            LifecycleParams::default(),
        );
        let s = &f.services;
        let mut task = Task::new("watch");
        task.set_status(TaskStatus::Active);
        f.store.insert_task(task.clone()).await.unwrap();
        let seed = s.thoughts.seed_thought(&task, 1).await.unwrap().unwrap();
        s.thoughts.mark_processing(&seed.id).await.unwrap();
        s.thoughts
            .finish(&seed.id, ThoughtStatus::Completed, Some((ActionType::Observe, "r".into())))
            .await
            .unwrap();

        let reflection = ReflectionActivities::new(s.clone());
        let first = reflection.pattern_analysis(3).await.unwrap();
        assert_eq!(first.details["distribution"]["observe"], 1);
        assert_eq!(f.audit.query(Some(AuditKind::Reflection)).len(), 1);
    }

    #[tokio::test]
    async fn test_benchmark_pulse_reports_counters() {
        let f = fixture(json!({}), SchedulerParams::default(), LifecycleParams::default());
        f.services.tasks.create_task(Task::new("queued")).await.unwrap();

        let reflection = ReflectionActivities::new(f.services.clone());
        let record = reflection.benchmark_pulse(5).await.unwrap();
        assert_eq!(record.action, "benchmark_pulse");
        assert_eq!(record.details["tasks"]["pending"], 1);
        assert_eq!(record.details["queue"]["capacity"], 50);
    }

    #[test]
    fn test_due_every_interval() {
        let f = fixture(
            json!({}),
            SchedulerParams::default().with_reflection_interval_rounds(3),
            LifecycleParams::default(),
        );
        let reflection = ReflectionActivities::new(f.services);
        assert!(!reflection.is_due(1));
        assert!(reflection.is_due(3));
        assert!(reflection.is_due(6));
    }
}
