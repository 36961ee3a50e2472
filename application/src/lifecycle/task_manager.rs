//! Task lifecycle: creation, activation under a global ceiling, terminal
//! transitions, the bootstrap sequence and retention cleanup.

use super::{LifecycleError, retention_cutoff};
use crate::config::BootstrapStep;
use crate::ports::store::TaskStore;
use mindloop_domain::{
    BootstrapStepRef, Priority, Task, TaskId, TaskOrigin, TaskStatus,
};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Id of the task that owns monitoring and meta thoughts.
pub const SYSTEM_TASK_ID: &str = "system-monitoring";

/// Order in which pending tasks are considered for activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActivationOrder {
    /// Highest priority first, then oldest
    #[default]
    Priority,
    /// Oldest first regardless of priority
    Arrival,
}

/// Which pending tasks one activation pass may pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivationPolicy {
    pub limit: usize,
    /// Only tasks at or above this priority are admitted
    pub min_priority: Priority,
    pub order: ActivationOrder,
}

impl ActivationPolicy {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            min_priority: Priority::MIN,
            order: ActivationOrder::Priority,
        }
    }

    pub fn with_min_priority(mut self, min_priority: Priority) -> Self {
        self.min_priority = min_priority;
        self
    }

    pub fn with_order(mut self, order: ActivationOrder) -> Self {
        self.order = order;
        self
    }
}

/// Task counts by status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TaskCounts {
    pub pending: usize,
    pub active: usize,
    pub completed: usize,
    pub failed: usize,
    pub deferred: usize,
}

pub struct TaskLifecycleManager {
    store: Arc<dyn TaskStore>,
    max_active: usize,
    shutting_down: AtomicBool,
    /// Serializes activation so the ceiling holds under concurrent callers
    activation: Mutex<()>,
}

impl TaskLifecycleManager {
    pub fn new(store: Arc<dyn TaskStore>, max_active: usize) -> Self {
        Self {
            store,
            max_active,
            shutting_down: AtomicBool::new(false),
            activation: Mutex::new(()),
        }
    }

    pub fn max_active(&self) -> usize {
        self.max_active
    }

    // ==================== Creation & Lookup ====================

    pub async fn create_task(&self, task: Task) -> Result<Task, LifecycleError> {
        if task.status != TaskStatus::Pending {
            return Err(LifecycleError::InvalidStatus {
                record: format!("task {}", task.id),
                actual: task.status.to_string(),
                expected: TaskStatus::Pending.to_string(),
            });
        }
        self.store.insert_task(task.clone()).await?;
        info!(task_id = %task.id, priority = %task.priority, "Task created");
        Ok(task)
    }

    pub async fn get_task(&self, id: &TaskId) -> Result<Task, LifecycleError> {
        self.store
            .get_task(id)
            .await?
            .ok_or_else(|| LifecycleError::TaskNotFound(id.clone()))
    }

    pub async fn tasks_with_status(&self, status: TaskStatus) -> Result<Vec<Task>, LifecycleError> {
        Ok(self.store.tasks_by_status(status).await?)
    }

    /// Create (or fetch) the always-active task that owns monitoring and
    /// meta thoughts. It never counts against the active-task ceiling.
    pub async fn ensure_system_task(&self) -> Result<Task, LifecycleError> {
        let id = TaskId::new(SYSTEM_TASK_ID);
        if let Some(task) = self.store.get_task(&id).await? {
            return Ok(task);
        }
        let mut task = Task::new("Runtime monitoring and housekeeping")
            .with_id(id)
            .with_priority(Priority::MIN)
            .with_origin(TaskOrigin::system());
        task.set_status(TaskStatus::Active);
        self.store.insert_task(task.clone()).await?;
        Ok(task)
    }

    pub fn is_system_task(id: &TaskId) -> bool {
        id.as_str() == SYSTEM_TASK_ID
    }

    async fn active_requester_tasks(&self) -> Result<usize, LifecycleError> {
        Ok(self
            .store
            .tasks_by_status(TaskStatus::Active)
            .await?
            .iter()
            .filter(|t| !Self::is_system_task(&t.id))
            .count())
    }

    // ==================== Activation ====================

    /// Activate up to `limit` pending tasks (highest priority first).
    pub async fn activate_pending(&self, limit: usize) -> Result<usize, LifecycleError> {
        Ok(self.activate_with(ActivationPolicy::new(limit)).await?.len())
    }

    /// Activate pending tasks admitted by `policy`, never exceeding the
    /// global active-task ceiling. Returns the newly activated tasks.
    ///
    /// Bootstrap step tasks are never picked here; the bootstrap sequence
    /// activates them explicitly.
    pub async fn activate_with(&self, policy: ActivationPolicy) -> Result<Vec<Task>, LifecycleError> {
        if self.is_shutting_down() {
            debug!("Shutdown in progress, activation refused");
            return Ok(Vec::new());
        }
        let _guard = self.activation.lock().await;

        let active = self.active_requester_tasks().await?;
        let room = self.max_active.saturating_sub(active).min(policy.limit);
        if room == 0 {
            return Ok(Vec::new());
        }

        let mut candidates: Vec<Task> = self
            .store
            .tasks_by_status(TaskStatus::Pending)
            .await?
            .into_iter()
            .filter(|t| !t.is_bootstrap() && t.priority >= policy.min_priority)
            .collect();
        match policy.order {
            ActivationOrder::Priority => candidates.sort_by(|a, b| {
                b.priority
                    .cmp(&a.priority)
                    .then(a.created_at.cmp(&b.created_at))
            }),
            ActivationOrder::Arrival => candidates.sort_by_key(|t| t.created_at),
        }

        let mut activated = Vec::new();
        for mut task in candidates.into_iter().take(room) {
            task.set_status(TaskStatus::Active);
            self.store.update_task(&task).await?;
            debug!(task_id = %task.id, priority = %task.priority, "Task activated");
            activated.push(task);
        }
        if !activated.is_empty() {
            info!(count = activated.len(), active = active + activated.len(), "Activated tasks");
        }
        Ok(activated)
    }

    /// Activate one specific pending task.
    pub async fn activate_task(&self, id: &TaskId) -> Result<Task, LifecycleError> {
        if self.is_shutting_down() {
            return Err(LifecycleError::ShuttingDown);
        }
        let mut task = self.get_task(id).await?;
        match task.status {
            TaskStatus::Active => return Ok(task),
            TaskStatus::Pending => {}
            other => {
                return Err(LifecycleError::InvalidStatus {
                    record: format!("task {}", id),
                    actual: other.to_string(),
                    expected: TaskStatus::Pending.to_string(),
                });
            }
        }
        task.set_status(TaskStatus::Active);
        self.store.update_task(&task).await?;
        Ok(task)
    }

    // ==================== Terminal Transitions ====================

    pub async fn complete_task(&self, id: &TaskId, outcome: impl Into<String>) -> Result<Task, LifecycleError> {
        self.finish(id, TaskStatus::Completed, outcome.into()).await
    }

    pub async fn fail_task(&self, id: &TaskId, reason: impl Into<String>) -> Result<Task, LifecycleError> {
        self.finish(id, TaskStatus::Failed, reason.into()).await
    }

    pub async fn defer_task(&self, id: &TaskId, reason: impl Into<String>) -> Result<Task, LifecycleError> {
        self.finish(id, TaskStatus::Deferred, reason.into()).await
    }

    async fn finish(&self, id: &TaskId, status: TaskStatus, outcome: String) -> Result<Task, LifecycleError> {
        let mut task = self.get_task(id).await?;
        if task.status.is_terminal() {
            return Err(LifecycleError::InvalidStatus {
                record: format!("task {}", id),
                actual: task.status.to_string(),
                expected: "a non-terminal status".to_string(),
            });
        }
        task.set_status(status);
        task.outcome = Some(outcome);
        self.store.update_task(&task).await?;
        info!(task_id = %id, status = %status, "Task finished");
        Ok(task)
    }

    // ==================== Bootstrap Sequence ====================

    /// Deterministic id of a bootstrap step task.
    pub fn bootstrap_task_id(index: usize, step: &BootstrapStep) -> TaskId {
        TaskId::new(format!("bootstrap-{}-{}", index, step.name))
    }

    /// Create (or fetch) the task for every bootstrap step, in order.
    pub async fn ensure_bootstrap_tasks(&self, steps: &[BootstrapStep]) -> Result<Vec<Task>, LifecycleError> {
        let mut tasks = Vec::with_capacity(steps.len());
        for (index, step) in steps.iter().enumerate() {
            let id = Self::bootstrap_task_id(index, step);
            if let Some(existing) = self.store.get_task(&id).await? {
                tasks.push(existing);
                continue;
            }
            let task = Task::new(step.prompt.clone())
                .with_id(id)
                .with_priority(Priority::MAX)
                .with_origin(TaskOrigin::system())
                .with_bootstrap_step(BootstrapStepRef {
                    index,
                    name: step.name.clone(),
                    requires_speak: step.requires_speak,
                });
            self.store.insert_task(task.clone()).await?;
            debug!(task_id = %task.id, step = %step.name, "Bootstrap task created");
            tasks.push(task);
        }
        Ok(tasks)
    }

    /// Current task of every bootstrap step, in order (missing steps omitted).
    pub async fn bootstrap_tasks(&self, steps: &[BootstrapStep]) -> Result<Vec<Task>, LifecycleError> {
        let mut tasks = Vec::with_capacity(steps.len());
        for (index, step) in steps.iter().enumerate() {
            if let Some(task) = self.store.get_task(&Self::bootstrap_task_id(index, step)).await? {
                tasks.push(task);
            }
        }
        Ok(tasks)
    }

    /// Whether every bootstrap step's task completed.
    pub async fn bootstrap_complete(&self, steps: &[BootstrapStep]) -> Result<bool, LifecycleError> {
        let tasks = self.bootstrap_tasks(steps).await?;
        Ok(tasks.len() == steps.len() && tasks.iter().all(|t| t.status == TaskStatus::Completed))
    }

    /// The first bootstrap step that ended in anything but completion.
    pub async fn bootstrap_failure(&self, steps: &[BootstrapStep]) -> Result<Option<Task>, LifecycleError> {
        Ok(self
            .bootstrap_tasks(steps)
            .await?
            .into_iter()
            .find(|t| t.status.is_terminal() && t.status != TaskStatus::Completed))
    }

    // ==================== Shutdown & Housekeeping ====================

    /// Refuse all further activation.
    pub fn begin_shutdown(&self) {
        if !self.shutting_down.swap(true, Ordering::SeqCst) {
            info!("Task activation closed for shutdown");
        }
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::SeqCst)
    }

    /// Pending tasks that came from outside the runtime.
    pub async fn pending_requester_tasks(&self) -> Result<usize, LifecycleError> {
        Ok(self
            .store
            .tasks_by_status(TaskStatus::Pending)
            .await?
            .iter()
            .filter(|t| !t.is_bootstrap())
            .count())
    }

    /// Remove terminal tasks last updated before the retention window.
    ///
    /// Tasks listed in `referenced` still own thoughts and are kept.
    pub async fn cleanup(
        &self,
        retention: Duration,
        referenced: &HashSet<TaskId>,
    ) -> Result<usize, LifecycleError> {
        let cutoff = retention_cutoff(retention);
        let mut removed = 0;
        for status in [TaskStatus::Completed, TaskStatus::Failed, TaskStatus::Deferred] {
            for task in self.store.tasks_by_status(status).await? {
                if task.updated_at < cutoff
                    && !referenced.contains(&task.id)
                    && self.store.delete_task(&task.id).await?
                {
                    removed += 1;
                }
            }
        }
        if removed > 0 {
            info!(removed, "Archived terminal tasks");
        }
        Ok(removed)
    }

    pub async fn counts(&self) -> Result<TaskCounts, LifecycleError> {
        Ok(TaskCounts {
            pending: self.store.count_tasks(TaskStatus::Pending).await?,
            active: self.store.count_tasks(TaskStatus::Active).await?,
            completed: self.store.count_tasks(TaskStatus::Completed).await?,
            failed: self.store.count_tasks(TaskStatus::Failed).await?,
            deferred: self.store.count_tasks(TaskStatus::Deferred).await?,
        })
    }
}
