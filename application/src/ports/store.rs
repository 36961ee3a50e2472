//! Persistent store ports for tasks and thoughts
//!
//! Records are flat (see the domain entities), so any key-value or
//! relational engine can back these traits. Each record has a single
//! writer: the lifecycle manager that owns its status transitions.

use async_trait::async_trait;
use mindloop_domain::{Task, TaskId, TaskStatus, Thought, ThoughtId, ThoughtStatus};
use thiserror::Error;

/// Errors from a persistent store
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Record already exists: {0}")]
    Conflict(String),

    #[error("Store backend error: {0}")]
    Backend(String),
}

/// CRUD for tasks, queryable by status.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Insert a new task; fails with `Conflict` if the id exists.
    async fn insert_task(&self, task: Task) -> Result<(), StoreError>;

    async fn get_task(&self, id: &TaskId) -> Result<Option<Task>, StoreError>;

    /// Replace an existing task; fails with `NotFound` if it is missing.
    async fn update_task(&self, task: &Task) -> Result<(), StoreError>;

    async fn tasks_by_status(&self, status: TaskStatus) -> Result<Vec<Task>, StoreError>;

    async fn count_tasks(&self, status: TaskStatus) -> Result<usize, StoreError> {
        Ok(self.tasks_by_status(status).await?.len())
    }

    /// Remove a task, returning whether it existed.
    async fn delete_task(&self, id: &TaskId) -> Result<bool, StoreError>;
}

/// CRUD for thoughts, queryable by status and by parent task.
#[async_trait]
pub trait ThoughtStore: Send + Sync {
    async fn insert_thought(&self, thought: Thought) -> Result<(), StoreError>;

    async fn get_thought(&self, id: &ThoughtId) -> Result<Option<Thought>, StoreError>;

    async fn update_thought(&self, thought: &Thought) -> Result<(), StoreError>;

    async fn thoughts_by_status(&self, status: ThoughtStatus) -> Result<Vec<Thought>, StoreError>;

    async fn thoughts_for_task(&self, task_id: &TaskId) -> Result<Vec<Thought>, StoreError>;

    async fn count_thoughts(&self, status: ThoughtStatus) -> Result<usize, StoreError> {
        Ok(self.thoughts_by_status(status).await?.len())
    }

    async fn delete_thought(&self, id: &ThoughtId) -> Result<bool, StoreError>;
}
