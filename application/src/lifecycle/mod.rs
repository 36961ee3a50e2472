//! Task and thought lifecycles, plus the per-round processing queue.
//!
//! Each record has exactly one writer: tasks are mutated only by
//! [`TaskLifecycleManager`], thoughts only by [`ThoughtLifecycleManager`].

pub mod queue;
pub mod task_manager;
pub mod thought_manager;

pub use queue::{ProcessingQueue, QueueError};
pub use task_manager::{
    ActivationOrder, ActivationPolicy, SYSTEM_TASK_ID, TaskCounts, TaskLifecycleManager,
};
pub use thought_manager::ThoughtLifecycleManager;

use crate::ports::store::StoreError;
use mindloop_domain::{DomainError, TaskId, ThoughtId};
use thiserror::Error;

/// Errors from lifecycle operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LifecycleError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Task not found: {0}")]
    TaskNotFound(TaskId),

    #[error("Thought not found: {0}")]
    ThoughtNotFound(ThoughtId),

    #[error("{record} is {actual}, expected {expected}")]
    InvalidStatus {
        record: String,
        actual: String,
        expected: String,
    },

    #[error("Thought {thought} cannot follow up past round {max}")]
    RoundLimitExceeded { thought: ThoughtId, max: u32 },

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Shutdown in progress")]
    ShuttingDown,
}

/// Milliseconds since the epoch before which terminal records are archived.
pub(crate) fn retention_cutoff(retention: std::time::Duration) -> u64 {
    mindloop_domain::current_timestamp().saturating_sub(retention.as_millis() as u64)
}
