//! Ephemeral projection of a thought used inside a single round.

use super::entities::{Thought, ThoughtKind};
use super::priority::Priority;
use crate::core::ids::{TaskId, ThoughtId};

/// Ordering class inside the processing queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueClass {
    /// Always popped before any normal item
    Meta,
    /// FIFO
    Normal,
}

/// A lightweight handle on a thought for one round; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueItem {
    pub thought_id: ThoughtId,
    pub task_id: TaskId,
    pub kind: ThoughtKind,
    pub priority: Priority,
    pub round: u64,
}

impl QueueItem {
    pub fn from_thought(thought: &Thought, round: u64) -> Self {
        Self {
            thought_id: thought.id.clone(),
            task_id: thought.task_id.clone(),
            kind: thought.kind,
            priority: thought.priority,
            round,
        }
    }

    pub fn class(&self) -> QueueClass {
        if self.kind == ThoughtKind::Meta {
            QueueClass::Meta
        } else {
            QueueClass::Normal
        }
    }
}
