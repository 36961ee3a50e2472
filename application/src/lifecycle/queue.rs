//! Bounded in-memory staging area for one round.

use mindloop_domain::{QueueClass, QueueItem, ThoughtId};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    #[error("Processing queue is full ({0} items)")]
    Full(usize),
}

#[derive(Default)]
struct Lanes {
    meta: VecDeque<QueueItem>,
    normal: VecDeque<QueueItem>,
}

impl Lanes {
    fn len(&self) -> usize {
        self.meta.len() + self.normal.len()
    }
}

/// FIFO with a preempting lane for meta thoughts.
///
/// Every push and pop takes one lock, so concurrent batch workers observe a
/// single linear order.
pub struct ProcessingQueue {
    lanes: Mutex<Lanes>,
    capacity: usize,
}

impl ProcessingQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            lanes: Mutex::new(Lanes::default()),
            capacity,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Lanes> {
        self.lanes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn push(&self, item: QueueItem) -> Result<(), QueueError> {
        let mut lanes = self.lock();
        if lanes.len() >= self.capacity {
            return Err(QueueError::Full(self.capacity));
        }
        match item.class() {
            QueueClass::Meta => lanes.meta.push_back(item),
            QueueClass::Normal => lanes.normal.push_back(item),
        }
        Ok(())
    }

    /// Next item: any meta item first, otherwise the oldest normal item.
    pub fn pop(&self) -> Option<QueueItem> {
        let mut lanes = self.lock();
        lanes.meta.pop_front().or_else(|| lanes.normal.pop_front())
    }

    /// Pop up to `n` items in queue order.
    pub fn pop_batch(&self, n: usize) -> Vec<QueueItem> {
        let mut lanes = self.lock();
        let mut batch = Vec::with_capacity(n.min(lanes.len()));
        while batch.len() < n {
            match lanes.meta.pop_front().or_else(|| lanes.normal.pop_front()) {
                Some(item) => batch.push(item),
                None => break,
            }
        }
        batch
    }

    pub fn contains(&self, thought: &ThoughtId) -> bool {
        let lanes = self.lock();
        lanes
            .meta
            .iter()
            .chain(lanes.normal.iter())
            .any(|item| &item.thought_id == thought)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn remaining(&self) -> usize {
        self.capacity.saturating_sub(self.len())
    }

    /// Drop everything; items never outlive their round.
    pub fn clear(&self) {
        let mut lanes = self.lock();
        lanes.meta.clear();
        lanes.normal.clear();
    }
}
