//! Process-local store backed by hash maps.

use async_trait::async_trait;
use mindloop_application::{StoreError, TaskStore, ThoughtStore};
use mindloop_domain::{Task, TaskId, TaskStatus, Thought, ThoughtId, ThoughtStatus};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Default)]
struct Tables {
    tasks: HashMap<TaskId, Task>,
    thoughts: HashMap<ThoughtId, Thought>,
}

/// Keeps every record in memory; nothing survives the process.
///
/// One lock guards both tables so a reader never sees a thought whose
/// task insert is still in flight.
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Sort by creation time so callers see a stable order.
fn sorted_tasks<'a>(tasks: impl Iterator<Item = &'a Task>) -> Vec<Task> {
    let mut out: Vec<Task> = tasks.cloned().collect();
    out.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.as_str().cmp(b.id.as_str())));
    out
}

fn sorted_thoughts<'a>(thoughts: impl Iterator<Item = &'a Thought>) -> Vec<Thought> {
    let mut out: Vec<Thought> = thoughts.cloned().collect();
    out.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.as_str().cmp(b.id.as_str())));
    out
}

#[async_trait]
impl TaskStore for InMemoryStore {
    async fn insert_task(&self, task: Task) -> Result<(), StoreError> {
        let mut tables = self.write();
        if tables.tasks.contains_key(&task.id) {
            return Err(StoreError::Conflict(task.id.to_string()));
        }
        tables.tasks.insert(task.id.clone(), task);
        Ok(())
    }

    async fn get_task(&self, id: &TaskId) -> Result<Option<Task>, StoreError> {
        Ok(self.read().tasks.get(id).cloned())
    }

    async fn update_task(&self, task: &Task) -> Result<(), StoreError> {
        match self.write().tasks.get_mut(&task.id) {
            Some(slot) => {
                *slot = task.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(task.id.to_string())),
        }
    }

    async fn tasks_by_status(&self, status: TaskStatus) -> Result<Vec<Task>, StoreError> {
        Ok(sorted_tasks(self.read().tasks.values().filter(|t| t.status == status)))
    }

    async fn count_tasks(&self, status: TaskStatus) -> Result<usize, StoreError> {
        Ok(self.read().tasks.values().filter(|t| t.status == status).count())
    }

    async fn delete_task(&self, id: &TaskId) -> Result<bool, StoreError> {
        Ok(self.write().tasks.remove(id).is_some())
    }
}

#[async_trait]
impl ThoughtStore for InMemoryStore {
    async fn insert_thought(&self, thought: Thought) -> Result<(), StoreError> {
        let mut tables = self.write();
        if tables.thoughts.contains_key(&thought.id) {
            return Err(StoreError::Conflict(thought.id.to_string()));
        }
        tables.thoughts.insert(thought.id.clone(), thought);
        Ok(())
    }

    async fn get_thought(&self, id: &ThoughtId) -> Result<Option<Thought>, StoreError> {
        Ok(self.read().thoughts.get(id).cloned())
    }

    async fn update_thought(&self, thought: &Thought) -> Result<(), StoreError> {
        match self.write().thoughts.get_mut(&thought.id) {
            Some(slot) => {
                *slot = thought.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(thought.id.to_string())),
        }
    }

    async fn thoughts_by_status(&self, status: ThoughtStatus) -> Result<Vec<Thought>, StoreError> {
        Ok(sorted_thoughts(self.read().thoughts.values().filter(|t| t.status == status)))
    }

    async fn thoughts_for_task(&self, task_id: &TaskId) -> Result<Vec<Thought>, StoreError> {
        Ok(sorted_thoughts(self.read().thoughts.values().filter(|t| &t.task_id == task_id)))
    }

    async fn count_thoughts(&self, status: ThoughtStatus) -> Result<usize, StoreError> {
        Ok(self.read().thoughts.values().filter(|t| t.status == status).count())
    }

    async fn delete_thought(&self, id: &ThoughtId) -> Result<bool, StoreError> {
        Ok(self.write().thoughts.remove(id).is_some())
    }
}
