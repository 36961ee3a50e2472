//! In-crate test doubles shared by unit tests.

use crate::ports::action_executor::{ActionExecutor, DispatchAck, DispatchError};
use crate::ports::audit_sink::AuditSink;
use crate::ports::store::{StoreError, TaskStore, ThoughtStore};
use async_trait::async_trait;
use mindloop_domain::{
    ActionDecision, ActionType, AuditKind, AuditRecord, Task, TaskId, TaskStatus, Thought,
    ThoughtId, ThoughtStatus,
};
use std::collections::HashMap;
use std::sync::Mutex;

/// HashMap-backed task and thought store.
#[derive(Default)]
pub struct MemoryStore {
    tasks: Mutex<HashMap<TaskId, Task>>,
    thoughts: Mutex<HashMap<ThoughtId, Thought>>,
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn insert_task(&self, task: Task) -> Result<(), StoreError> {
        let mut tasks = self.tasks.lock().unwrap();
        if tasks.contains_key(&task.id) {
            return Err(StoreError::Conflict(task.id.to_string()));
        }
        tasks.insert(task.id.clone(), task);
        Ok(())
    }

    async fn get_task(&self, id: &TaskId) -> Result<Option<Task>, StoreError> {
        Ok(self.tasks.lock().unwrap().get(id).cloned())
    }

    async fn update_task(&self, task: &Task) -> Result<(), StoreError> {
        match self.tasks.lock().unwrap().get_mut(&task.id) {
            Some(slot) => {
                *slot = task.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(task.id.to_string())),
        }
    }

    async fn tasks_by_status(&self, status: TaskStatus) -> Result<Vec<Task>, StoreError> {
        let mut tasks: Vec<Task> = self
            .tasks
            .lock()
            .unwrap()
            .values()
            .filter(|t| t.status == status)
            .cloned()
            .collect();
        tasks.sort_by_key(|t| t.created_at);
        Ok(tasks)
    }

    async fn delete_task(&self, id: &TaskId) -> Result<bool, StoreError> {
        Ok(self.tasks.lock().unwrap().remove(id).is_some())
    }
}

#[async_trait]
impl ThoughtStore for MemoryStore {
    async fn insert_thought(&self, thought: Thought) -> Result<(), StoreError> {
        let mut thoughts = self.thoughts.lock().unwrap();
        if thoughts.contains_key(&thought.id) {
            return Err(StoreError::Conflict(thought.id.to_string()));
        }
        thoughts.insert(thought.id.clone(), thought);
        Ok(())
    }

    async fn get_thought(&self, id: &ThoughtId) -> Result<Option<Thought>, StoreError> {
        Ok(self.thoughts.lock().unwrap().get(id).cloned())
    }

    async fn update_thought(&self, thought: &Thought) -> Result<(), StoreError> {
        match self.thoughts.lock().unwrap().get_mut(&thought.id) {
            Some(slot) => {
                *slot = thought.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(thought.id.to_string())),
        }
    }

    async fn thoughts_by_status(&self, status: ThoughtStatus) -> Result<Vec<Thought>, StoreError> {
        let mut thoughts: Vec<Thought> = self
            .thoughts
            .lock()
            .unwrap()
            .values()
            .filter(|t| t.status == status)
            .cloned()
            .collect();
        thoughts.sort_by_key(|t| t.created_at);
        Ok(thoughts)
    }

    async fn thoughts_for_task(&self, task_id: &TaskId) -> Result<Vec<Thought>, StoreError> {
        let mut thoughts: Vec<Thought> = self
            .thoughts
            .lock()
            .unwrap()
            .values()
            .filter(|t| &t.task_id == task_id)
            .cloned()
            .collect();
        thoughts.sort_by_key(|t| t.created_at);
        Ok(thoughts)
    }

    async fn delete_thought(&self, id: &ThoughtId) -> Result<bool, StoreError> {
        Ok(self.thoughts.lock().unwrap().remove(id).is_some())
    }
}

/// Keeps every audit record.
#[derive(Default)]
pub struct RecordingAudit(pub Mutex<Vec<AuditRecord>>);

impl AuditSink for RecordingAudit {
    fn record(&self, record: AuditRecord) {
        self.0.lock().unwrap().push(record);
    }

    fn query(&self, kind: Option<AuditKind>) -> Vec<AuditRecord> {
        self.0
            .lock()
            .unwrap()
            .iter()
            .filter(|r| kind.is_none_or(|k| r.kind == k))
            .cloned()
            .collect()
    }
}

/// Acknowledges every dispatch and remembers what it saw.
#[derive(Default)]
pub struct RecordingExecutor(pub Mutex<Vec<(ThoughtId, ActionType)>>);

#[async_trait]
impl ActionExecutor for RecordingExecutor {
    async fn dispatch(&self, decision: &ActionDecision, thought: &Thought) -> Result<DispatchAck, DispatchError> {
        self.0
            .lock()
            .unwrap()
            .push((thought.id.clone(), decision.action_type()));
        Ok(DispatchAck::new(format!("{} done", decision.action_type())))
    }
}
