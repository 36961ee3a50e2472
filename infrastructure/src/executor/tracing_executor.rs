//! Executor that logs actions and keeps a process-local memory.
//!
//! Spoken content goes to the `mindloop::speech` tracing target; memory
//! actions operate on an in-process key-value map. Tool invocation is
//! rejected since no tools are registered.

use async_trait::async_trait;
use mindloop_application::{ActionExecutor, DispatchAck, DispatchError};
use mindloop_domain::{ActionDecision, ActionParams, Thought, preview};
use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};
use tracing::info;

#[derive(Default)]
pub struct TracingActionExecutor {
    memory: Mutex<BTreeMap<String, String>>,
    transcript: Mutex<Vec<String>>,
}

impl TracingActionExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything spoken so far, in order.
    pub fn transcript(&self) -> Vec<String> {
        self.transcript.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn remembered(&self, key: &str) -> Option<String> {
        self.memory
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }
}

#[async_trait]
impl ActionExecutor for TracingActionExecutor {
    async fn dispatch(&self, decision: &ActionDecision, thought: &Thought) -> Result<DispatchAck, DispatchError> {
        let summary = match &decision.params {
            ActionParams::Speak { content, channel } => {
                info!(
                    target: "mindloop::speech",
                    thought_id = %thought.id,
                    channel = channel.as_deref().unwrap_or("default"),
                    "{}",
                    content
                );
                self.transcript
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(content.clone());
                format!("said: {}", preview(content, 80))
            }
            ActionParams::InvokeTool { name, .. } => {
                return Err(DispatchError::Rejected(format!("no tool named '{}' is registered", name)));
            }
            ActionParams::Memorize { key, value } => {
                self.memory
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .insert(key.clone(), value.clone());
                format!("memorized '{}'", key)
            }
            ActionParams::Recall { query } => {
                let memory = self.memory.lock().unwrap_or_else(PoisonError::into_inner);
                let hits: Vec<String> = memory
                    .iter()
                    .filter(|(k, v)| k.contains(query.as_str()) || v.contains(query.as_str()))
                    .map(|(k, v)| format!("{} = {}", k, v))
                    .collect();
                if hits.is_empty() {
                    format!("nothing recalled for '{}'", query)
                } else {
                    format!("recalled: {}", hits.join("; "))
                }
            }
            ActionParams::Forget { key, .. } => {
                let existed = self
                    .memory
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .remove(key)
                    .is_some();
                if existed {
                    format!("forgot '{}'", key)
                } else {
                    format!("'{}' was not remembered", key)
                }
            }
            other => format!("{} acknowledged", other.action_type()),
        };

        info!(
            thought_id = %thought.id,
            task_id = %thought.task_id,
            action = %decision.action_type(),
            source = ?decision.source,
            "Action dispatched"
        );
        Ok(DispatchAck::new(summary))
    }
}
