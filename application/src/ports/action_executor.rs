//! Action executor port
//!
//! Receives every dispatched decision. Retry semantics beyond a single
//! dispatch are the executor's own business.

use async_trait::async_trait;
use mindloop_domain::{ActionDecision, Thought};
use thiserror::Error;

/// Errors from dispatching an action
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DispatchError {
    #[error("Dispatch rejected: {0}")]
    Rejected(String),

    #[error("Dispatch failed: {0}")]
    Failed(String),
}

/// Acknowledgement of a dispatched action.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchAck {
    /// Human-readable result, carried into follow-up thoughts
    pub summary: String,
}

impl DispatchAck {
    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
        }
    }
}

/// Port for the collaborator that actually performs actions.
#[async_trait]
pub trait ActionExecutor: Send + Sync {
    async fn dispatch(
        &self,
        decision: &ActionDecision,
        thought: &Thought,
    ) -> Result<DispatchAck, DispatchError>;
}
