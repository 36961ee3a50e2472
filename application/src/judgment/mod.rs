//! Judgment modules.
//!
//! The set of roles is closed, so modules are a tagged enum rather than
//! open-ended plugins. Every variant implements [`Evaluate`]:
//!
//! | Variant | Options | Verdict payload |
//! |---------|---------|-----------------|
//! | [`JudgmentModule::Ethical`] | [`EthicalOptions`] | decision + flags |
//! | [`JudgmentModule::CommonSense`] | [`CommonSenseOptions`] | plausibility + flags |
//! | [`JudgmentModule::Domain`] | [`DomainOptions`] | alignment + recommendation |
//!
//! Modules are stateless between calls and only borrow the thought and its
//! context.

pub mod common_sense;
pub mod domain;
pub mod ethical;

pub use common_sense::{CommonSenseEvaluator, CommonSenseOptions};
pub use domain::{DomainEvaluator, DomainOptions};
pub use ethical::{EthicalEvaluator, EthicalOptions};

use crate::reasoning::InvocationError;
use async_trait::async_trait;
use mindloop_domain::{JudgmentRole, Thought, ThoughtContext, Verdict};
use std::time::Duration;
use thiserror::Error;

/// Why a judgment module could not produce a verdict
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvaluationError {
    #[error(transparent)]
    Invocation(#[from] InvocationError),

    #[error("Evaluation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Circuit breaker open for module '{0}'")]
    CircuitOpen(String),
}

/// Shared contract of every judgment module.
#[async_trait]
pub trait Evaluate: Send + Sync {
    /// Unique module name; also the handler used to resolve providers
    fn name(&self) -> &str;

    fn role(&self) -> JudgmentRole;

    async fn evaluate(&self, thought: &Thought, ctx: &ThoughtContext) -> Result<Verdict, EvaluationError>;
}

/// A configured judgment module.
pub enum JudgmentModule {
    Ethical(EthicalEvaluator),
    CommonSense(CommonSenseEvaluator),
    Domain(DomainEvaluator),
}

impl JudgmentModule {
    fn inner(&self) -> &dyn Evaluate {
        match self {
            JudgmentModule::Ethical(m) => m,
            JudgmentModule::CommonSense(m) => m,
            JudgmentModule::Domain(m) => m,
        }
    }
}

#[async_trait]
impl Evaluate for JudgmentModule {
    fn name(&self) -> &str {
        self.inner().name()
    }

    fn role(&self) -> JudgmentRole {
        self.inner().role()
    }

    async fn evaluate(&self, thought: &Thought, ctx: &ThoughtContext) -> Result<Verdict, EvaluationError> {
        self.inner().evaluate(thought, ctx).await
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::capability::CapabilityRegistry;
    use crate::ports::reasoning_backend::{BackendError, PromptContext, ReasoningBackend};
    use crate::reasoning::{ReasoningRouter, StructuredInvoker};
    use async_trait::async_trait;
    use mindloop_domain::{CapabilityKind, CapabilityProvider};
    use serde_json::Value;
    use std::sync::{Arc, Mutex};

    /// Always answers with the same JSON and keeps the prompts it saw.
    pub struct Echo {
        pub answer: Value,
        pub seen: Mutex<Vec<PromptContext>>,
    }

    #[async_trait]
    impl ReasoningBackend for Echo {
        async fn invoke(&self, prompt: &PromptContext) -> Result<Value, BackendError> {
            self.seen.lock().unwrap().push(prompt.clone());
            Ok(self.answer.clone())
        }
    }

    pub fn invoker_answering(answer: Value) -> (StructuredInvoker, Arc<Echo>) {
        let registry = Arc::new(CapabilityRegistry::default());
        registry
            .register(CapabilityProvider::new("echo", CapabilityKind::Reasoning))
            .unwrap();
        let backend = Arc::new(Echo {
            answer,
            seen: Mutex::new(Vec::new()),
        });
        let router = ReasoningRouter::new(registry).with_backend("echo", backend.clone());
        (StructuredInvoker::new(Arc::new(router), 0), backend)
    }
}
