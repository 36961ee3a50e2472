//! Structured invocation: call the router, validate the JSON, and retry with
//! the validation error fed back to the backend.

use super::router::{ReasoningRouter, RouteError};
use crate::ports::reasoning_backend::{BackendError, PromptContext};
use mindloop_domain::JudgmentTemplate;
use serde_json::Value;
use std::fmt::Display;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Errors from a structured reasoning call
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvocationError {
    #[error("Reasoning backend unavailable: {0}")]
    Unavailable(String),

    #[error("Malformed output after {attempts} attempt(s): {last}")]
    Malformed { attempts: u32, last: String },
}

/// Calls the router and validates answers with a parser.
#[derive(Clone)]
pub struct StructuredInvoker {
    router: Arc<ReasoningRouter>,
    validation_retries: u32,
}

impl StructuredInvoker {
    pub fn new(router: Arc<ReasoningRouter>, validation_retries: u32) -> Self {
        Self {
            router,
            validation_retries,
        }
    }

    /// Invoke for `handler` and parse the answer.
    ///
    /// Malformed output (from the backend or from `parse`) is retried up to
    /// `validation_retries` more times, each retry carrying the previous
    /// error as a correction. Routing failures end the call immediately.
    pub async fn invoke<T, E, F>(
        &self,
        handler: &str,
        mut prompt: PromptContext,
        parse: F,
    ) -> Result<T, InvocationError>
    where
        E: Display,
        F: Fn(&Value) -> Result<T, E>,
    {
        let attempts = self.validation_retries + 1;
        let mut last = String::new();

        for attempt in 1..=attempts {
            let error = match self.router.invoke(handler, &prompt).await {
                Ok(value) => match parse(&value) {
                    Ok(parsed) => return Ok(parsed),
                    Err(e) => e.to_string(),
                },
                Err(RouteError::Backend(BackendError::MalformedOutput(detail))) => detail,
                Err(e) => return Err(InvocationError::Unavailable(e.to_string())),
            };

            debug!(handler, attempt, error = %error, "Structured output rejected");
            prompt.push_correction(JudgmentTemplate::correction(&error));
            last = error;
        }

        Err(InvocationError::Malformed { attempts, last })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::CapabilityRegistry;
    use crate::ports::reasoning_backend::{PromptPurpose, ReasoningBackend};
    use async_trait::async_trait;
    use mindloop_domain::{CapabilityKind, CapabilityProvider};
    use serde_json::json;
    use std::sync::Mutex;

    /// Returns scripted answers in order and records the prompts it saw.
    struct Scripted {
        answers: Mutex<Vec<Result<Value, BackendError>>>,
        seen: Mutex<Vec<PromptContext>>,
    }

    #[async_trait]
    impl ReasoningBackend for Scripted {
        async fn invoke(&self, prompt: &PromptContext) -> Result<Value, BackendError> {
            self.seen.lock().unwrap().push(prompt.clone());
            self.answers.lock().unwrap().remove(0)
        }
    }

    fn invoker(answers: Vec<Result<Value, BackendError>>) -> (StructuredInvoker, Arc<Scripted>) {
        let registry = Arc::new(CapabilityRegistry::default());
        registry
            .register(CapabilityProvider::new("p", CapabilityKind::Reasoning))
            .unwrap();
        let backend = Arc::new(Scripted {
            answers: Mutex::new(answers),
            seen: Mutex::new(Vec::new()),
        });
        let router = ReasoningRouter::new(registry).with_backend("p", backend.clone());
        (StructuredInvoker::new(Arc::new(router), 2), backend)
    }

    fn parse_n(value: &Value) -> Result<i64, String> {
        value["n"].as_i64().ok_or_else(|| "missing field 'n'".to_string())
    }

    #[tokio::test]
    async fn test_retries_with_correction_until_valid() {
        let (invoker, backend) = invoker(vec![
            Ok(json!({"x": 1})),
            Err(BackendError::MalformedOutput("not json".into())),
            Ok(json!({"n": 4})),
        ]);
        let prompt = PromptContext::new(PromptPurpose::ActionSelection, "s", "u");

        assert_eq!(invoker.invoke("h", prompt, parse_n).await, Ok(4));

        let seen = backend.seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert!(seen[0].corrections.is_empty());
        assert!(seen[1].corrections[0].contains("missing field 'n'"));
        assert!(seen[2].corrections[1].contains("not json"));
    }

    #[tokio::test]
    async fn test_gives_up_after_validation_retries() {
        let (invoker, _) = invoker(vec![Ok(json!({})), Ok(json!({})), Ok(json!({}))]);
        let prompt = PromptContext::new(PromptPurpose::ActionSelection, "s", "u");

        let err = invoker.invoke("h", prompt, parse_n).await.unwrap_err();
        assert_eq!(
            err,
            InvocationError::Malformed {
                attempts: 3,
                last: "missing field 'n'".into()
            }
        );
    }

    #[tokio::test]
    async fn test_unavailable_is_not_retried() {
        let (invoker, backend) = invoker(vec![Err(BackendError::Unavailable("down".into()))]);
        let prompt = PromptContext::new(PromptPurpose::ActionSelection, "s", "u");

        let err = invoker.invoke("h", prompt, parse_n).await.unwrap_err();
        assert!(matches!(err, InvocationError::Unavailable(_)));
        assert_eq!(backend.seen.lock().unwrap().len(), 1);
    }
}
