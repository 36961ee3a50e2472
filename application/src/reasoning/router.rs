//! Reasoning router: registry resolution plus ordered fallback.

use crate::capability::CapabilityRegistry;
use crate::ports::reasoning_backend::{BackendError, PromptContext, ReasoningBackend};
use mindloop_domain::{CapabilityKind, DomainError};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors from routing a reasoning call
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RouteError {
    #[error(transparent)]
    Resolve(#[from] DomainError),

    /// Every resolved provider failed with a provider-health error
    #[error("All {attempted} reasoning provider(s) failed; last error: {last}")]
    Exhausted { attempted: usize, last: BackendError },

    /// A provider answered, but not with usable output
    #[error(transparent)]
    Backend(BackendError),
}

/// Routes prompts to reasoning backends chosen by the registry.
///
/// Providers are tried in resolution order. `Unavailable` and `Timeout`
/// count against the provider's breaker and fall through to the next one;
/// `MalformedOutput` is returned to the caller at once.
pub struct ReasoningRouter {
    registry: Arc<CapabilityRegistry>,
    backends: HashMap<String, Arc<dyn ReasoningBackend>>,
}

impl ReasoningRouter {
    pub fn new(registry: Arc<CapabilityRegistry>) -> Self {
        Self {
            registry,
            backends: HashMap::new(),
        }
    }

    /// Attach the backend implementation for a registered provider name.
    pub fn with_backend(mut self, provider: impl Into<String>, backend: Arc<dyn ReasoningBackend>) -> Self {
        self.backends.insert(provider.into(), backend);
        self
    }

    pub fn registry(&self) -> &Arc<CapabilityRegistry> {
        &self.registry
    }

    /// Invoke the best available provider for `handler`.
    pub async fn invoke(&self, handler: &str, prompt: &PromptContext) -> Result<Value, RouteError> {
        let providers = self
            .registry
            .resolve(CapabilityKind::Reasoning, Some(handler))?;

        let mut attempted = 0;
        let mut last = None;
        for provider in providers {
            let Some(backend) = self.backends.get(&provider.name) else {
                warn!(provider = %provider.name, "Provider has no backend attached, skipping");
                continue;
            };

            attempted += 1;
            debug!(provider = %provider.name, handler, purpose = prompt.purpose.as_str(), "Invoking reasoning provider");
            match backend.invoke(prompt).await {
                Ok(value) => {
                    self.registry.record_success(&provider.name);
                    return Ok(value);
                }
                Err(e) if e.counts_against_provider() => {
                    warn!(provider = %provider.name, error = %e, "Reasoning provider failed, falling back");
                    self.registry.record_failure(&provider.name);
                    last = Some(e);
                }
                Err(e) => return Err(RouteError::Backend(e)),
            }
        }

        match last {
            Some(last) => Err(RouteError::Exhausted { attempted, last }),
            None => Err(RouteError::Resolve(DomainError::NoAvailableProvider(
                CapabilityKind::Reasoning,
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::reasoning_backend::PromptPurpose;
    use async_trait::async_trait;
    use mindloop_domain::{BreakerState, CapabilityProvider};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Fixed {
        result: Result<Value, BackendError>,
        calls: AtomicUsize,
    }

    impl Fixed {
        fn new(result: Result<Value, BackendError>) -> Arc<Self> {
            Arc::new(Self {
                result,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl ReasoningBackend for Fixed {
        async fn invoke(&self, _prompt: &PromptContext) -> Result<Value, BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone()
        }
    }

    fn prompt() -> PromptContext {
        PromptContext::new(PromptPurpose::ActionSelection, "sys", "user")
    }

    fn registry_with(names: &[(&str, u32)]) -> Arc<CapabilityRegistry> {
        let registry = Arc::new(CapabilityRegistry::default());
        for (name, group) in names {
            registry
                .register(CapabilityProvider::new(*name, CapabilityKind::Reasoning).with_group(*group))
                .unwrap();
        }
        registry
    }

    #[tokio::test]
    async fn test_falls_back_on_unavailable() {
        let registry = registry_with(&[("primary", 0), ("backup", 1)]);
        let primary = Fixed::new(Err(BackendError::Unavailable("down".into())));
        let backup = Fixed::new(Ok(json!({"ok": true})));
        let router = ReasoningRouter::new(registry.clone())
            .with_backend("primary", primary.clone())
            .with_backend("backup", backup.clone());

        let value = router.invoke("ethical", &prompt()).await.unwrap();
        assert_eq!(value, json!({"ok": true}));
        assert_eq!(primary.calls.load(Ordering::SeqCst), 1);
        assert_eq!(registry.health()[0].breaker.consecutive_failures, 1);
    }

    #[tokio::test]
    async fn test_malformed_output_returns_immediately() {
        let registry = registry_with(&[("primary", 0), ("backup", 1)]);
        let backup = Fixed::new(Ok(json!({})));
        let router = ReasoningRouter::new(registry)
            .with_backend("primary", Fixed::new(Err(BackendError::MalformedOutput("prose".into()))))
            .with_backend("backup", backup.clone());

        let err = router.invoke("ethical", &prompt()).await.unwrap_err();
        assert!(matches!(err, RouteError::Backend(BackendError::MalformedOutput(_))));
        assert_eq!(backup.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_repeated_failures_open_breaker_then_no_provider() {
        let registry = registry_with(&[("only", 0)]);
        let router = ReasoningRouter::new(registry.clone())
            .with_backend("only", Fixed::new(Err(BackendError::Unavailable("down".into()))));

        for _ in 0..3 {
            assert!(matches!(
                router.invoke("ethical", &prompt()).await,
                Err(RouteError::Exhausted { attempted: 1, .. })
            ));
        }
        assert_eq!(registry.health()[0].breaker.state, BreakerState::Open);
        assert!(matches!(
            router.invoke("ethical", &prompt()).await,
            Err(RouteError::Resolve(DomainError::NoAvailableProvider(_)))
        ));
    }

    #[tokio::test]
    async fn test_provider_without_backend_is_skipped() {
        let registry = registry_with(&[("ghost", 0)]);
        let router = ReasoningRouter::new(registry);
        assert!(matches!(
            router.invoke("ethical", &prompt()).await,
            Err(RouteError::Resolve(DomainError::NoAvailableProvider(_)))
        ));
    }
}
