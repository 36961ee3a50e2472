//! Assembles a runnable agent from a [`FileConfig`].
//!
//! Builds the capability registry and its backends, the judgment modules,
//! the decision orchestrator, both lifecycle managers and the round loop,
//! all over the in-memory adapters of this crate.

use crate::audit::{InMemoryAuditSink, JsonlAuditSink};
use crate::config::{ConfigValidationError, FileConfig, FileProviderConfig, domain_module_name};
use crate::executor::TracingActionExecutor;
use crate::reasoning::HeuristicBackend;
use crate::store::InMemoryStore;
use mindloop_application::{
    ActionSelector, AdminControl, AgentOrchestrator, AuditSink, BackendError, CapabilityRegistry,
    CommonSenseEvaluator, CommonSenseOptions, CompositeAuditSink, CoreConfig,
    DecisionOrchestrator, DomainEvaluator, DomainOptions, EthicalEvaluator, EthicalOptions,
    GuardrailChain, JudgmentModule, LifecycleError, ProcessingQueue, ProcessorServices,
    ReasoningBackend, ReasoningRouter, RoundObserver, RunSummary, StructuredInvoker,
    TaskLifecycleManager, ThoughtLifecycleManager, ThoughtPipeline, standard_processors,
};
use mindloop_domain::{CapabilityProvider, DomainError, Priority, Task};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Why a runtime could not be assembled
#[derive(Error, Debug)]
pub enum WiringError {
    #[error("invalid configuration: {}", .0.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))]
    InvalidConfig(Vec<ConfigValidationError>),

    #[error(transparent)]
    Registry(#[from] DomainError),

    #[error("provider '{provider}': {source}")]
    Backend {
        provider: String,
        #[source]
        source: BackendError,
    },

    #[error("provider '{0}' needs the http-backend feature")]
    FeatureDisabled(String),
}

/// A wired agent, ready to run.
pub struct AgentRuntime {
    agent: AgentOrchestrator,
    control: AdminControl,
    tasks: Arc<TaskLifecycleManager>,
    registry: Arc<CapabilityRegistry>,
    decisions: Arc<DecisionOrchestrator>,
    audit_log: Option<Arc<InMemoryAuditSink>>,
    executor: Arc<TracingActionExecutor>,
}

impl AgentRuntime {
    /// Handle for pausing, stepping and stopping the loop.
    pub fn control(&self) -> AdminControl {
        self.control.clone()
    }

    pub fn registry(&self) -> &Arc<CapabilityRegistry> {
        &self.registry
    }

    pub fn decisions(&self) -> &Arc<DecisionOrchestrator> {
        &self.decisions
    }

    /// The queryable in-memory audit log, when enabled.
    pub fn audit_log(&self) -> Option<&Arc<InMemoryAuditSink>> {
        self.audit_log.as_ref()
    }

    pub fn executor(&self) -> &Arc<TracingActionExecutor> {
        &self.executor
    }

    /// Queue a requester task before (or while) the loop runs.
    pub async fn submit_task(
        &self,
        description: impl Into<String>,
        priority: Priority,
    ) -> Result<Task, LifecycleError> {
        self.tasks
            .create_task(Task::new(description).with_priority(priority))
            .await
    }

    /// Run the loop to completion.
    pub async fn run(self) -> RunSummary {
        self.agent.run().await
    }
}

/// Build a runtime from validated configuration.
///
/// Fatal validation issues abort; the rest are logged as warnings.
pub fn build_runtime(
    config: &FileConfig,
    observer: Arc<dyn RoundObserver>,
) -> Result<AgentRuntime, WiringError> {
    let (fatal, warnings): (Vec<_>, Vec<_>) = config.validate().into_iter().partition(|i| i.is_fatal());
    for warning in &warnings {
        warn!("Config: {}", warning);
    }
    if !fatal.is_empty() {
        return Err(WiringError::InvalidConfig(fatal));
    }

    let core = config.to_core_config();
    let (audit, audit_log) = build_audit(config);
    let registry = Arc::new(CapabilityRegistry::new(config.registry.breaker.to_breaker_config()));
    let router = build_router(config, registry.clone())?;
    let invoker = StructuredInvoker::new(Arc::new(router), core.decision.validation_retries);

    let decisions = Arc::new(build_decisions(config, &core, &invoker, audit.clone()));
    let store = Arc::new(InMemoryStore::new());
    let executor = Arc::new(TracingActionExecutor::new());

    let tasks = Arc::new(TaskLifecycleManager::new(store.clone(), core.scheduler.max_active_tasks));
    let thoughts = Arc::new(ThoughtLifecycleManager::new(
        store.clone(),
        store,
        core.lifecycle.max_thought_rounds,
    ));
    let pipeline = Arc::new(ThoughtPipeline::new(
        tasks.clone(),
        thoughts.clone(),
        decisions.clone(),
        executor.clone(),
        audit.clone(),
    ));
    let services = ProcessorServices {
        tasks: tasks.clone(),
        thoughts,
        pipeline,
        queue: Arc::new(ProcessingQueue::new(core.scheduler.queue_capacity)),
        registry: registry.clone(),
        observer,
        audit,
        scheduler: core.scheduler.clone(),
        lifecycle: core.lifecycle.clone(),
    };

    let agent = AgentOrchestrator::new(
        standard_processors(&services),
        services.tasks.clone(),
        services.thoughts.clone(),
        services.observer.clone(),
        services.audit.clone(),
        core.scheduler.clone(),
        core.lifecycle.bootstrap_steps.clone(),
    );
    info!(
        modules = ?decisions.module_names(),
        providers = registry.health().len(),
        "Agent runtime assembled"
    );

    Ok(AgentRuntime {
        control: agent.control(),
        agent,
        tasks,
        registry,
        decisions,
        audit_log,
        executor,
    })
}

fn build_audit(config: &FileConfig) -> (Arc<dyn AuditSink>, Option<Arc<InMemoryAuditSink>>) {
    let mut sinks: Vec<Arc<dyn AuditSink>> = Vec::new();

    let memory = (config.audit.memory_capacity > 0)
        .then(|| Arc::new(InMemoryAuditSink::new(config.audit.memory_capacity)));
    if let Some(memory) = &memory {
        sinks.push(memory.clone());
    }
    if let Some(path) = &config.audit.jsonl_path {
        match JsonlAuditSink::new(path) {
            Some(sink) => {
                info!(path = %path.display(), "Writing audit records");
                sinks.push(Arc::new(sink));
            }
            None => warn!(path = %path.display(), "Audit file unavailable; continuing without it"),
        }
    }
    (Arc::new(CompositeAuditSink::new(sinks)), memory)
}

fn build_router(config: &FileConfig, registry: Arc<CapabilityRegistry>) -> Result<ReasoningRouter, WiringError> {
    let mut router = ReasoningRouter::new(registry.clone());
    for provider in config.registry.effective_providers() {
        let backend = build_backend(&provider)?;
        let mut entry = CapabilityProvider::new(&provider.name, provider.kind)
            .with_priority(provider.priority)
            .with_group(provider.group);
        if let Some(handler) = &provider.handler {
            entry = entry.with_handler(handler);
        }
        for tag in &provider.tags {
            entry = entry.with_tag(tag);
        }
        registry.register(entry)?;
        router = router.with_backend(&provider.name, backend);
    }
    for strategy in &config.registry.strategies {
        registry.set_strategy(strategy.kind, strategy.group, strategy.strategy);
    }
    Ok(router)
}

fn build_backend(provider: &FileProviderConfig) -> Result<Arc<dyn ReasoningBackend>, WiringError> {
    match provider.backend.as_str() {
        "http" => http_backend(provider),
        _ => Ok(Arc::new(HeuristicBackend::new())),
    }
}

#[cfg(feature = "http-backend")]
fn http_backend(provider: &FileProviderConfig) -> Result<Arc<dyn ReasoningBackend>, WiringError> {
    let http = &provider.http;
    let api_key = std::env::var(&http.api_key_env).ok();
    if api_key.is_none() {
        warn!(provider = %provider.name, env = %http.api_key_env, "API key not set; sending unauthenticated requests");
    }
    let backend = crate::reasoning::HttpReasoningBackend::new(
        &http.base_url,
        &http.model,
        api_key,
        std::time::Duration::from_secs(http.timeout_secs),
    )
    .map_err(|source| WiringError::Backend {
        provider: provider.name.clone(),
        source,
    })?
    .with_temperature(http.temperature);
    Ok(Arc::new(backend))
}

#[cfg(not(feature = "http-backend"))]
fn http_backend(provider: &FileProviderConfig) -> Result<Arc<dyn ReasoningBackend>, WiringError> {
    Err(WiringError::FeatureDisabled(provider.name.clone()))
}

fn build_decisions(
    config: &FileConfig,
    core: &CoreConfig,
    invoker: &StructuredInvoker,
    audit: Arc<dyn AuditSink>,
) -> DecisionOrchestrator {
    let judgment = &config.judgment;
    let mut modules = Vec::new();

    if judgment.ethical {
        let mut options = EthicalOptions::default();
        if let Some(principles) = &judgment.principles {
            options.principles = principles.clone();
        }
        modules.push(JudgmentModule::Ethical(EthicalEvaluator::new("ethical", invoker.clone(), options)));
    }
    if judgment.common_sense {
        let mut options = CommonSenseOptions::default();
        if let Some(checks) = &judgment.checks {
            options.checks = checks.clone();
        }
        modules.push(JudgmentModule::CommonSense(CommonSenseEvaluator::new(
            "common_sense",
            invoker.clone(),
            options,
        )));
    }
    for domain in &judgment.domains {
        modules.push(JudgmentModule::Domain(DomainEvaluator::new(
            domain_module_name(&domain.name),
            invoker.clone(),
            DomainOptions::new(&domain.name).with_knowledge(domain.knowledge.clone()),
        )));
    }

    let selector = ActionSelector::new(
        invoker.clone(),
        Arc::new(config.to_profile_catalog()),
        core.decision.selection_timeout,
    );
    DecisionOrchestrator::new(modules, selector, core.decision.clone(), audit)
        .with_guardrails(GuardrailChain::from_params(&core.guardrails))
}
