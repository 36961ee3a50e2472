//! Application layer for mindloop
//!
//! This crate contains the decision pipeline, the scheduler, the lifecycle
//! managers, port definitions and application configuration. It depends
//! only on the domain layer.

pub mod capability;
pub mod config;
pub mod decision;
pub mod judgment;
pub mod lifecycle;
pub mod ports;
pub mod reasoning;
pub mod use_cases;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use capability::{CapabilityRegistry, ProviderHealth};
pub use config::{
    BootstrapStep, CoreConfig, DecisionParams, GuardrailKind, GuardrailParams, LifecycleParams,
    SchedulerParams,
};
pub use decision::{ActionSelector, DecisionOrchestrator, GuardrailChain};
pub use judgment::{
    CommonSenseEvaluator, CommonSenseOptions, DomainEvaluator, DomainOptions, EthicalEvaluator,
    EthicalOptions, Evaluate, EvaluationError, JudgmentModule,
};
pub use lifecycle::{
    LifecycleError, ProcessingQueue, TaskCounts, TaskLifecycleManager, ThoughtLifecycleManager,
};
pub use ports::{
    action_executor::{ActionExecutor, DispatchAck, DispatchError},
    audit_sink::{AuditSink, CompositeAuditSink, NoAuditSink},
    reasoning_backend::{BackendError, PromptContext, PromptPurpose, ReasoningBackend},
    round_observer::{NoRoundProgress, RoundObserver},
    store::{StoreError, TaskStore, ThoughtStore},
};
pub use reasoning::{InvocationError, ReasoningRouter, StructuredInvoker};
pub use use_cases::process_thought::{PipelineError, ThoughtOutcome, ThoughtPipeline};
pub use use_cases::processors::{
    BootstrapProcessor, ModeProcessor, ProcessorServices, WorkMode, WorkProcessor,
    standard_processors,
};
pub use use_cases::run_agent_loop::{AdminControl, AgentOrchestrator, ControlError, RunSummary};
