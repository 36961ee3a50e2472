//! Mode processors
//!
//! One processor per operating mode. The round loop asks the processor
//! registered for the current [`AgentState`] to run exactly one round:
//!
//! | Mode            | Activation                  | Thoughts admitted | Extra                     |
//! |-----------------|-----------------------------|-------------------|---------------------------|
//! | bootstrap       | bootstrap steps, in order   | bootstrap chains  | blocking or non-blocking  |
//! | normal-work     | priority order, batch limit | all               | monitoring when idle      |
//! | exploratory     | arrival order               | all (speculative) | monitoring when idle      |
//! | low-activity    | priority >= threshold       | priority >= threshold | garbage collection    |
//! | idle-reflection | priority >= threshold       | priority >= threshold | pulses, pattern analysis, GC |

mod batch;
mod bootstrap;
mod reflection;
mod work;

pub use bootstrap::BootstrapProcessor;
pub use reflection::ReflectionActivities;
pub use work::{WorkMode, WorkProcessor};

use crate::capability::CapabilityRegistry;
use crate::config::{LifecycleParams, SchedulerParams};
use crate::lifecycle::{ProcessingQueue, TaskLifecycleManager, ThoughtLifecycleManager};
use crate::ports::audit_sink::AuditSink;
use crate::ports::round_observer::RoundObserver;
use crate::use_cases::process_thought::ThoughtPipeline;
use async_trait::async_trait;
use mindloop_domain::{AgentState, RoundResult};
use std::sync::Arc;

/// Runs one round of work for the modes it serves.
#[async_trait]
pub trait ModeProcessor: Send + Sync {
    fn name(&self) -> &'static str;

    fn can_run(&self, state: AgentState) -> bool;

    /// Never fails: per-thought problems are recorded in the result.
    async fn run_round(&self, round: u64) -> RoundResult;
}

/// Everything a processor needs, shared by all of them.
#[derive(Clone)]
pub struct ProcessorServices {
    pub tasks: Arc<TaskLifecycleManager>,
    pub thoughts: Arc<ThoughtLifecycleManager>,
    pub pipeline: Arc<ThoughtPipeline>,
    pub queue: Arc<ProcessingQueue>,
    pub registry: Arc<CapabilityRegistry>,
    pub observer: Arc<dyn RoundObserver>,
    pub audit: Arc<dyn AuditSink>,
    pub scheduler: SchedulerParams,
    pub lifecycle: LifecycleParams,
}

/// The standard processor set, one per operating mode.
pub fn standard_processors(services: &ProcessorServices) -> Vec<Arc<dyn ModeProcessor>> {
    vec![
        Arc::new(BootstrapProcessor::new(services.clone())),
        Arc::new(WorkProcessor::new(WorkMode::Normal, services.clone())),
        Arc::new(WorkProcessor::new(WorkMode::Exploratory, services.clone())),
        Arc::new(WorkProcessor::new(WorkMode::LowActivity, services.clone())),
        Arc::new(WorkProcessor::new(WorkMode::IdleReflection, services.clone())),
    ]
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::config::DecisionParams;
    use crate::decision::{ActionSelector, DecisionOrchestrator};
    use crate::judgment::test_support::invoker_answering;
    use crate::ports::round_observer::NoRoundProgress;
    use crate::test_support::{MemoryStore, RecordingAudit, RecordingExecutor};
    use mindloop_domain::{BreakerConfig, ProfileCatalog};
    use serde_json::Value;
    use std::time::Duration;

    pub struct Fixture {
        pub services: ProcessorServices,
        pub store: Arc<MemoryStore>,
        pub audit: Arc<RecordingAudit>,
        pub executor: Arc<RecordingExecutor>,
    }

    /// Services over an in-memory store whose selector always answers
    /// `answer`.
    pub fn fixture(answer: Value, scheduler: SchedulerParams, lifecycle: LifecycleParams) -> Fixture {
        let store = Arc::new(MemoryStore::default());
        let audit = Arc::new(RecordingAudit::default());
        let executor = Arc::new(RecordingExecutor::default());
        let (invoker, _) = invoker_answering(answer);
        let selector = ActionSelector::new(invoker, Arc::new(ProfileCatalog::new()), Duration::from_secs(5));
        let orchestrator = Arc::new(DecisionOrchestrator::new(
            Vec::new(),
            selector,
            DecisionParams::default(),
            audit.clone(),
        ));
        let tasks = Arc::new(TaskLifecycleManager::new(store.clone(), scheduler.max_active_tasks));
        let thoughts = Arc::new(ThoughtLifecycleManager::new(
            store.clone(),
            store.clone(),
            lifecycle.max_thought_rounds,
        ));
        let pipeline = Arc::new(ThoughtPipeline::new(
            tasks.clone(),
            thoughts.clone(),
            orchestrator,
            executor.clone(),
            audit.clone(),
        ));
        Fixture {
            services: ProcessorServices {
                tasks,
                thoughts,
                pipeline,
                queue: Arc::new(ProcessingQueue::new(scheduler.queue_capacity)),
                registry: Arc::new(CapabilityRegistry::new(BreakerConfig::default())),
                observer: Arc::new(NoRoundProgress),
                audit: audit.clone(),
                scheduler,
                lifecycle,
            },
            store,
            audit,
            executor,
        }
    }
}
