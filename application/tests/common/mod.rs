//! Shared harness for the end-to-end tests: an in-memory store, a scripted
//! reasoning backend and a fully wired round loop.

#![allow(dead_code)]

use async_trait::async_trait;
use mindloop_application::{
    ActionExecutor, ActionSelector, AgentOrchestrator, AuditSink, BackendError, BootstrapStep,
    CapabilityRegistry, CommonSenseEvaluator, CommonSenseOptions, DecisionOrchestrator,
    DecisionParams, DispatchAck, DispatchError, EthicalEvaluator, EthicalOptions, JudgmentModule,
    LifecycleParams, NoRoundProgress, RoundObserver, ProcessingQueue, ProcessorServices, PromptContext,
    PromptPurpose, ReasoningBackend, ReasoningRouter, SchedulerParams, StoreError,
    StructuredInvoker, TaskLifecycleManager, TaskStore, ThoughtLifecycleManager, ThoughtPipeline,
    ThoughtStore, standard_processors,
};
use tokio::sync::mpsc;
use mindloop_domain::{
    ActionDecision, ActionType, AuditKind, AuditRecord, BreakerConfig, CapabilityKind,
    CapabilityProvider, JudgmentRole, ProfileCatalog, RoundResult, Task, TaskId, TaskStatus, Thought,
    ThoughtId, ThoughtStatus,
};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ==================== Store ====================

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
        let mut tasks = self.tasks.lock().unwrap();
        let slot = tasks
            .get_mut(&task.id)
            .ok_or_else(|| StoreError::NotFound(task.id.to_string()))?;
        *slot = task.clone();
        Ok(())
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
        let mut thoughts = self.thoughts.lock().unwrap();
        let slot = thoughts
            .get_mut(&thought.id)
            .ok_or_else(|| StoreError::NotFound(thought.id.to_string()))?;
        *slot = thought.clone();
        Ok(())
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

// ==================== Backend ====================

/// Answers judgment prompts favourably. Action selection speaks once when a
/// bootstrap step requires it and completes the task otherwise.
#[derive(Default)]
pub struct ScriptedBrain {
    pub hang_ethical: bool,
    pub ethical_calls: AtomicUsize,
    pub selections: AtomicUsize,
}

impl ScriptedBrain {
    pub fn hanging_ethical() -> Self {
        Self {
            hang_ethical: true,
            ..Default::default()
        }
    }

    fn select(metadata: &Value) -> Value {
        let spoke = metadata["prior_actions"]
            .as_array()
            .is_some_and(|actions| actions.iter().any(|a| a == "speak"));
        if metadata["requires_speak"] == true && !spoke {
            json!({
                "action": "speak",
                "parameters": {"content": "I am mindloop."},
                "rationale": "the step asks me to speak"
            })
        } else {
            json!({"action": "complete_task", "parameters": {"outcome": "done"}, "rationale": "finished"})
        }
    }
}

#[async_trait]
impl ReasoningBackend for ScriptedBrain {
    async fn invoke(&self, prompt: &PromptContext) -> Result<Value, BackendError> {
        match prompt.purpose {
            PromptPurpose::Judgment(JudgmentRole::Ethical) => {
                self.ethical_calls.fetch_add(1, Ordering::SeqCst);
                if self.hang_ethical {
                    std::future::pending::<()>().await;
                }
                Ok(json!({"decision": "aligned", "rationale": "harmless", "confidence": 0.9}))
            }
            PromptPurpose::Judgment(_) => {
                Ok(json!({"plausibility": 0.9, "rationale": "plausible", "confidence": 0.9}))
            }
            PromptPurpose::ActionSelection => {
                self.selections.fetch_add(1, Ordering::SeqCst);
                Ok(Self::select(&prompt.metadata))
            }
        }
    }
}

// ==================== Executor / Audit ====================

#[derive(Default)]
pub struct RecordingExecutor(pub Mutex<Vec<(ThoughtId, ActionType)>>);

impl RecordingExecutor {
    pub fn actions(&self) -> Vec<ActionType> {
        self.0.lock().unwrap().iter().map(|(_, a)| *a).collect()
    }
}

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

/// Forwards round boundaries to the test body.
pub struct RoundFeed {
    pub started: mpsc::UnboundedSender<u64>,
    pub completed: mpsc::UnboundedSender<RoundResult>,
}

impl RoundFeed {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<u64>, mpsc::UnboundedReceiver<RoundResult>) {
        let (started, started_rx) = mpsc::unbounded_channel();
        let (completed, completed_rx) = mpsc::unbounded_channel();
        (Arc::new(Self { started, completed }), started_rx, completed_rx)
    }
}

impl RoundObserver for RoundFeed {
    fn on_round_start(&self, round: u64, _state: mindloop_domain::AgentState) {
        let _ = self.started.send(round);
    }

    fn on_round_complete(&self, result: &RoundResult) {
        let _ = self.completed.send(result.clone());
    }
}

// ==================== Wiring ====================

pub fn invoker(backend: Arc<dyn ReasoningBackend>) -> (StructuredInvoker, Arc<CapabilityRegistry>) {
    let registry = Arc::new(CapabilityRegistry::new(BreakerConfig::default()));
    registry
        .register(CapabilityProvider::new("scripted", CapabilityKind::Reasoning))
        .unwrap();
    let router = ReasoningRouter::new(registry.clone()).with_backend("scripted", backend);
    (StructuredInvoker::new(Arc::new(router), 0), registry)
}

pub fn decision_orchestrator(
    invoker: &StructuredInvoker,
    params: DecisionParams,
    audit: Arc<dyn AuditSink>,
) -> DecisionOrchestrator {
    let modules = vec![
        JudgmentModule::Ethical(EthicalEvaluator::new("ethical", invoker.clone(), EthicalOptions::default())),
        JudgmentModule::CommonSense(CommonSenseEvaluator::new(
            "common_sense",
            invoker.clone(),
            CommonSenseOptions::default(),
        )),
    ];
    let selector = ActionSelector::new(invoker.clone(), Arc::new(ProfileCatalog::new()), Duration::from_secs(5));
    DecisionOrchestrator::new(modules, selector, params, audit)
}

/// Every layer of the round loop wired over in-memory adapters.
pub struct Harness {
    pub services: ProcessorServices,
    pub brain: Arc<ScriptedBrain>,
    pub audit: Arc<RecordingAudit>,
    pub executor: Arc<RecordingExecutor>,
}

impl Harness {
    pub fn new(scheduler: SchedulerParams, lifecycle: LifecycleParams) -> Self {
        Self::build(ScriptedBrain::default(), Arc::new(NoRoundProgress), scheduler, lifecycle)
    }

    pub fn build(
        brain: ScriptedBrain,
        observer: Arc<dyn RoundObserver>,
        scheduler: SchedulerParams,
        lifecycle: LifecycleParams,
    ) -> Self {
        let store = Arc::new(MemoryStore::default());
        let audit = Arc::new(RecordingAudit::default());
        let executor = Arc::new(RecordingExecutor::default());
        let brain = Arc::new(brain);
        let (invoker, registry) = invoker(brain.clone());
        let orchestrator = Arc::new(decision_orchestrator(&invoker, DecisionParams::default(), audit.clone()));

        let tasks = Arc::new(TaskLifecycleManager::new(store.clone(), scheduler.max_active_tasks));
        let thoughts = Arc::new(ThoughtLifecycleManager::new(
            store.clone(),
            store,
            lifecycle.max_thought_rounds,
        ));
        let pipeline = Arc::new(ThoughtPipeline::new(
            tasks.clone(),
            thoughts.clone(),
            orchestrator,
            executor.clone(),
            audit.clone(),
        ));
        let services = ProcessorServices {
            tasks,
            thoughts,
            pipeline,
            queue: Arc::new(ProcessingQueue::new(scheduler.queue_capacity)),
            registry,
            observer,
            audit: audit.clone(),
            scheduler,
            lifecycle,
        };
        Self {
            services,
            brain,
            audit,
            executor,
        }
    }

    pub fn agent(&self) -> AgentOrchestrator {
        let s = &self.services;
        AgentOrchestrator::new(
            standard_processors(s),
            s.tasks.clone(),
            s.thoughts.clone(),
            s.observer.clone(),
            s.audit.clone(),
            s.scheduler.clone(),
            s.lifecycle.bootstrap_steps.clone(),
        )
    }
}

pub fn steps(n: usize) -> Vec<BootstrapStep> {
    (0..n)
        .map(|i| BootstrapStep::new(format!("step_{}", i), format!("Affirm item {}", i), false))
        .collect()
}

/// Scheduler settings for fast, bounded test runs.
pub fn quick_scheduler() -> SchedulerParams {
    SchedulerParams::default()
        .with_round_interval(Duration::from_millis(1))
        .with_shutdown_deadline(Duration::from_secs(1))
}
