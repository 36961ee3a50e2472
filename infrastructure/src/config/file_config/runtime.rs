//! Core runtime sections: `[decision]`, `[scheduler]`, `[lifecycle]` and
//! `[guardrails]`.

use mindloop_application::{
    BootstrapStep, DecisionParams, GuardrailKind, GuardrailParams, LifecycleParams,
    SchedulerParams,
};
use mindloop_domain::{BreakerConfig, IdleThresholds, Priority};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Breaker settings shared by `[decision.breaker]` and `[registry.breaker]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileBreakerConfig {
    pub failure_threshold: u32,
    pub window_secs: u64,
    pub cooldown_secs: u64,
}

impl Default for FileBreakerConfig {
    fn default() -> Self {
        let defaults = BreakerConfig::default();
        Self {
            failure_threshold: defaults.failure_threshold,
            window_secs: defaults.window.as_secs(),
            cooldown_secs: defaults.cooldown.as_secs(),
        }
    }
}

impl FileBreakerConfig {
    pub fn to_breaker_config(&self) -> BreakerConfig {
        BreakerConfig::default()
            .with_failure_threshold(self.failure_threshold)
            .with_window(Duration::from_secs(self.window_secs))
            .with_cooldown(Duration::from_secs(self.cooldown_secs))
    }
}

/// Raw `[decision]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileDecisionConfig {
    pub module_timeout_secs: u64,
    pub max_attempts: u32,
    pub retry_backoff_ms: u64,
    pub fanout_deadline_secs: u64,
    pub validation_retries: u32,
    pub selection_timeout_secs: u64,
    /// Per judgment module
    pub breaker: FileBreakerConfig,
}

impl Default for FileDecisionConfig {
    fn default() -> Self {
        let defaults = DecisionParams::default();
        Self {
            module_timeout_secs: defaults.module_timeout.as_secs(),
            max_attempts: defaults.max_attempts,
            retry_backoff_ms: defaults.retry_backoff.as_millis() as u64,
            fanout_deadline_secs: defaults.fanout_deadline.as_secs(),
            validation_retries: defaults.validation_retries,
            selection_timeout_secs: defaults.selection_timeout.as_secs(),
            breaker: FileBreakerConfig::default(),
        }
    }
}

impl FileDecisionConfig {
    pub fn to_params(&self) -> DecisionParams {
        DecisionParams::default()
            .with_module_timeout(Duration::from_secs(self.module_timeout_secs))
            .with_max_attempts(self.max_attempts)
            .with_retry_backoff(Duration::from_millis(self.retry_backoff_ms))
            .with_fanout_deadline(Duration::from_secs(self.fanout_deadline_secs))
            .with_module_breaker(self.breaker.to_breaker_config())
            .with_validation_retries(self.validation_retries)
            .with_selection_timeout(Duration::from_secs(self.selection_timeout_secs))
    }
}

/// Raw `[scheduler]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSchedulerConfig {
    pub max_active_tasks: usize,
    pub activation_batch: usize,
    pub queue_capacity: usize,
    pub batch_concurrency: usize,
    pub thought_timeout_secs: u64,
    /// Minimum priority admitted while activity is low (0-10)
    pub high_priority_threshold: u8,
    pub low_activity_after: u32,
    pub idle_reflection_after: u32,
    pub reflection_interval_rounds: u64,
    pub round_interval_ms: u64,
    pub bootstrap_blocking: bool,
    pub bootstrap_step_timeout_secs: u64,
    pub skip_bootstrap: bool,
    pub shutdown_deadline_secs: u64,
    pub max_rounds: Option<u64>,
}

impl Default for FileSchedulerConfig {
    fn default() -> Self {
        let defaults = SchedulerParams::default();
        Self {
            max_active_tasks: defaults.max_active_tasks,
            activation_batch: defaults.activation_batch,
            queue_capacity: defaults.queue_capacity,
            batch_concurrency: defaults.batch_concurrency,
            thought_timeout_secs: defaults.thought_timeout.as_secs(),
            high_priority_threshold: defaults.high_priority_threshold.value(),
            low_activity_after: defaults.idle.low_activity_after,
            idle_reflection_after: defaults.idle.idle_reflection_after,
            reflection_interval_rounds: defaults.reflection_interval_rounds,
            round_interval_ms: defaults.round_interval.as_millis() as u64,
            bootstrap_blocking: defaults.bootstrap_blocking,
            bootstrap_step_timeout_secs: defaults.bootstrap_step_timeout.as_secs(),
            skip_bootstrap: defaults.skip_bootstrap,
            shutdown_deadline_secs: defaults.shutdown_deadline.as_secs(),
            max_rounds: defaults.max_rounds,
        }
    }
}

impl FileSchedulerConfig {
    pub fn to_params(&self) -> SchedulerParams {
        SchedulerParams::default()
            .with_max_active_tasks(self.max_active_tasks)
            .with_activation_batch(self.activation_batch)
            .with_queue_capacity(self.queue_capacity)
            .with_batch_concurrency(self.batch_concurrency)
            .with_thought_timeout(Duration::from_secs(self.thought_timeout_secs))
            .with_high_priority_threshold(Priority::saturating(self.high_priority_threshold))
            .with_idle_thresholds(IdleThresholds {
                low_activity_after: self.low_activity_after,
                idle_reflection_after: self.idle_reflection_after,
            })
            .with_reflection_interval_rounds(self.reflection_interval_rounds)
            .with_round_interval(Duration::from_millis(self.round_interval_ms))
            .with_bootstrap_blocking(self.bootstrap_blocking)
            .with_bootstrap_step_timeout(Duration::from_secs(self.bootstrap_step_timeout_secs))
            .with_skip_bootstrap(self.skip_bootstrap)
            .with_shutdown_deadline(Duration::from_secs(self.shutdown_deadline_secs))
            .with_max_rounds(self.max_rounds)
    }
}

/// One `[[lifecycle.bootstrap_steps]]` entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileBootstrapStep {
    pub name: String,
    pub prompt: String,
    #[serde(default)]
    pub requires_speak: bool,
}

/// Raw `[lifecycle]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLifecycleConfig {
    pub max_thought_rounds: u32,
    pub task_retention_secs: u64,
    pub thought_retention_secs: u64,
    /// Replaces the built-in sequence when set
    pub bootstrap_steps: Option<Vec<FileBootstrapStep>>,
}

impl Default for FileLifecycleConfig {
    fn default() -> Self {
        let defaults = LifecycleParams::default();
        Self {
            max_thought_rounds: defaults.max_thought_rounds,
            task_retention_secs: defaults.task_retention.as_secs(),
            thought_retention_secs: defaults.thought_retention.as_secs(),
            bootstrap_steps: None,
        }
    }
}

impl FileLifecycleConfig {
    pub fn to_params(&self) -> LifecycleParams {
        let params = LifecycleParams::default()
            .with_max_thought_rounds(self.max_thought_rounds)
            .with_task_retention(Duration::from_secs(self.task_retention_secs))
            .with_thought_retention(Duration::from_secs(self.thought_retention_secs));
        match &self.bootstrap_steps {
            Some(steps) => params.with_bootstrap_steps(
                steps
                    .iter()
                    .map(|s| BootstrapStep::new(&s.name, &s.prompt, s.requires_speak))
                    .collect(),
            ),
            None => params,
        }
    }
}

/// Raw `[guardrails]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileGuardrailsConfig {
    pub enabled: bool,
    /// Guardrail names in order: ethical_flag, content_policy, confidence, rationale
    pub chain: Vec<String>,
    pub severe_flags: Vec<String>,
    pub min_confidence: f64,
    pub blocked_terms: Vec<String>,
}

impl Default for FileGuardrailsConfig {
    fn default() -> Self {
        let defaults = GuardrailParams::default();
        Self {
            enabled: defaults.enabled,
            chain: defaults.chain.iter().map(|k| k.as_str().to_string()).collect(),
            severe_flags: defaults.severe_flags,
            min_confidence: defaults.min_confidence,
            blocked_terms: defaults.blocked_terms,
        }
    }
}

impl FileGuardrailsConfig {
    /// Parse the chain; unknown names come back in the second element.
    pub fn parse_chain(&self) -> (Vec<GuardrailKind>, Vec<String>) {
        let mut kinds = Vec::new();
        let mut unknown = Vec::new();
        for name in &self.chain {
            match name.parse::<GuardrailKind>() {
                Ok(kind) => kinds.push(kind),
                Err(_) => unknown.push(name.clone()),
            }
        }
        (kinds, unknown)
    }

    pub fn to_params(&self) -> GuardrailParams {
        let params = GuardrailParams::default()
            .with_chain(self.parse_chain().0)
            .with_severe_flags(self.severe_flags.clone())
            .with_min_confidence(self.min_confidence)
            .with_blocked_terms(self.blocked_terms.clone());
        GuardrailParams {
            enabled: self.enabled,
            ..params
        }
    }
}
