//! Raw TOML configuration data types
//!
//! These structs mirror the config file one-to-one. They are deserialized
//! directly and converted into application parameters afterwards.

mod judgment;
mod output;
mod profiles;
mod registry;
mod runtime;

pub use judgment::{FileDomainModule, FileJudgmentConfig, domain_module_name};
pub use output::{FileAuditConfig, FileLoggingConfig, FileOutputConfig, FileOutputFormat};
pub use profiles::{FileProfileConfig, to_profile_catalog};
pub use registry::{
    FileHttpBackendConfig, FileProviderConfig, FileRegistryConfig, FileStrategyConfig,
    KNOWN_BACKENDS,
};
pub use runtime::{
    FileBootstrapStep, FileBreakerConfig, FileDecisionConfig, FileGuardrailsConfig,
    FileLifecycleConfig, FileSchedulerConfig,
};

use mindloop_application::{CoreConfig, decision::SELECTOR_HANDLER};
use mindloop_domain::ProfileCatalog;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Problems detected in a loaded configuration
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigValidationError {
    #[error("{0} cannot be 0")]
    ZeroTimeout(String),

    #[error("{0} must be at least 1")]
    ZeroCapacity(String),

    #[error("{field} = {value} is out of range ({range})")]
    OutOfRange {
        field: String,
        value: String,
        range: &'static str,
    },

    #[error(
        "scheduler.thought_timeout_secs ({thought}) is shorter than the decision budget ({required}s: fanout deadline plus two selection timeouts)"
    )]
    ThoughtTimeoutTooShort { thought: u64, required: u64 },

    #[error("scheduler.low_activity_after ({low}) exceeds scheduler.idle_reflection_after ({idle})")]
    IdleThresholdOrder { low: u32, idle: u32 },

    #[error("provider name cannot be empty")]
    EmptyProviderName,

    #[error("provider '{0}' is registered more than once")]
    DuplicateProvider(String),

    #[error("provider '{provider}' uses unknown backend '{backend}'")]
    UnknownBackend { provider: String, backend: String },

    #[error("provider '{0}' uses the http backend but has no model")]
    MissingHttpSettings(String),

    #[error("provider '{provider}' is bound to unknown handler '{handler}'")]
    UnknownHandler { provider: String, handler: String },

    #[error("judgment domain '{0}' is configured more than once")]
    DuplicateDomain(String),

    #[error("profile '{0}' permits no actions")]
    EmptyProfile(String),

    #[error("profile '{profile}' names unknown action '{action}'")]
    UnknownAction { profile: String, action: String },

    #[error("unknown guardrail '{0}' is ignored")]
    UnknownGuardrail(String),
}

impl ConfigValidationError {
    /// Fatal issues stop startup; the rest are logged as warnings.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            ConfigValidationError::UnknownGuardrail(_) | ConfigValidationError::UnknownHandler { .. }
        )
    }
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Judgment fan-out and selection
    pub decision: FileDecisionConfig,
    /// Round loop
    pub scheduler: FileSchedulerConfig,
    /// Thought round limit, retention, bootstrap sequence
    pub lifecycle: FileLifecycleConfig,
    pub guardrails: FileGuardrailsConfig,
    /// Which judgment modules run
    pub judgment: FileJudgmentConfig,
    /// Capability providers and selection strategies
    pub registry: FileRegistryConfig,
    /// Action profiles beyond the built-in `default`
    pub profiles: Vec<FileProfileConfig>,
    pub audit: FileAuditConfig,
    pub logging: FileLoggingConfig,
    pub output: FileOutputConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning every detected issue.
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut issues = Vec::new();
        self.validate_runtime(&mut issues);
        self.validate_registry(&mut issues);

        let mut domains = HashSet::new();
        for domain in &self.judgment.domains {
            if !domains.insert(domain.name.as_str()) {
                issues.push(ConfigValidationError::DuplicateDomain(domain.name.clone()));
            }
        }

        for profile in &self.profiles {
            if profile.permitted.is_empty() {
                issues.push(ConfigValidationError::EmptyProfile(profile.name.clone()));
            }
            issues.extend(profile.parse_permitted().1.into_iter().map(|action| {
                ConfigValidationError::UnknownAction {
                    profile: profile.name.clone(),
                    action,
                }
            }));
        }

        issues.extend(
            self.guardrails
                .parse_chain()
                .1
                .into_iter()
                .map(ConfigValidationError::UnknownGuardrail),
        );
        issues
    }

    fn validate_runtime(&self, issues: &mut Vec<ConfigValidationError>) {
        let d = &self.decision;
        let s = &self.scheduler;
        let zero_timeouts = [
            ("decision.module_timeout_secs", d.module_timeout_secs),
            ("decision.fanout_deadline_secs", d.fanout_deadline_secs),
            ("decision.selection_timeout_secs", d.selection_timeout_secs),
            ("scheduler.thought_timeout_secs", s.thought_timeout_secs),
            ("scheduler.bootstrap_step_timeout_secs", s.bootstrap_step_timeout_secs),
        ];
        issues.extend(
            zero_timeouts
                .into_iter()
                .filter(|(_, v)| *v == 0)
                .map(|(field, _)| ConfigValidationError::ZeroTimeout(field.to_string())),
        );

        let zero_capacities = [
            ("decision.max_attempts", d.max_attempts as usize),
            ("decision.breaker.failure_threshold", d.breaker.failure_threshold as usize),
            ("registry.breaker.failure_threshold", self.registry.breaker.failure_threshold as usize),
            ("scheduler.max_active_tasks", s.max_active_tasks),
            ("scheduler.activation_batch", s.activation_batch),
            ("scheduler.queue_capacity", s.queue_capacity),
            ("scheduler.batch_concurrency", s.batch_concurrency),
        ];
        issues.extend(
            zero_capacities
                .into_iter()
                .filter(|(_, v)| *v == 0)
                .map(|(field, _)| ConfigValidationError::ZeroCapacity(field.to_string())),
        );

        let required = self.decision.to_params().decision_budget().as_secs();
        if s.thought_timeout_secs > 0 && s.thought_timeout_secs < required {
            issues.push(ConfigValidationError::ThoughtTimeoutTooShort {
                thought: s.thought_timeout_secs,
                required,
            });
        }

        if s.high_priority_threshold > 10 {
            issues.push(ConfigValidationError::OutOfRange {
                field: "scheduler.high_priority_threshold".to_string(),
                value: s.high_priority_threshold.to_string(),
                range: "0-10",
            });
        }
        if s.low_activity_after > s.idle_reflection_after {
            issues.push(ConfigValidationError::IdleThresholdOrder {
                low: s.low_activity_after,
                idle: s.idle_reflection_after,
            });
        }
        if !(0.0..=1.0).contains(&self.guardrails.min_confidence) {
            issues.push(ConfigValidationError::OutOfRange {
                field: "guardrails.min_confidence".to_string(),
                value: self.guardrails.min_confidence.to_string(),
                range: "0.0-1.0",
            });
        }
    }

    fn validate_registry(&self, issues: &mut Vec<ConfigValidationError>) {
        let mut handlers: HashSet<String> = self.judgment.module_names().into_iter().collect();
        handlers.insert(SELECTOR_HANDLER.to_string());

        let mut seen = HashSet::new();
        for provider in &self.registry.providers {
            if provider.name.trim().is_empty() {
                issues.push(ConfigValidationError::EmptyProviderName);
                continue;
            }
            if !seen.insert(provider.name.as_str()) {
                issues.push(ConfigValidationError::DuplicateProvider(provider.name.clone()));
            }
            if !KNOWN_BACKENDS.contains(&provider.backend.as_str()) {
                issues.push(ConfigValidationError::UnknownBackend {
                    provider: provider.name.clone(),
                    backend: provider.backend.clone(),
                });
            } else if provider.backend == "http" && provider.http.model.trim().is_empty() {
                issues.push(ConfigValidationError::MissingHttpSettings(provider.name.clone()));
            }
            if let Some(handler) = &provider.handler
                && !handlers.contains(handler)
            {
                issues.push(ConfigValidationError::UnknownHandler {
                    provider: provider.name.clone(),
                    handler: handler.clone(),
                });
            }
        }
    }

    /// Convert the runtime sections into application parameters.
    pub fn to_core_config(&self) -> CoreConfig {
        CoreConfig::default()
            .with_decision(self.decision.to_params())
            .with_scheduler(self.scheduler.to_params())
            .with_lifecycle(self.lifecycle.to_params())
            .with_guardrails(self.guardrails.to_params())
    }

    pub fn to_profile_catalog(&self) -> ProfileCatalog {
        to_profile_catalog(&self.profiles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mindloop_domain::{ActionType, OutputFormat, ProviderPriority, SelectionStrategy};
    use std::time::Duration;

    #[test]
    fn test_default_config_is_valid() {
        let config = FileConfig::default();
        assert!(config.validate().is_empty());
        assert_eq!(config.to_core_config(), CoreConfig::default());
    }

    #[test]
    fn test_thought_timeout_must_cover_decision_budget() {
        let mut config = FileConfig::default();
        config.decision.fanout_deadline_secs = 60;
        config.decision.selection_timeout_secs = 20;
        config.scheduler.thought_timeout_secs = 90;

        let issues = config.validate();
        assert_eq!(
            issues,
            vec![ConfigValidationError::ThoughtTimeoutTooShort {
                thought: 90,
                required: 100
            }]
        );
        assert!(issues[0].is_fatal());

        config.scheduler.thought_timeout_secs = 100;
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_parse_full_document() {
        let config: FileConfig = toml::from_str(
            r#"
[decision]
module_timeout_secs = 10
max_attempts = 2

[scheduler]
max_active_tasks = 4
round_interval_ms = 250
max_rounds = 20

[judgment]
common_sense = false

[[judgment.domains]]
name = "medicine"
knowledge = ["Triage comes first."]

[[registry.providers]]
name = "primary"
backend = "http"
priority = "high"
group = 0
http = { model = "gpt-4o-mini" }

[[registry.providers]]
name = "local"
priority = "fallback"
group = 1
handler = "domain:medicine"

[[registry.strategies]]
group = 0
strategy = "round_robin"

[[profiles]]
name = "quiet"
permitted = ["observe", "defer", "complete_task"]

[output]
format = "json"
"#,
        )
        .unwrap();

        assert!(config.validate().is_empty(), "{:?}", config.validate());
        let core = config.to_core_config();
        assert_eq!(core.decision.module_timeout, Duration::from_secs(10));
        assert_eq!(core.decision.max_attempts, 2);
        assert_eq!(core.scheduler.max_active_tasks, 4);
        assert_eq!(core.scheduler.round_interval, Duration::from_millis(250));
        assert_eq!(core.scheduler.max_rounds, Some(20));

        assert_eq!(
            config.judgment.module_names(),
            vec!["ethical".to_string(), "domain:medicine".to_string()]
        );
        assert_eq!(config.registry.providers[0].priority, ProviderPriority::High);
        assert_eq!(config.registry.providers[1].backend, "heuristic");
        assert_eq!(config.registry.strategies[0].strategy, SelectionStrategy::RoundRobin);
        assert!(config.to_profile_catalog().check("quiet", ActionType::Speak).is_err());
        assert_eq!(config.output.format, OutputFormat::Json);
    }

    #[test]
    fn test_validate_collects_every_issue() {
        let config: FileConfig = toml::from_str(
            r#"
[decision]
module_timeout_secs = 0

[scheduler]
queue_capacity = 0
low_activity_after = 20
idle_reflection_after = 10

[guardrails]
chain = ["ethical_flag", "vibes"]

[[registry.providers]]
name = "a"
backend = "carrier-pigeon"

[[registry.providers]]
name = "a"
backend = "http"

[[registry.providers]]
name = "b"
handler = "astrology"

[[profiles]]
name = "odd"
permitted = ["teleport"]
"#,
        )
        .unwrap();

        let issues = config.validate();
        assert!(issues.contains(&ConfigValidationError::ZeroTimeout(
            "decision.module_timeout_secs".into()
        )));
        assert!(issues.contains(&ConfigValidationError::ZeroCapacity(
            "scheduler.queue_capacity".into()
        )));
        assert!(issues.contains(&ConfigValidationError::IdleThresholdOrder { low: 20, idle: 10 }));
        assert!(issues.contains(&ConfigValidationError::UnknownGuardrail("vibes".into())));
        assert!(issues.contains(&ConfigValidationError::UnknownBackend {
            provider: "a".into(),
            backend: "carrier-pigeon".into()
        }));
        assert!(issues.contains(&ConfigValidationError::DuplicateProvider("a".into())));
        assert!(issues.contains(&ConfigValidationError::MissingHttpSettings("a".into())));
        assert!(issues.contains(&ConfigValidationError::UnknownAction {
            profile: "odd".into(),
            action: "teleport".into()
        }));

        let warnings: Vec<_> = issues.iter().filter(|i| !i.is_fatal()).collect();
        assert_eq!(warnings.len(), 2);
    }
}
