//! Configuration file loading for mindloop
//!
//! Sources are merged in this order (later wins):
//!
//! 1. Built-in defaults
//! 2. Global: `$XDG_CONFIG_HOME/mindloop/config.toml`
//! 3. Project root: `./mindloop.toml` or `./.mindloop.toml`
//! 4. `--config <path>`
//! 5. `MINDLOOP_*` environment variables (`__` separates sections)

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, FileAuditConfig, FileBootstrapStep, FileBreakerConfig, FileConfig,
    FileDecisionConfig, FileDomainModule, FileGuardrailsConfig, FileHttpBackendConfig,
    FileJudgmentConfig, FileLifecycleConfig, FileLoggingConfig, FileOutputConfig,
    FileOutputFormat, FileProfileConfig, FileProviderConfig, FileRegistryConfig,
    FileSchedulerConfig, FileStrategyConfig, KNOWN_BACKENDS, domain_module_name,
};
pub use loader::ConfigLoader;
