//! Capability registry configuration (`[registry]` section)

use super::runtime::FileBreakerConfig;
use mindloop_domain::{CapabilityKind, ProviderPriority, SelectionStrategy};
use serde::{Deserialize, Serialize};

/// Backend implementations a provider can be bound to.
pub const KNOWN_BACKENDS: &[&str] = &["heuristic", "http"];

/// Settings for an OpenAI-compatible chat completions endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileHttpBackendConfig {
    pub base_url: String,
    pub model: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    pub timeout_secs: u64,
    pub temperature: f32,
}

impl Default for FileHttpBackendConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: String::new(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: 60,
            temperature: 0.2,
        }
    }
}

/// One `[[registry.providers]]` entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileProviderConfig {
    pub name: String,
    /// "heuristic" or "http"
    #[serde(default = "default_backend")]
    pub backend: String,
    #[serde(default = "default_kind")]
    pub kind: CapabilityKind,
    #[serde(default)]
    pub priority: ProviderPriority,
    #[serde(default)]
    pub group: u32,
    /// Restrict the provider to one handler (a module name or "action_selector")
    #[serde(default)]
    pub handler: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub http: FileHttpBackendConfig,
}

fn default_backend() -> String {
    "heuristic".to_string()
}

fn default_kind() -> CapabilityKind {
    CapabilityKind::Reasoning
}

impl FileProviderConfig {
    pub fn heuristic(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            backend: default_backend(),
            kind: default_kind(),
            priority: ProviderPriority::default(),
            group: 0,
            handler: None,
            tags: Vec::new(),
            http: FileHttpBackendConfig::default(),
        }
    }
}

/// One `[[registry.strategies]]` entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileStrategyConfig {
    #[serde(default = "default_kind")]
    pub kind: CapabilityKind,
    pub group: u32,
    pub strategy: SelectionStrategy,
}

/// Raw `[registry]` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRegistryConfig {
    /// Empty means a single built-in heuristic provider
    pub providers: Vec<FileProviderConfig>,
    pub strategies: Vec<FileStrategyConfig>,
    /// Per provider
    pub breaker: FileBreakerConfig,
}

impl FileRegistryConfig {
    /// Configured providers, or the built-in fallback.
    pub fn effective_providers(&self) -> Vec<FileProviderConfig> {
        if self.providers.is_empty() {
            vec![FileProviderConfig::heuristic("heuristic")]
        } else {
            self.providers.clone()
        }
    }
}
