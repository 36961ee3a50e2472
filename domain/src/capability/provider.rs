//! Capability provider metadata.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of service a provider offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityKind {
    Reasoning,
    Memory,
    Communication,
    Tool,
    WiseAuthority,
    Audit,
}

impl CapabilityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CapabilityKind::Reasoning => "reasoning",
            CapabilityKind::Memory => "memory",
            CapabilityKind::Communication => "communication",
            CapabilityKind::Tool => "tool",
            CapabilityKind::WiseAuthority => "wise_authority",
            CapabilityKind::Audit => "audit",
        }
    }
}

impl fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for CapabilityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "reasoning" | "llm" => Ok(CapabilityKind::Reasoning),
            "memory" => Ok(CapabilityKind::Memory),
            "communication" => Ok(CapabilityKind::Communication),
            "tool" => Ok(CapabilityKind::Tool),
            "wise_authority" => Ok(CapabilityKind::WiseAuthority),
            "audit" => Ok(CapabilityKind::Audit),
            _ => Err(format!("Invalid capability kind: {}", s)),
        }
    }
}

/// Rank of a provider within its priority group.
///
/// Declaration order is rank order: `Critical` sorts first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ProviderPriority {
    Critical,
    High,
    #[default]
    Normal,
    Low,
    Fallback,
}

impl ProviderPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderPriority::Critical => "critical",
            ProviderPriority::High => "high",
            ProviderPriority::Normal => "normal",
            ProviderPriority::Low => "low",
            ProviderPriority::Fallback => "fallback",
        }
    }
}

impl fmt::Display for ProviderPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ProviderPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "critical" => Ok(ProviderPriority::Critical),
            "high" => Ok(ProviderPriority::High),
            "normal" => Ok(ProviderPriority::Normal),
            "low" => Ok(ProviderPriority::Low),
            "fallback" => Ok(ProviderPriority::Fallback),
            _ => Err(format!("Invalid provider priority: {}", s)),
        }
    }
}

/// How providers inside one priority group are ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionStrategy {
    /// Stable order; the first usable provider leads every time
    #[default]
    FirstAvailable,
    /// The leading provider rotates on every resolve call
    RoundRobin,
}

/// A registered provider of one capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityProvider {
    pub name: String,
    pub kind: CapabilityKind,
    pub priority: ProviderPriority,
    /// Lower is preferred; groups are evaluated in ascending order
    pub group: u32,
    /// Only this handler may use the provider (None = any handler)
    pub handler: Option<String>,
    pub tags: Vec<String>,
}

impl CapabilityProvider {
    pub fn new(name: impl Into<String>, kind: CapabilityKind) -> Self {
        Self {
            name: name.into(),
            kind,
            priority: ProviderPriority::default(),
            group: 0,
            handler: None,
            tags: Vec::new(),
        }
    }

    pub fn with_priority(mut self, priority: ProviderPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_group(mut self, group: u32) -> Self {
        self.group = group;
        self
    }

    pub fn with_handler(mut self, handler: impl Into<String>) -> Self {
        self.handler = Some(handler.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Whether `handler` may use this provider.
    pub fn serves(&self, handler: Option<&str>) -> bool {
        match (&self.handler, handler) {
            (None, _) => true,
            (Some(own), Some(requested)) => own == requested,
            (Some(_), None) => false,
        }
    }
}
