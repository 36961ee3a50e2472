//! Agent operating mode.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Operating mode of the agent.
///
/// The machine starts in [`AgentState::Bootstrap`] and ends in
/// [`AgentState::Shutdown`], which is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum AgentState {
    Shutdown,
    /// Running the ordered identity/integrity sequence
    #[default]
    Bootstrap,
    NormalWork,
    /// Normal work with relaxed ordering and speculative prompts
    Exploratory,
    /// Sustained idle: only high-priority tasks are admitted
    LowActivity,
    /// Deeper idle: reflection pulses plus critical-only admission
    IdleReflection,
}

impl AgentState {
    pub const ALL: [AgentState; 6] = [
        AgentState::Shutdown,
        AgentState::Bootstrap,
        AgentState::NormalWork,
        AgentState::Exploratory,
        AgentState::LowActivity,
        AgentState::IdleReflection,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentState::Shutdown => "shutdown",
            AgentState::Bootstrap => "bootstrap",
            AgentState::NormalWork => "normal-work",
            AgentState::Exploratory => "exploratory",
            AgentState::LowActivity => "low-activity",
            AgentState::IdleReflection => "idle-reflection",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            AgentState::Shutdown => "Shutdown",
            AgentState::Bootstrap => "Bootstrap",
            AgentState::NormalWork => "Normal Work",
            AgentState::Exploratory => "Exploratory",
            AgentState::LowActivity => "Low Activity",
            AgentState::IdleReflection => "Idle Reflection",
        }
    }

    pub fn is_terminal(&self) -> bool {
        *self == AgentState::Shutdown
    }

    /// Modes in which the agent is considered idle.
    pub fn is_idle(&self) -> bool {
        matches!(self, AgentState::LowActivity | AgentState::IdleReflection)
    }
}

impl fmt::Display for AgentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AgentState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "shutdown" => Ok(AgentState::Shutdown),
            "bootstrap" | "wakeup" => Ok(AgentState::Bootstrap),
            "normal-work" | "normal" | "work" => Ok(AgentState::NormalWork),
            "exploratory" | "play" => Ok(AgentState::Exploratory),
            "low-activity" | "low" => Ok(AgentState::LowActivity),
            "idle-reflection" | "idle" | "dream" => Ok(AgentState::IdleReflection),
            _ => Err(format!("Invalid agent state: {}", s)),
        }
    }
}
