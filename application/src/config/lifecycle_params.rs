//! Task and thought lifecycle parameters.

use std::time::Duration;

/// One step of the ordered bootstrap sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapStep {
    pub name: String,
    /// Content of the step's seed thought
    pub prompt: String,
    /// The step must speak before it may complete
    pub requires_speak: bool,
}

impl BootstrapStep {
    pub fn new(name: impl Into<String>, prompt: impl Into<String>, requires_speak: bool) -> Self {
        Self {
            name: name.into(),
            prompt: prompt.into(),
            requires_speak,
        }
    }

    /// The built-in identity / integrity / capability-affirmation sequence.
    pub fn default_sequence() -> Vec<BootstrapStep> {
        vec![
            BootstrapStep::new(
                "verify_identity",
                "State who you are and what you are here to do.",
                true,
            ),
            BootstrapStep::new(
                "validate_integrity",
                "Confirm that your stores and configuration are intact.",
                false,
            ),
            BootstrapStep::new(
                "evaluate_resilience",
                "Confirm that your reasoning providers and fallbacks are reachable.",
                false,
            ),
            BootstrapStep::new(
                "accept_incompleteness",
                "Acknowledge that your knowledge is incomplete and that you may defer.",
                false,
            ),
            BootstrapStep::new(
                "express_gratitude",
                "Express gratitude to the people you work with.",
                true,
            ),
        ]
    }
}

/// Controls thought depth, retention and the bootstrap sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct LifecycleParams {
    /// Maximum follow-up depth of a thought chain
    pub max_thought_rounds: u32,
    /// Terminal tasks older than this are archived by garbage collection
    pub task_retention: Duration,
    /// Terminal thoughts older than this are archived by garbage collection
    pub thought_retention: Duration,
    pub bootstrap_steps: Vec<BootstrapStep>,
}

impl Default for LifecycleParams {
    fn default() -> Self {
        Self {
            max_thought_rounds: 7,
            task_retention: Duration::from_secs(24 * 60 * 60),
            thought_retention: Duration::from_secs(60 * 60),
            bootstrap_steps: BootstrapStep::default_sequence(),
        }
    }
}

impl LifecycleParams {
    // ==================== Builder Methods ====================

    pub fn with_max_thought_rounds(mut self, max: u32) -> Self {
        self.max_thought_rounds = max;
        self
    }

    pub fn with_task_retention(mut self, retention: Duration) -> Self {
        self.task_retention = retention;
        self
    }

    pub fn with_thought_retention(mut self, retention: Duration) -> Self {
        self.thought_retention = retention;
        self
    }

    pub fn with_bootstrap_steps(mut self, steps: Vec<BootstrapStep>) -> Self {
        self.bootstrap_steps = steps;
        self
    }
}
