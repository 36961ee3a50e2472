//! CoreConfig — container for all application parameter groups.
//!
//! The infrastructure layer converts its file configuration into this type;
//! the binary hands it to the wiring code.

use super::{DecisionParams, GuardrailParams, LifecycleParams, SchedulerParams};

/// All parameters the core needs at construction time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoreConfig {
    pub decision: DecisionParams,
    pub scheduler: SchedulerParams,
    pub lifecycle: LifecycleParams,
    pub guardrails: GuardrailParams,
}

impl CoreConfig {
    pub fn with_decision(mut self, decision: DecisionParams) -> Self {
        self.decision = decision;
        self
    }

    pub fn with_scheduler(mut self, scheduler: SchedulerParams) -> Self {
        self.scheduler = scheduler;
        self
    }

    pub fn with_lifecycle(mut self, lifecycle: LifecycleParams) -> Self {
        self.lifecycle = lifecycle;
        self
    }

    pub fn with_guardrails(mut self, guardrails: GuardrailParams) -> Self {
        self.guardrails = guardrails;
        self
    }
}
