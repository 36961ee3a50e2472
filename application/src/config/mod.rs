//! Application-level configuration.
//!
//! Parameter groups that control how the core behaves:
//!
//! - [`DecisionParams`] — judgment fan-out timeouts, retries and breakers
//! - [`SchedulerParams`] — round loop, queue and mode admission
//! - [`LifecycleParams`] — thought round limit, retention, bootstrap steps
//! - [`GuardrailParams`] — post-decision review
//! - [`CoreConfig`] — container for all of the above

pub mod core_config;
pub mod decision_params;
pub mod guardrail_params;
pub mod lifecycle_params;
pub mod scheduler_params;

pub use core_config::CoreConfig;
pub use decision_params::DecisionParams;
pub use guardrail_params::{GuardrailKind, GuardrailParams};
pub use lifecycle_params::{BootstrapStep, LifecycleParams};
pub use scheduler_params::SchedulerParams;
