//! Infrastructure layer for mindloop
//!
//! Adapters for the ports defined in the application layer: configuration
//! file loading, the in-memory store, audit sinks, reasoning backends and
//! the action executor. [`wiring`] assembles them into a runnable agent.

pub mod audit;
pub mod config;
pub mod executor;
pub mod reasoning;
pub mod store;
pub mod wiring;

// Re-export commonly used types
pub use audit::{InMemoryAuditSink, JsonlAuditSink};
pub use config::{
    ConfigLoader, ConfigValidationError, FileConfig, FileLoggingConfig, FileOutputConfig,
    FileOutputFormat,
};
pub use executor::TracingActionExecutor;
pub use reasoning::HeuristicBackend;
#[cfg(feature = "http-backend")]
pub use reasoning::HttpReasoningBackend;
pub use store::InMemoryStore;
pub use wiring::{AgentRuntime, WiringError, build_runtime};
