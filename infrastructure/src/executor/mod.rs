//! Action executors

mod tracing_executor;

pub use tracing_executor::TracingActionExecutor;
