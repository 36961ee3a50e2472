//! Reasoning calls: provider routing with fallback, and structured-output
//! validation with corrective retries.

pub mod invoker;
pub mod router;

pub use invoker::{InvocationError, StructuredInvoker};
pub use router::{ReasoningRouter, RouteError};
