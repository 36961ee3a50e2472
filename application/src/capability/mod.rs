//! Capability resolution.
//!
//! [`CapabilityRegistry`] owns every provider and its circuit breaker. It is
//! created once at startup and injected wherever providers are resolved;
//! there is no process-wide instance.

pub mod registry;

pub use registry::{CapabilityRegistry, ProviderHealth};
