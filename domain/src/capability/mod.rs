//! Capability domain
//!
//! Abstract service requests ("a reasoning backend") are resolved to
//! concrete providers. Providers are grouped and ranked:
//!
//! ```text
//! group 0  ──►  group 1  ──►  group 2 ...      (ascending, preferred first)
//!   │
//!   └─ within a group: first-available (stable) or round-robin (rotating)
//!      ordered by ProviderPriority, then registration order
//! ```
//!
//! Each provider carries a [`CircuitBreaker`]; providers whose breaker is
//! open are skipped.

pub mod circuit_breaker;
pub mod provider;

pub use circuit_breaker::{
    BreakerConfig, BreakerSnapshot, BreakerState, BreakerTransition, CircuitBreaker,
};
pub use provider::{CapabilityKind, CapabilityProvider, ProviderPriority, SelectionStrategy};
