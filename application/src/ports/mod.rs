//! Port definitions (interfaces for external collaborators)
//!
//! Ports define the boundaries between the core and the outside world.
//! Adapters live in the infrastructure and presentation layers.

pub mod action_executor;
pub mod audit_sink;
pub mod reasoning_backend;
pub mod round_observer;
pub mod store;
