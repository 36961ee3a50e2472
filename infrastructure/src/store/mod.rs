//! Task and thought storage
//!
//! Implementations of the application's [`TaskStore`] and [`ThoughtStore`]
//! ports.
//!
//! [`TaskStore`]: mindloop_application::TaskStore
//! [`ThoughtStore`]: mindloop_application::ThoughtStore

mod memory;

pub use memory::InMemoryStore;
