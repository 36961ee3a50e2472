//! Use cases
//!
//! Application-level operations that drive the domain: the per-thought
//! pipeline, the per-mode round processors and the round loop.

pub mod process_thought;
pub mod processors;
pub mod run_agent_loop;
