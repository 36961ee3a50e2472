//! Audit sinks
//!
//! - [`JsonlAuditSink`]: append-only JSON Lines file
//! - [`InMemoryAuditSink`]: bounded, queryable ring of recent records

mod jsonl;
mod memory;

pub use jsonl::JsonlAuditSink;
pub use memory::InMemoryAuditSink;
