//! Core domain concepts shared across all subdomains.
//!
//! - [`error::DomainError`] — domain-level errors
//! - [`ids`] — identifiers for tasks and thoughts
//! - [`string::preview`] — log-safe content previews

pub mod error;
pub mod ids;
pub mod string;

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn current_timestamp() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};

    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
