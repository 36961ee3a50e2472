//! Prompt templates for judgment modules and action selection.
//!
//! Templates are plain data so deployments can override them through
//! configuration; the defaults here only fix the response shape.

pub mod judgment;
pub mod selection;

pub use judgment::JudgmentTemplate;
pub use selection::SelectionTemplate;
