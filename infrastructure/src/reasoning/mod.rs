//! Reasoning backends
//!
//! | Backend | Feature | Use |
//! |---------|---------|-----|
//! | [`HeuristicBackend`] | always | offline rule-based answers |
//! | `HttpReasoningBackend` | `http-backend` | OpenAI-compatible chat completions |

mod heuristic;
#[cfg(feature = "http-backend")]
mod http;

pub use heuristic::HeuristicBackend;
#[cfg(feature = "http-backend")]
pub use http::HttpReasoningBackend;
