//! Output, audit and log-file configuration (`[output]`, `[audit]`,
//! `[logging]` sections)

use mindloop_domain::OutputFormat;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Re-exported for callers that only deal with raw config
pub use mindloop_domain::OutputFormat as FileOutputFormat;

/// Raw `[output]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOutputConfig {
    pub format: OutputFormat,
    /// Enable colored terminal output
    pub color: bool,
    /// Show the per-round progress display
    pub progress: bool,
}

impl Default for FileOutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            color: true,
            progress: true,
        }
    }
}

/// Raw `[audit]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileAuditConfig {
    /// Append audit records to this JSONL file
    pub jsonl_path: Option<PathBuf>,
    /// Records kept in memory for inspection (0 disables)
    pub memory_capacity: usize,
}

impl Default for FileAuditConfig {
    fn default() -> Self {
        Self {
            jsonl_path: None,
            memory_capacity: 1000,
        }
    }
}

/// Raw `[logging]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// Write daily-rolling log files here in addition to stderr
    pub directory: Option<PathBuf>,
    pub file_prefix: String,
}

impl Default for FileLoggingConfig {
    fn default() -> Self {
        Self {
            directory: None,
            file_prefix: "mindloop.log".to_string(),
        }
    }
}
