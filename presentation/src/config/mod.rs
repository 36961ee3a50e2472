//! Presentation-level configuration

use mindloop_domain::OutputFormat;

/// How results and progress are shown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputConfig {
    pub format: OutputFormat,
    /// Enable colored terminal output
    pub color: bool,
    /// Show the per-round progress display
    pub progress: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            color: true,
            progress: true,
        }
    }
}

impl OutputConfig {
    /// Progress is hidden when the summary is JSON.
    pub fn show_progress(&self) -> bool {
        self.progress && self.format == OutputFormat::Text
    }
}
