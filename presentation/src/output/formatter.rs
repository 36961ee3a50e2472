//! Output formatter trait

use mindloop_application::RunSummary;

/// Trait for formatting run summaries
pub trait OutputFormatter {
    fn format(&self, summary: &RunSummary) -> String;

    fn format_json(&self, summary: &RunSummary) -> String;
}
