//! Console output formatter for run summaries

use crate::output::formatter::OutputFormatter;
use colored::Colorize;
use mindloop_application::RunSummary;

/// Formats run summaries for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    pub fn format(summary: &RunSummary) -> String {
        let mut output = String::new();

        output.push_str(&Self::header("mindloop run"));
        output.push('\n');

        let status = if summary.succeeded() {
            "clean".green().bold()
        } else {
            "with problems".yellow().bold()
        };
        output.push_str(&format!("{} {}\n", "Finished:".cyan().bold(), status));
        output.push_str(&format!(
            "{} {} rounds in {} ms, final mode {}\n",
            "Rounds:".cyan().bold(),
            summary.rounds,
            summary.elapsed_ms,
            summary.final_state
        ));
        output.push_str(&format!(
            "{} {}{}\n",
            "Shutdown:".cyan().bold(),
            summary.shutdown_reason,
            if summary.drained { "" } else { " (in-flight work abandoned)" }
        ));

        output.push_str(&Self::section_header("Work"));
        output.push_str(&format!(
            "  thoughts processed: {}, failed: {}\n",
            summary.processed, summary.failed
        ));
        let t = &summary.tasks;
        output.push_str(&format!(
            "  tasks  pending {}  active {}  completed {}  failed {}  deferred {}\n",
            t.pending, t.active, t.completed, t.failed, t.deferred
        ));

        if !summary.transitions.is_empty() {
            output.push_str(&Self::section_header("Mode changes"));
            for transition in &summary.transitions {
                output.push_str(&format!(
                    "  round {:>3}  {} -> {}  {}\n",
                    transition.round,
                    transition.from,
                    transition.to,
                    transition.reason.dimmed()
                ));
            }
        }

        if !summary.escalations.is_empty() {
            output.push_str(&Self::section_header("Escalations"));
            for escalation in &summary.escalations {
                output.push_str(&format!(
                    "  {} {} (thought {}, {} attempts): {}\n",
                    "!".yellow(),
                    escalation.kind,
                    escalation.thought_id,
                    escalation.attempts,
                    escalation.last_error
                ));
            }
        }

        if !summary.errors.is_empty() {
            output.push_str(&Self::section_header("Errors"));
            for error in &summary.errors {
                output.push_str(&format!("  {} {}\n", "x".red(), error));
            }
        }

        output.push_str(&Self::footer());
        output
    }

    pub fn format_json(summary: &RunSummary) -> String {
        serde_json::to_string_pretty(summary).unwrap_or_else(|_| "{}".to_string())
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format(&self, summary: &RunSummary) -> String {
        Self::format(summary)
    }

    fn format_json(&self, summary: &RunSummary) -> String {
        Self::format_json(summary)
    }
}
