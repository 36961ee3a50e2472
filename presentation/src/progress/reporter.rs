//! Progress reporting for the round loop

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use mindloop_application::RoundObserver;
use mindloop_domain::{ActionType, AgentState, Escalation, RoundResult, StateTransition, ThoughtId};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// Spinner that tracks the current round, with a line per mode change.
pub struct RoundReporter {
    bar: ProgressBar,
    processed: Mutex<u64>,
    verbose: bool,
}

impl RoundReporter {
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(Self::round_style());
        bar.enable_steady_tick(Duration::from_millis(120));
        Self {
            bar,
            processed: Mutex::new(0),
            verbose: false,
        }
    }

    /// Also print a line for every processed thought.
    pub fn verbose() -> Self {
        Self {
            verbose: true,
            ..Self::new()
        }
    }

    fn round_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {prefix:.bold.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn state_label(state: AgentState) -> String {
        match state {
            AgentState::Bootstrap => state.as_str().yellow().to_string(),
            AgentState::NormalWork => state.as_str().green().to_string(),
            AgentState::Exploratory => state.as_str().magenta().to_string(),
            AgentState::LowActivity | AgentState::IdleReflection => state.as_str().dimmed().to_string(),
            AgentState::Shutdown => state.as_str().red().to_string(),
        }
    }
}

impl Default for RoundReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl RoundObserver for RoundReporter {
    fn on_round_start(&self, round: u64, state: AgentState) {
        self.bar.set_prefix(format!("Round {}", round));
        self.bar.set_message(Self::state_label(state));
    }

    fn on_thought_processed(&self, thought: &ThoughtId, action: Option<ActionType>, success: bool) {
        let total = {
            let mut processed = self.processed.lock().unwrap_or_else(PoisonError::into_inner);
            *processed += 1;
            *processed
        };
        if self.verbose {
            let action = action.map(|a| a.as_str()).unwrap_or("-");
            let mark = if success { "v".green() } else { "x".red() };
            self.bar.println(format!("  {} {} {}", mark, action.bold(), thought.as_str().dimmed()));
        }
        self.bar.set_message(format!("{} thoughts processed", total));
    }

    fn on_escalation(&self, escalation: &Escalation) {
        self.bar.println(format!(
            "  {} {} {}: {}",
            "!".yellow().bold(),
            escalation.kind.as_str().yellow(),
            escalation.module.as_deref().unwrap_or("pipeline"),
            escalation.last_error
        ));
    }

    fn on_round_complete(&self, result: &RoundResult) {
        for error in &result.errors {
            self.bar.println(format!("  {} round {}: {}", "x".red(), result.round, error));
        }
    }

    fn on_transition(&self, transition: &StateTransition) {
        self.bar.println(format!(
            "{} {} -> {} ({})",
            "->".cyan(),
            Self::state_label(transition.from),
            Self::state_label(transition.to),
            transition.reason
        ));
    }

    fn on_paused(&self, paused: bool) {
        let label = if paused { "paused".yellow() } else { "resumed".green() };
        self.bar.println(format!("{} {}", "||".cyan(), label));
    }

    fn on_shutdown(&self, reason: &str) {
        self.bar.finish_and_clear();
        eprintln!("{} {}", "Shutting down:".red().bold(), reason);
    }
}

/// Plain line-per-event progress (no spinner)
pub struct SimpleProgress;

impl RoundObserver for SimpleProgress {
    fn on_transition(&self, transition: &StateTransition) {
        eprintln!(
            "{} round {}: {} -> {} ({})",
            "->".cyan(),
            transition.round,
            transition.from,
            transition.to,
            transition.reason
        );
    }

    fn on_escalation(&self, escalation: &Escalation) {
        eprintln!(
            "  {} {}: {}",
            "!".yellow(),
            escalation.kind.as_str(),
            escalation.last_error
        );
    }

    fn on_shutdown(&self, reason: &str) {
        eprintln!("{} {}", "Shutting down:".red().bold(), reason);
    }
}
