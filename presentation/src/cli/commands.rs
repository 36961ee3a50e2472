//! CLI command definitions

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for the run summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary
    Text,
    /// JSON document
    Json,
}

impl From<OutputFormat> for mindloop_domain::OutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Text => mindloop_domain::OutputFormat::Text,
            OutputFormat::Json => mindloop_domain::OutputFormat::Json,
        }
    }
}

/// CLI arguments for mindloop
#[derive(Parser, Debug)]
#[command(name = "mindloop")]
#[command(author, version, about = "Round-based cognitive loop with parallel judgment")]
#[command(long_about = r#"
mindloop runs an agent's round loop: it affirms its identity in a bootstrap
sequence, then works through tasks one reasoning step (thought) at a time.
Every thought is judged in parallel by ethical, common-sense and domain
modules before an action is chosen and checked by guardrails.

Configuration files are merged in this order (later wins):
1. ~/.config/mindloop/config.toml   Global config
2. ./mindloop.toml                  Project-level config
3. --config <path>                  Explicit config file
4. MINDLOOP_<SECTION>__<KEY>        Environment variables

Press Ctrl-C to stop; in-flight thoughts get the shutdown deadline to finish.

Example:
  mindloop --task "Summarize today's notes" --max-rounds 10
  mindloop --skip-bootstrap -t "Greet the team" -t "File the report" -o json
"#)]
pub struct Cli {
    /// Task to submit before the loop starts (repeatable)
    #[arg(short, long = "task", value_name = "DESCRIPTION")]
    pub tasks: Vec<String>,

    /// Priority of submitted tasks (0-10)
    #[arg(short, long, default_value_t = 5, value_parser = clap::value_parser!(u8).range(0..=10))]
    pub priority: u8,

    /// Stop after this many rounds
    #[arg(long, value_name = "N")]
    pub max_rounds: Option<u64>,

    /// Start directly in normal work
    #[arg(long)]
    pub skip_bootstrap: bool,

    /// Output format for the run summary
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Append audit records to this JSONL file
    #[arg(long, value_name = "PATH")]
    pub audit_log: Option<PathBuf>,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_repeated_tasks() {
        let cli = Cli::parse_from(["mindloop", "-t", "a", "--task", "b", "-p", "9", "-o", "json", "-vv"]);
        assert_eq!(cli.tasks, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(cli.priority, 9);
        assert_eq!(cli.output, Some(OutputFormat::Json));
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_priority_out_of_range_is_rejected() {
        assert!(Cli::try_parse_from(["mindloop", "-p", "11"]).is_err());
    }
}
