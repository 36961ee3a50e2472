//! CLI entrypoint for mindloop
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, bail};
use clap::Parser;
use mindloop_application::{NoRoundProgress, RoundObserver};
use mindloop_domain::{OutputFormat, Priority};
use mindloop_infrastructure::{ConfigLoader, FileConfig, FileLoggingConfig, build_runtime};
use mindloop_presentation::{Cli, ConsoleFormatter, OutputConfig, RoundReporter, SimpleProgress};
use std::io::IsTerminal;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize logging based on verbosity; `RUST_LOG` wins when set.
///
/// The returned guard flushes the log file on drop.
fn init_logging(verbose: u8, logging: &FileLoggingConfig) -> Option<WorkerGuard> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let stderr = fmt::layer().with_target(false).with_writer(std::io::stderr);
    let (file, guard) = match &logging.directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, &logging.file_prefix);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_ansi(false).with_writer(writer)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr)
        .with(file)
        .init();
    guard
}

fn load_config(cli: &Cli) -> Result<FileConfig> {
    let mut config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref()).context("Failed to load configuration")?
    };

    // Command-line flags override every file
    if let Some(max_rounds) = cli.max_rounds {
        config.scheduler.max_rounds = Some(max_rounds);
    }
    if cli.skip_bootstrap {
        config.scheduler.skip_bootstrap = true;
    }
    if let Some(path) = &cli.audit_log {
        config.audit.jsonl_path = Some(path.clone());
    }
    if let Some(format) = cli.output {
        config.output.format = format.into();
    }
    if cli.no_color {
        config.output.color = false;
    }
    if cli.quiet {
        config.output.progress = false;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.show_config {
        for line in ConfigLoader::describe_sources(cli.config.as_ref()) {
            println!("{}", line);
        }
        return Ok(());
    }

    let config = load_config(&cli)?;
    let log_guard = init_logging(cli.verbose, &config.logging);
    info!("Starting mindloop");

    let output = OutputConfig {
        format: config.output.format,
        color: config.output.color && std::io::stdout().is_terminal(),
        progress: config.output.progress,
    };
    colored::control::set_override(output.color);

    // === Dependency Injection ===
    let observer: Arc<dyn RoundObserver> = if !output.show_progress() {
        Arc::new(NoRoundProgress)
    } else if std::io::stderr().is_terminal() {
        Arc::new(if cli.verbose > 0 {
            RoundReporter::verbose()
        } else {
            RoundReporter::new()
        })
    } else {
        Arc::new(SimpleProgress)
    };
    let runtime = build_runtime(&config, observer)?;

    let priority = Priority::saturating(cli.priority);
    for description in &cli.tasks {
        if description.trim().is_empty() {
            bail!("Task description cannot be empty");
        }
        let task = runtime.submit_task(description.as_str(), priority).await?;
        info!(task_id = %task.id, "Task submitted");
    }
    if cli.tasks.is_empty() && config.scheduler.max_rounds.is_none() {
        warn!("No tasks submitted and no round limit; the loop runs until interrupted");
    }

    let control = runtime.control();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            control.shutdown("interrupted");
        }
    });

    let summary = runtime.run().await;

    let rendered = match output.format {
        OutputFormat::Text => ConsoleFormatter::format(&summary),
        OutputFormat::Json => ConsoleFormatter::format_json(&summary),
    };
    println!("{}", rendered);

    if !summary.succeeded() {
        drop(log_guard);
        std::process::exit(1);
    }
    Ok(())
}
