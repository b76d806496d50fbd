//! CLI entry point for the movement statistics tool.
//!
//! Provides subcommands for aggregating a movement log with a worker pool
//! and for checking which lines of a log would be rejected.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use movement_stats::{
    config::{DEFAULT_CHANNEL_CAPACITY, DEFAULT_WORKERS, PipelineConfig},
    dispatcher::check_lines,
    output::{append_record, print_json, print_pretty},
    pipeline::process_file,
};
use std::ffi::OsStr;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "movement_stats")]
#[command(about = "Per-category statistics over a movement log", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate count, sum and average per movement type
    Process {
        /// Path to the movement log
        #[arg(value_name = "FILE")]
        source: String,

        /// Number of aggregation workers
        #[arg(short, long, env = "MOVEMENT_WORKERS", default_value_t = DEFAULT_WORKERS)]
        workers: usize,

        /// Records buffered between the reader and the workers (0 = unbuffered)
        #[arg(long, env = "MOVEMENT_CHANNEL_CAPACITY", default_value_t = DEFAULT_CHANNEL_CAPACITY)]
        channel_capacity: usize,

        /// How to log the final summary
        #[arg(short, long, value_enum, default_value_t = Format::Pretty)]
        format: Format,

        /// Optional: CSV file to append one row per category to
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Parse a movement log and report the lines that would be dropped
    Check {
        /// Path to the movement log
        #[arg(value_name = "FILE")]
        source: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Pretty,
    Json,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/movement_stats.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("movement_stats.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Process {
            source,
            workers,
            channel_capacity,
            format,
            output,
        } => {
            let config = PipelineConfig::default()
                .with_workers(workers)
                .with_channel_capacity(channel_capacity);

            let start = Instant::now();
            let result = process_file(&source, &config)?;
            let elapsed = start.elapsed();

            match format {
                Format::Pretty => print_pretty(&result),
                Format::Json => print_json(&result)?,
            }

            if let Some(output) = output {
                append_record(&output, &result)?;
                info!(output = %output, "Appended summary to CSV");
            }

            info!(
                source = %source,
                elapsed_ms = elapsed.as_millis() as u64,
                "Movements process done"
            );
        }
        Commands::Check { source } => {
            let file = File::open(&source).with_context(|| format!("Failed to open {source}"))?;
            let report = check_lines(BufReader::new(file));

            if report.rejected.is_empty() {
                info!(lines_read = report.lines_read, "All lines are valid movements");
            } else {
                warn!(
                    lines_read = report.lines_read,
                    valid = report.valid,
                    rejected = report.rejected.len(),
                    "Some lines would be dropped"
                );
            }
        }
    }

    Ok(())
}
