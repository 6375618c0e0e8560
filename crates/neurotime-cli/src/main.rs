//! Neurotime CLI - Command-line interface for neurotime time-series analysis.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "neurotime")]
#[command(author, version, about = "Time-series analysis for neural recordings", long_about = None)]
struct Cli {
    /// Analysis configuration (TOML); defaults to the per-user analysis.toml
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Seconds between samples; overrides the configuration
    #[arg(long, global = true, value_name = "SECONDS")]
    sampling_interval: Option<f64>,

    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show channels, length, and duration of an input file
    Info(commands::info::InfoArgs),

    /// Correlation matrix and lagged cross-correlation between columns
    Correlate(commands::correlate::CorrelateArgs),

    /// Event-locked responses of one column to the codes in another
    EventRelated(commands::event_related::EventRelatedArgs),

    /// Welch coherence, phase, and delay between columns
    Coherence(commands::coherence::CoherenceArgs),

    /// Analytic-signal envelope, phase, and frequency of every column
    Hilbert(commands::hilbert::HilbertArgs),

    /// Brick-wall frequency-domain filter
    Filter(commands::filter::FilterArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = commands::common::load_config(cli.config.as_deref(), cli.sampling_interval)?;

    match cli.command {
        Commands::Info(args) => commands::info::run(args, &config),
        Commands::Correlate(args) => commands::correlate::run(args, &config),
        Commands::EventRelated(args) => commands::event_related::run(args, &config),
        Commands::Coherence(args) => commands::coherence::run(args, &config),
        Commands::Hilbert(args) => commands::hilbert::run(args, &config),
        Commands::Filter(args) => commands::filter::run(args, &config),
    }
}
