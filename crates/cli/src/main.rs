//! Server Metrics Simulator CLI
//!
//! Generates synthetic multi-server metric datasets, previews failure
//! schedules, and upsamples and checks datasets stored as JSON lines.

mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{analyze, generate, interpolate, schedule, SimulationArgs};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Server Metrics Simulator CLI
#[derive(Parser)]
#[command(name = "msim")]
#[command(author, version, long_about = None)]
#[command(about = "Server Metrics Simulator: synthetic server metrics with failures")]
pub struct Cli {
    /// Output format (defaults to the config file setting, then table)
    #[arg(long, short, global = true)]
    pub format: Option<output::OutputFormat>,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a dataset
    Generate {
        #[command(flatten)]
        sim: SimulationArgs,

        /// Write records as JSON lines (replaces an existing file)
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Pause between 100-record batches when writing
        #[arg(long, default_value_t = 0)]
        batch_pause_ms: u64,
    },

    /// Preview the failure schedule
    Schedule {
        #[command(flatten)]
        sim: SimulationArgs,
    },

    /// Upsample a 10-minute dataset to 1, 2 or 5 minutes
    Interpolate(interpolate::InterpolateArgs),

    /// Show summary statistics of a dataset
    Stats {
        /// JSON-lines file of raw or interpolated records
        #[arg(long, short)]
        input: PathBuf,
    },

    /// Validate interpolated output against its source
    Validate {
        /// Raw 10-minute records
        #[arg(long)]
        original: PathBuf,

        /// Interpolated records
        #[arg(long)]
        interpolated: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let config = config::Config::load()?;
    let format = cli
        .format
        .or(config.default_format)
        .unwrap_or_default();

    match cli.command {
        Commands::Generate {
            sim,
            output,
            batch_pause_ms,
        } => {
            generate::run(
                &sim,
                output.as_deref(),
                Duration::from_millis(batch_pause_ms),
                config.default_seed,
                format,
            )
            .await?;
        }
        Commands::Schedule { sim } => {
            schedule::run(&sim, config.default_seed, format)?;
        }
        Commands::Interpolate(args) => {
            interpolate::run(&args, config.default_seed, format).await?;
        }
        Commands::Stats { input } => {
            analyze::stats_command(&input, format).await?;
        }
        Commands::Validate {
            original,
            interpolated,
        } => {
            analyze::validate_command(&original, &interpolated, format).await?;
        }
    }

    Ok(())
}
