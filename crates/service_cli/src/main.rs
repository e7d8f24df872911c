//! Scenario CLI - Command Line Operations for Scenario Calculations
//!
//! This is the operational entry point for the scenario calculation engine.
//!
//! # Commands
//!
//! - `scenario calculate --model <file> --scenario <name>` - Calculate one scenario
//! - `scenario run-all --model <file>` - Calculate every scenario against the baseline
//! - `scenario validate --model <file>` - Check a model for errors
//! - `scenario order --model <file>` - Show the evaluation order by level
//! - `scenario check` - Show the effective configuration
//!
//! # Architecture
//!
//! As part of the **S**ervice layer, this crate wires the model loader,
//! dependency graph and orchestrator into a command-line interface.
//! Results go to stdout; logs go to stderr.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod config;
mod error;
mod output;

pub use error::{CliError, Result};

use config::{build_config, CliArgs};
use output::OutputFormat;

/// Scenario calculation engine CLI
#[derive(Parser)]
#[command(name = "scenario")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Round reported values to this many decimal places
    #[arg(long, global = true)]
    decimal_places: Option<u32>,

    /// Disable the result cache
    #[arg(long, global = true)]
    no_cache: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Calculate one scenario
    Calculate {
        /// Path to model file (TOML/JSON)
        #[arg(short, long)]
        model: PathBuf,

        /// Scenario id or name
        #[arg(short, long)]
        scenario: String,

        /// Period (`single` or `YYYY-MM-DD..YYYY-MM-DD`); all periods when omitted
        #[arg(short, long)]
        period: Option<String>,

        /// Recalculate even when a cached result matches
        #[arg(long)]
        force: bool,

        /// Output format (table, json, csv)
        #[arg(short, long)]
        format: Option<OutputFormat>,
    },

    /// Calculate every scenario and period against the baseline
    RunAll {
        /// Path to model file (TOML/JSON)
        #[arg(short, long)]
        model: PathBuf,

        /// Output format (table, json, csv)
        #[arg(short, long)]
        format: Option<OutputFormat>,
    },

    /// Check a model for errors
    Validate {
        /// Path to model file (TOML/JSON)
        #[arg(short, long)]
        model: PathBuf,

        /// Output format (table, json, csv)
        #[arg(short, long)]
        format: Option<OutputFormat>,
    },

    /// Show the evaluation order by level
    Order {
        /// Path to model file (TOML/JSON)
        #[arg(short, long)]
        model: PathBuf,

        /// Output format (table, json, csv)
        #[arg(short, long)]
        format: Option<OutputFormat>,
    },

    /// Show the effective configuration
    Check,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = build_config(&CliArgs {
        config_file: cli.config.clone(),
        log_level: cli.log_level.clone(),
        verbose: cli.verbose,
        decimal_places: cli.decimal_places,
        no_cache: cli.no_cache,
    })?;

    // Initialise tracing; RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_filter_str()));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    debug!("Effective configuration: {:?}", config);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let format = |f: Option<OutputFormat>| f.unwrap_or(config.output_format);

    match cli.command {
        Commands::Calculate {
            model,
            scenario,
            period,
            force,
            format: f,
        } => commands::calculate::run(
            &model,
            &scenario,
            period.as_deref(),
            force,
            &config.engine,
            format(f),
            &mut out,
        ),
        Commands::RunAll { model, format: f } => {
            commands::run_all::run(&model, &config.engine, format(f), &mut out)
        }
        Commands::Validate { model, format: f } => {
            commands::validate::run(&model, format(f), &mut out)
        }
        Commands::Order { model, format: f } => commands::order::run(&model, format(f), &mut out),
        Commands::Check => commands::check::run(&config, &mut out),
    }
}
