// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! RideWatch CLI - driving-examination slot monitoring from the command line.
//!
//! # Examples
//!
//! ```bash
//! # Create a config file, then import cookies captured from a logged-in browser
//! ridewatch config init --ssn 199001011234 --location-id 1000140
//! ridewatch session import --request captured-request.txt
//!
//! # Watch for driving-test slots until Ctrl-C
//! ridewatch monitor --exam korprov
//!
//! # Single poll cycle, JSON output
//! ridewatch --format json monitor --once
//!
//! # Known rides, and the next one from today
//! ridewatch rides --from 2025-06-01 --location Farsta
//! ridewatch rides --next
//!
//! # Session state
//! ridewatch session info
//! ```

mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use commands::{config, monitor, prune, rides, session};

// ============================================================================
// CLI Definition
// ============================================================================

/// RideWatch CLI - driving-examination slot monitoring.
#[derive(Parser)]
#[command(name = "ridewatch")]
#[command(about = "Driving-examination slot monitor for the Trafikverket booking service")]
#[command(long_about = r#"
RideWatch polls the Trafikverket booking service for free examination slots,
keeps the login session alive in the background, and records every slot it
sees in a local database.

Examination types:
  • Kunskapsprov (theory test)
  • Körprov (driving test)

Examples:
  ridewatch monitor               # Poll until Ctrl-C
  ridewatch monitor --once        # One cycle
  ridewatch rides --next          # Next available ride
  ridewatch session info          # Session validity
"#)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (defaults to the user config directory).
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// Output format (text or json).
    #[arg(long, short = 'f', default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Pretty-print JSON output.
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Verbose output (show debug info).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Quiet mode (minimal output).
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Poll for free slots and record changes.
    #[command(visible_alias = "m")]
    Monitor(monitor::MonitorArgs),

    /// List recorded rides.
    #[command(visible_alias = "r")]
    Rides(rides::RidesArgs),

    /// Inspect, renew or import the login session.
    #[command(visible_alias = "s")]
    Session(session::SessionArgs),

    /// Delete rides that have been gone for a while.
    Prune(prune::PruneArgs),

    /// Manage configuration.
    Config(config::ConfigArgs),
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable text with colors.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

/// CLI exit codes.
#[repr(i32)]
pub enum ExitCode {
    /// Success.
    Success = 0,
    /// General error.
    Error = 1,
}

// ============================================================================
// Logging Setup
// ============================================================================

fn setup_logging(verbose: bool, quiet: bool) {
    if quiet {
        return;
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("ridewatch=debug,info")
        } else {
            EnvFilter::new("ridewatch=info,warn")
        }
    });

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(verbose)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let result = match &cli.command {
        Commands::Monitor(args) => monitor::run(args, &cli).await,
        Commands::Rides(args) => rides::run(args, &cli).await,
        Commands::Session(args) => session::run(args, &cli).await,
        Commands::Prune(args) => prune::run(args, &cli).await,
        Commands::Config(args) => config::run(args, &cli).await,
    };

    if let Err(e) = result {
        if !cli.quiet {
            eprintln!("Error: {e:#}");
        }
        std::process::exit(ExitCode::Error as i32);
    }

    Ok(())
}
