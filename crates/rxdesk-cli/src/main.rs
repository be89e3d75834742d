//! # rxdesk CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use rxdesk_cli::alerts::{run_alerts, AlertsArgs};
use rxdesk_cli::check::{run_check, CheckArgs};
use rxdesk_cli::remote::{run_remote, RemoteArgs};
use rxdesk_cli::seed::{run_seed, SeedArgs};

/// rxdesk pharmacy back-office tool.
///
/// Checks prescriptions and stock alerts offline against a dataset file,
/// writes the demo dataset, and talks to a running rxdesk API server.
#[derive(Parser, Debug)]
#[command(name = "rxdesk", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Evaluate whether a prescription in a dataset file can be fulfilled.
    Check(CheckArgs),

    /// List expired and low-stock drugs in a dataset file.
    Alerts(AlertsArgs),

    /// Write the demo dataset to a JSON or YAML file.
    Seed(SeedArgs),

    /// Operate on a running rxdesk API server.
    Remote(RemoteArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("rxdesk CLI starting");

    let result = match cli.command {
        Commands::Check(args) => run_check(&args),
        Commands::Alerts(args) => run_alerts(&args),
        Commands::Seed(args) => run_seed(&args),
        Commands::Remote(args) => run_remote(&args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
