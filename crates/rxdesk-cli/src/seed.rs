//! # Seed Subcommand
//!
//! Writes the built-in demo dataset to a file. The format follows the
//! extension: `.yaml`/`.yml` for YAML, anything else for JSON.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use rxdesk_core::{Dataset, DatasetFormat};

/// Arguments for the `rxdesk seed` subcommand.
#[derive(Args, Debug)]
pub struct SeedArgs {
    /// Output file.
    #[arg(long, short, value_name = "FILE")]
    pub out: PathBuf,

    /// Overwrite an existing file.
    #[arg(long)]
    pub force: bool,
}

/// Execute the seed subcommand.
pub fn run_seed(args: &SeedArgs) -> Result<u8> {
    if args.out.exists() && !args.force {
        bail!(
            "{} already exists (pass --force to overwrite)",
            args.out.display()
        );
    }
    let dataset = Dataset::demo().context("built-in demo dataset is invalid")?;
    dataset
        .save(&args.out)
        .with_context(|| format!("failed to write {}", args.out.display()))?;

    let format = DatasetFormat::from_path(&args.out);
    tracing::info!(path = %args.out.display(), ?format, "wrote demo dataset");
    println!(
        "wrote {} drugs, {} pharmacies, {} prescriptions, {} audit logs to {}",
        dataset.drugs.len(),
        dataset.pharmacies.len(),
        dataset.prescriptions.len(),
        dataset.audit_logs.len(),
        args.out.display()
    );
    Ok(0)
}
