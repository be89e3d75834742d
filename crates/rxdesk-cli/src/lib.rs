//! # rxdesk-cli: Command-Line Tool for rxdesk
//!
//! Provides the `rxdesk` command-line interface.
//!
//! ## Subcommands
//!
//! - `rxdesk check`: evaluate one prescription against a dataset file.
//! - `rxdesk alerts`: list expired and low-stock drugs in a dataset file.
//! - `rxdesk seed`: write the demo dataset as JSON or YAML.
//! - `rxdesk remote`: drugs, fulfillment and audit logs on a running server.
//!
//! ```bash
//! rxdesk seed --out data.yaml
//! rxdesk check --data data.yaml RX001 --today 2025-06-01
//! rxdesk alerts --data data.yaml --threshold 30
//! rxdesk remote --url http://127.0.0.1:8080 fulfill RX001
//! ```
//!
//! ## Exit codes
//!
//! `0` on success, `1` on an operational error, `2` when a prescription
//! cannot be fulfilled.

pub mod alerts;
pub mod check;
pub mod remote;
pub mod seed;

use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rxdesk_core::{parse_date, Clock, Dataset, SystemClock};

/// Exit code for a prescription that cannot be fulfilled.
pub const EXIT_NOT_FULFILLABLE: u8 = 2;

/// Load and validate a dataset file (JSON or YAML by extension).
pub fn load_dataset(path: &Path) -> Result<Dataset> {
    let dataset = Dataset::load(path)
        .with_context(|| format!("failed to load dataset: {}", path.display()))?;
    dataset
        .validate()
        .with_context(|| format!("invalid dataset: {}", path.display()))?;
    Ok(dataset)
}

/// The evaluation date: `--today` if given, else the system date (UTC).
pub fn resolve_today(today: Option<&str>) -> Result<NaiveDate> {
    match today {
        Some(raw) => parse_date(raw).with_context(|| format!("invalid --today value: {raw}")),
        None => Ok(SystemClock.today()),
    }
}
