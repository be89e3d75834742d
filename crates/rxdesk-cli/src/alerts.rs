//! # Alerts Subcommand
//!
//! Lists the drugs in a dataset file that are expired or low on stock,
//! most severe first.

use std::path::PathBuf;

use anyhow::Result;
use chrono::NaiveDate;
use clap::Args;
use rxdesk_core::drug::DEFAULT_LOW_STOCK_THRESHOLD;
use rxdesk_core::{AlertLevel, Dataset, Drug};

/// Arguments for the `rxdesk alerts` subcommand.
#[derive(Args, Debug)]
pub struct AlertsArgs {
    /// Dataset file (.json, .yaml or .yml).
    #[arg(long, value_name = "FILE")]
    pub data: PathBuf,

    /// Evaluate as of this date (YYYY-MM-DD) instead of today.
    #[arg(long)]
    pub today: Option<String>,

    /// Stock below this count is reported as low.
    #[arg(long, default_value_t = DEFAULT_LOW_STOCK_THRESHOLD)]
    pub threshold: u32,

    /// Print the alerts as JSON.
    #[arg(long)]
    pub json: bool,
}

/// One drug needing attention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertRow<'a> {
    pub drug: &'a Drug,
    pub level: AlertLevel,
    pub label: &'static str,
}

/// Alerts for every drug in `dataset`, sorted by level (high first) then id.
pub fn collect_alerts(dataset: &Dataset, today: NaiveDate, threshold: u32) -> Vec<AlertRow<'_>> {
    let mut rows: Vec<AlertRow<'_>> = dataset
        .drugs
        .iter()
        .filter_map(|drug| {
            drug.alert(today, threshold)
                .map(|(level, label)| AlertRow { drug, level, label })
        })
        .collect();
    rows.sort_by(|a, b| b.level.cmp(&a.level).then_with(|| a.drug.id.cmp(&b.drug.id)));
    rows
}

/// Execute the alerts subcommand.
pub fn run_alerts(args: &AlertsArgs) -> Result<u8> {
    let dataset = crate::load_dataset(&args.data)?;
    let today = crate::resolve_today(args.today.as_deref())?;
    let rows = collect_alerts(&dataset, today, args.threshold);
    tracing::info!(count = rows.len(), %today, threshold = args.threshold, "computed drug alerts");

    if args.json {
        let json: Vec<serde_json::Value> = rows
            .iter()
            .map(|r| {
                serde_json::json!({
                    "id": r.drug.id,
                    "name": r.drug.name,
                    "level": r.level,
                    "label": r.label,
                    "stock": r.drug.stock,
                    "expiry": r.drug.expiry,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&json)?);
        return Ok(0);
    }

    if rows.is_empty() {
        println!("no alerts on {today}");
        return Ok(0);
    }
    for r in &rows {
        println!("{}", format_row(r));
    }
    Ok(0)
}

fn format_row(r: &AlertRow<'_>) -> String {
    format!(
        "{:<6} {:<8} {:<20} stock {:>5} ({:>3}%)  expires {}  {}",
        r.drug.id.as_str(),
        r.level,
        r.drug.name,
        r.drug.stock,
        r.drug.stock_percentage(),
        r.drug.expiry,
        r.label
    )
}
