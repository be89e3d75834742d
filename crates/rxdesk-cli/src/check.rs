//! # Check Subcommand
//!
//! Offline fulfillment evaluation. Runs the same rules the server applies
//! on `POST /v1/prescriptions/{id}/fulfill` against a dataset file, without
//! changing stock or writing an audit entry.

use std::path::PathBuf;

use anyhow::{bail, Result};
use chrono::NaiveDate;
use clap::Args;
use rxdesk_core::fulfillment::evaluate;
use rxdesk_core::{Dataset, FulfillmentOutcome, PrescriptionId};

use crate::EXIT_NOT_FULFILLABLE;

/// Arguments for the `rxdesk check` subcommand.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Dataset file (.json, .yaml or .yml).
    #[arg(long, value_name = "FILE")]
    pub data: PathBuf,

    /// Prescription to evaluate.
    #[arg(value_name = "PRESCRIPTION_ID")]
    pub prescription: String,

    /// Evaluate as of this date (YYYY-MM-DD) instead of today.
    #[arg(long)]
    pub today: Option<String>,
}

/// Evaluate `id` against `dataset` on `today`.
///
/// Fails if the prescription does not exist or is already fulfilled.
pub fn check_prescription(
    dataset: &Dataset,
    id: &PrescriptionId,
    today: NaiveDate,
) -> Result<FulfillmentOutcome> {
    let Some(rx) = dataset.prescriptions.iter().find(|rx| &rx.id == id) else {
        bail!("prescription {id} not found");
    };
    if !rx.is_fulfillable() {
        bail!("prescription {id} is already {}", rx.status);
    }
    let pharmacy = dataset.pharmacies.iter().find(|p| p.id == rx.pharmacy_id);
    Ok(evaluate(rx, &dataset.drugs, pharmacy, today))
}

/// Execute the check subcommand.
///
/// Returns exit code: 0 when fulfillable, 2 when not.
pub fn run_check(args: &CheckArgs) -> Result<u8> {
    let dataset = crate::load_dataset(&args.data)?;
    let today = crate::resolve_today(args.today.as_deref())?;
    let id = PrescriptionId::new(&args.prescription)?;

    let outcome = check_prescription(&dataset, &id, today)?;
    if outcome.is_success() {
        println!("{id}: fulfillable on {today}");
        for line in outcome.dispensed() {
            println!("  dispense {} x{}", line.drug_id, line.dosage);
        }
        Ok(0)
    } else {
        println!("{id}: NOT fulfillable on {today}");
        for reason in outcome.reasons() {
            println!("  - {reason}");
        }
        Ok(EXIT_NOT_FULFILLABLE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    fn rx(id: &str) -> PrescriptionId {
        PrescriptionId::new(id).unwrap()
    }

    #[test]
    fn demo_rx001_fails_on_expiry_and_stock() {
        let ds = Dataset::demo().unwrap();
        let outcome = check_prescription(&ds, &rx("RX001"), today()).unwrap();
        assert!(!outcome.is_success());
        let reasons = outcome.reasons();
        assert!(reasons.contains(&"Drug D002 is expired".to_string()));
        assert!(reasons.contains(&"Drug D001 insufficient stock".to_string()));
    }

    #[test]
    fn passes_when_stock_and_expiry_allow() {
        let mut ds = Dataset::demo().unwrap();
        // RX003 asks for 250 of D004 at PH001, which has no D004 allocation.
        let d004 = ds.drugs.iter_mut().find(|d| d.id == "D004").unwrap();
        d004.stock = 300;
        d004.expiry = NaiveDate::from_ymd_opt(2027, 1, 1).unwrap();
        let outcome = check_prescription(&ds, &rx("RX003"), today()).unwrap();
        assert!(outcome.is_success(), "{:?}", outcome.reasons());
        assert_eq!(outcome.dispensed().len(), 1);
    }

    #[test]
    fn fulfilled_prescription_is_an_error() {
        let ds = Dataset::demo().unwrap();
        let err = check_prescription(&ds, &rx("RX002"), today()).unwrap_err();
        assert!(err.to_string().contains("already FULFILLED"));
    }

    #[test]
    fn unknown_prescription_is_an_error() {
        let ds = Dataset::demo().unwrap();
        assert!(check_prescription(&ds, &rx("RX404"), today()).is_err());
    }

    #[test]
    fn run_check_exit_codes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        Dataset::demo().unwrap().save(&path).unwrap();

        let args = CheckArgs {
            data: path,
            prescription: "RX001".into(),
            today: Some("2025-06-01".into()),
        };
        assert_eq!(run_check(&args).unwrap(), EXIT_NOT_FULFILLABLE);
    }
}
