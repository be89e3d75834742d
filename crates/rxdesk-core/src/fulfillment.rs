//! # Prescription Fulfillment Rules
//!
//! Decides whether a prescription can be dispensed. Evaluation is pure: it
//! reads the drug catalog and the dispensing pharmacy and returns a
//! [`FulfillmentOutcome`]. Applying the outcome (decrementing stock,
//! flipping the status, writing an audit entry) is the caller's job.
//!
//! ## Rules
//!
//! The dispensing pharmacy must exist and the prescription must request at
//! least one drug. Then each line is checked in order:
//!
//! 1. The drug exists in the catalog. If not, the line's remaining checks
//!    are skipped.
//! 2. The drug is not expired on the evaluation date.
//! 3. Stock covers the dosage. Lines naming the same drug share its stock,
//!    so the check is against the running total requested so far.
//! 4. If the pharmacy has an allocation for the drug, the dosage does not
//!    exceed it.
//!
//! Every failure is collected; evaluation never stops at the first one.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use thiserror::Error;

use crate::drug::Drug;
use crate::identity::{DrugId, PharmacyId, PrescriptionId};
use crate::pharmacy::Pharmacy;
use crate::prescription::{FulfillmentResponse, Prescription, PrescriptionDrug};

/// Lookup of drugs by id.
pub trait DrugSource {
    /// The catalog entry for `id`, if any.
    fn find_drug(&self, id: &DrugId) -> Option<&Drug>;
}

impl DrugSource for [Drug] {
    fn find_drug(&self, id: &DrugId) -> Option<&Drug> {
        self.iter().find(|d| &d.id == id)
    }
}

impl DrugSource for Vec<Drug> {
    fn find_drug(&self, id: &DrugId) -> Option<&Drug> {
        self.as_slice().find_drug(id)
    }
}

impl DrugSource for BTreeMap<DrugId, Drug> {
    fn find_drug(&self, id: &DrugId) -> Option<&Drug> {
        self.get(id)
    }
}

impl DrugSource for HashMap<DrugId, Drug> {
    fn find_drug(&self, id: &DrugId) -> Option<&Drug> {
        self.get(id)
    }
}

/// One reason a prescription cannot be fulfilled.
///
/// The `Display` text is the reason string returned to API callers and
/// stored in audit logs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FulfillmentFailure {
    /// The prescription has no drug lines.
    #[error("Prescription {prescription_id} has no drugs")]
    NoDrugs {
        /// The empty prescription.
        prescription_id: PrescriptionId,
    },

    /// The dispensing pharmacy does not exist.
    #[error("Pharmacy {pharmacy_id} not found")]
    PharmacyNotFound {
        /// The unknown pharmacy.
        pharmacy_id: PharmacyId,
    },

    /// A requested drug is not in the catalog.
    #[error("Drug {drug_id} not found")]
    DrugNotFound {
        /// The unknown drug.
        drug_id: DrugId,
    },

    /// A requested drug is expired.
    #[error("Drug {drug_id} is expired")]
    Expired {
        /// The expired drug.
        drug_id: DrugId,
        /// Its expiry date.
        expiry: NaiveDate,
    },

    /// Stock does not cover the total requested so far.
    #[error("Drug {drug_id} insufficient stock")]
    InsufficientStock {
        /// The understocked drug.
        drug_id: DrugId,
        /// Total requested across lines up to and including this one.
        requested: u64,
        /// Units in stock.
        available: u32,
    },

    /// A line exceeds the pharmacy's allocation for the drug.
    #[error("Drug {drug_id} exceeds pharmacy allocation")]
    ExceedsAllocation {
        /// The over-allocated drug.
        drug_id: DrugId,
        /// Requested dosage on the line.
        dosage: u32,
        /// The pharmacy's allocation limit.
        limit: u32,
    },
}

/// Result of evaluating one prescription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FulfillmentOutcome {
    prescription_id: PrescriptionId,
    failures: Vec<FulfillmentFailure>,
    dispensed: Vec<PrescriptionDrug>,
}

impl FulfillmentOutcome {
    /// The evaluated prescription.
    pub fn prescription_id(&self) -> &PrescriptionId {
        &self.prescription_id
    }

    /// Whether every check passed.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// All failures, in evaluation order.
    pub fn failures(&self) -> &[FulfillmentFailure] {
        &self.failures
    }

    /// Failure reasons as display strings.
    pub fn reasons(&self) -> Vec<String> {
        self.failures.iter().map(ToString::to_string).collect()
    }

    /// Lines to dispense: all requested lines on success, none on failure.
    pub fn dispensed(&self) -> &[PrescriptionDrug] {
        &self.dispensed
    }

    /// The API response for this outcome.
    pub fn to_response(&self) -> FulfillmentResponse {
        if self.is_success() {
            FulfillmentResponse {
                success: true,
                errors: None,
            }
        } else {
            FulfillmentResponse {
                success: false,
                errors: Some(self.reasons()),
            }
        }
    }
}

/// Evaluate `prescription` against the catalog and its pharmacy on `today`.
///
/// `pharmacy` is `None` when the prescription's pharmacy does not exist.
pub fn evaluate<S: DrugSource + ?Sized>(
    prescription: &Prescription,
    drugs: &S,
    pharmacy: Option<&Pharmacy>,
    today: NaiveDate,
) -> FulfillmentOutcome {
    let mut failures = Vec::new();

    if pharmacy.is_none() {
        failures.push(FulfillmentFailure::PharmacyNotFound {
            pharmacy_id: prescription.pharmacy_id.clone(),
        });
    }
    if prescription.drugs.is_empty() {
        failures.push(FulfillmentFailure::NoDrugs {
            prescription_id: prescription.id.clone(),
        });
    }

    let mut requested: HashMap<&DrugId, u64> = HashMap::new();

    for line in &prescription.drugs {
        let Some(drug) = drugs.find_drug(&line.drug_id) else {
            failures.push(FulfillmentFailure::DrugNotFound {
                drug_id: line.drug_id.clone(),
            });
            continue;
        };

        if drug.is_expired(today) {
            failures.push(FulfillmentFailure::Expired {
                drug_id: drug.id.clone(),
                expiry: drug.expiry,
            });
        }

        let total = requested.entry(&line.drug_id).or_insert(0);
        *total += u64::from(line.dosage);
        if u64::from(drug.stock) < *total {
            failures.push(FulfillmentFailure::InsufficientStock {
                drug_id: drug.id.clone(),
                requested: *total,
                available: drug.stock,
            });
        }

        if let Some(allocation) = pharmacy.and_then(|p| p.allocation_for(&line.drug_id)) {
            if line.dosage > allocation.limit {
                failures.push(FulfillmentFailure::ExceedsAllocation {
                    drug_id: drug.id.clone(),
                    dosage: line.dosage,
                    limit: allocation.limit,
                });
            }
        }
    }

    let dispensed = if failures.is_empty() {
        prescription.drugs.clone()
    } else {
        Vec::new()
    };

    tracing::debug!(
        prescription_id = %prescription.id,
        failures = failures.len(),
        "evaluated prescription fulfillment"
    );

    FulfillmentOutcome {
        prescription_id: prescription.id.clone(),
        failures,
        dispensed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::PatientId;
    use crate::pharmacy::AllocatedDrug;
    use crate::prescription::PrescriptionStatus;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    fn id(s: &str) -> DrugId {
        DrugId::new(s).unwrap()
    }

    fn catalog() -> Vec<Drug> {
        let drug = |i: &str, expiry: (i32, u32, u32), stock: u32| Drug {
            id: id(i),
            name: i.to_string(),
            manufacturer: "ACME Pharma".to_string(),
            batch: "B1".to_string(),
            expiry: NaiveDate::from_ymd_opt(expiry.0, expiry.1, expiry.2).unwrap(),
            stock,
            limit: 200,
        };
        vec![
            drug("D001", (2026, 1, 1), 150),
            drug("D002", (2024, 6, 1), 20),
            drug("D003", (2025, 12, 31), 80),
        ]
    }

    fn pharmacy() -> Pharmacy {
        Pharmacy {
            id: PharmacyId::new("PH001").unwrap(),
            name: "Chengdu Main Branch".to_string(),
            address: None,
            phone: None,
            allocated_drugs: vec![AllocatedDrug {
                drug_id: id("D001"),
                drug_name: "Ibuprofen".to_string(),
                limit: 100,
            }],
        }
    }

    fn rx(lines: &[(&str, u32)]) -> Prescription {
        Prescription {
            id: PrescriptionId::new("RX100").unwrap(),
            patient_id: PatientId::new("P001").unwrap(),
            patient_name: None,
            pharmacy_id: PharmacyId::new("PH001").unwrap(),
            pharmacy_name: None,
            drugs: lines
                .iter()
                .map(|(d, dosage)| PrescriptionDrug {
                    drug_id: id(d),
                    drug_name: None,
                    dosage: *dosage,
                })
                .collect(),
            status: PrescriptionStatus::Pending,
            created_at: None,
        }
    }

    #[test]
    fn passes_when_every_rule_holds() {
        let p = rx(&[("D001", 50), ("D003", 80)]);
        let outcome = evaluate(&p, &catalog(), Some(&pharmacy()), today());
        assert!(outcome.is_success());
        assert!(outcome.reasons().is_empty());
        assert_eq!(outcome.dispensed().len(), 2);
        assert_eq!(
            outcome.to_response(),
            FulfillmentResponse {
                success: true,
                errors: None
            }
        );
    }

    #[test]
    fn expired_drug_fails() {
        let outcome = evaluate(&rx(&[("D002", 5)]), &catalog(), Some(&pharmacy()), today());
        assert_eq!(outcome.reasons(), vec!["Drug D002 is expired"]);
        assert!(outcome.dispensed().is_empty());
    }

    #[test]
    fn insufficient_stock_fails() {
        let outcome = evaluate(&rx(&[("D003", 81)]), &catalog(), Some(&pharmacy()), today());
        assert_eq!(outcome.reasons(), vec!["Drug D003 insufficient stock"]);
    }

    #[test]
    fn dosage_equal_to_stock_passes() {
        let outcome = evaluate(&rx(&[("D003", 80)]), &catalog(), Some(&pharmacy()), today());
        assert!(outcome.is_success());
    }

    #[test]
    fn allocation_limit_applies_only_to_allocated_drugs() {
        let over = evaluate(&rx(&[("D001", 101)]), &catalog(), Some(&pharmacy()), today());
        assert_eq!(over.reasons(), vec!["Drug D001 exceeds pharmacy allocation"]);

        let at_limit = evaluate(&rx(&[("D001", 100)]), &catalog(), Some(&pharmacy()), today());
        assert!(at_limit.is_success());

        // D003 has no allocation entry at PH001.
        let unallocated = evaluate(&rx(&[("D003", 80)]), &catalog(), Some(&pharmacy()), today());
        assert!(unallocated.is_success());
    }

    #[test]
    fn unknown_drug_skips_other_checks_for_that_line() {
        let outcome = evaluate(&rx(&[("D999", 1_000)]), &catalog(), Some(&pharmacy()), today());
        assert_eq!(outcome.reasons(), vec!["Drug D999 not found"]);
    }

    #[test]
    fn collects_every_failure_in_order() {
        // D001: over allocation (150 stock, 100 allocation); D002: expired and understocked.
        let p = rx(&[("D001", 120), ("D002", 500), ("D404", 1)]);
        let outcome = evaluate(&p, &catalog(), Some(&pharmacy()), today());
        assert_eq!(
            outcome.reasons(),
            vec![
                "Drug D001 exceeds pharmacy allocation",
                "Drug D002 is expired",
                "Drug D002 insufficient stock",
                "Drug D404 not found",
            ]
        );
        assert!(!outcome.is_success());
        assert_eq!(
            outcome.to_response().errors.map(|e| e.len()),
            Some(4)
        );
    }

    #[test]
    fn repeated_lines_share_stock() {
        // The second line brings the total to 100 against 80 in stock.
        let outcome = evaluate(&rx(&[("D003", 50), ("D003", 50)]), &catalog(), Some(&pharmacy()), today());
        assert_eq!(outcome.reasons(), vec!["Drug D003 insufficient stock"]);
        match &outcome.failures()[0] {
            FulfillmentFailure::InsufficientStock {
                requested,
                available,
                ..
            } => {
                assert_eq!(*requested, 100);
                assert_eq!(*available, 80);
            }
            other => panic!("unexpected failure {other:?}"),
        }
    }

    #[test]
    fn missing_pharmacy_fails_and_skips_allocations() {
        let outcome = evaluate(&rx(&[("D001", 120)]), &catalog(), None, today());
        assert_eq!(outcome.reasons(), vec!["Pharmacy PH001 not found"]);
    }

    #[test]
    fn empty_prescription_fails() {
        let outcome = evaluate(&rx(&[]), &catalog(), Some(&pharmacy()), today());
        assert_eq!(outcome.reasons(), vec!["Prescription RX100 has no drugs"]);
    }

    #[test]
    fn drug_expiring_tomorrow_still_passes() {
        let day_before = NaiveDate::from_ymd_opt(2025, 12, 30).unwrap();
        let on_expiry = NaiveDate::from_ymd_opt(2025, 12, 31).unwrap();
        assert!(evaluate(&rx(&[("D003", 1)]), &catalog(), Some(&pharmacy()), day_before).is_success());
        assert!(!evaluate(&rx(&[("D003", 1)]), &catalog(), Some(&pharmacy()), on_expiry).is_success());
    }

    #[test]
    fn map_sources_behave_like_slices() {
        let map: BTreeMap<DrugId, Drug> =
            catalog().into_iter().map(|d| (d.id.clone(), d)).collect();
        let p = rx(&[("D001", 50), ("D002", 1)]);
        let from_map = evaluate(&p, &map, Some(&pharmacy()), today());
        let from_slice = evaluate(&p, catalog().as_slice(), Some(&pharmacy()), today());
        assert_eq!(from_map, from_slice);
    }
}
