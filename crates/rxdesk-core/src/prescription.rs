//! # Prescriptions
//!
//! A prescription asks one pharmacy to dispense a list of drug dosages to
//! a patient. It starts `PENDING` and becomes `FULFILLED` once it passes
//! the checks in [`crate::fulfillment`]. A failed attempt leaves it
//! `FAILED`; failed prescriptions can be retried after restocking.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::{DrugId, PatientId, PharmacyId, PrescriptionId};

/// One requested drug on a prescription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionDrug {
    /// Requested drug.
    pub drug_id: DrugId,
    /// Display name of the drug.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drug_name: Option<String>,
    /// Requested dosage in stock units.
    pub dosage: u32,
}

/// Prescription lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrescriptionStatus {
    /// Waiting to be fulfilled.
    Pending,
    /// Dispensed.
    Fulfilled,
    /// Last fulfillment attempt failed.
    Failed,
}

impl PrescriptionStatus {
    /// Return the wire representation of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Fulfilled => "FULFILLED",
            Self::Failed => "FAILED",
        }
    }
}

impl std::fmt::Display for PrescriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A prescription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Prescription {
    /// Prescription identifier.
    pub id: PrescriptionId,
    /// Patient the drugs are for.
    pub patient_id: PatientId,
    /// Patient display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_name: Option<String>,
    /// Dispensing pharmacy.
    pub pharmacy_id: PharmacyId,
    /// Pharmacy display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pharmacy_name: Option<String>,
    /// Requested drugs, in order.
    pub drugs: Vec<PrescriptionDrug>,
    /// Current status.
    pub status: PrescriptionStatus,
    /// When the prescription was written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Prescription {
    /// Whether a fulfillment attempt is allowed in the current status.
    pub fn is_fulfillable(&self) -> bool {
        matches!(
            self.status,
            PrescriptionStatus::Pending | PrescriptionStatus::Failed
        )
    }

    /// Whether any line requests `drug_id`.
    pub fn requests(&self, drug_id: &DrugId) -> bool {
        self.drugs.iter().any(|line| &line.drug_id == drug_id)
    }
}

/// Result of a fulfillment attempt as returned to API callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct FulfillmentResponse {
    /// Whether the prescription was fulfilled.
    pub success: bool,
    /// Failure reasons, present only on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

/// List filter for prescriptions. Absent or blank fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionFilter {
    /// Exact patient id.
    #[serde(default)]
    pub patient_id: Option<String>,
    /// Exact pharmacy id.
    #[serde(default)]
    pub pharmacy_id: Option<String>,
    /// Exact status.
    #[serde(default)]
    pub status: Option<PrescriptionStatus>,
    /// Created on or after this date (UTC).
    #[serde(default)]
    pub created_from: Option<NaiveDate>,
    /// Created on or before this date (UTC).
    #[serde(default)]
    pub created_to: Option<NaiveDate>,
}

fn exact(expected: Option<&String>, actual: &str) -> bool {
    match expected.map(|e| e.trim()).filter(|e| !e.is_empty()) {
        Some(expected) => expected == actual,
        None => true,
    }
}

impl PrescriptionFilter {
    /// Whether `rx` passes every provided criterion.
    ///
    /// Prescriptions without a creation time never match a date bound.
    pub fn matches(&self, rx: &Prescription) -> bool {
        if !exact(self.patient_id.as_ref(), rx.patient_id.as_str())
            || !exact(self.pharmacy_id.as_ref(), rx.pharmacy_id.as_str())
        {
            return false;
        }
        if self.status.is_some_and(|s| s != rx.status) {
            return false;
        }
        if self.created_from.is_none() && self.created_to.is_none() {
            return true;
        }
        let Some(created) = rx.created_at.map(|at| at.date_naive()) else {
            return false;
        };
        self.created_from.map_or(true, |from| created >= from)
            && self.created_to.map_or(true, |to| created <= to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rx(status: PrescriptionStatus, created: Option<&str>) -> Prescription {
        Prescription {
            id: PrescriptionId::new("RX001").unwrap(),
            patient_id: PatientId::new("P001").unwrap(),
            patient_name: Some("Zhang San".to_string()),
            pharmacy_id: PharmacyId::new("PH001").unwrap(),
            pharmacy_name: None,
            drugs: vec![PrescriptionDrug {
                drug_id: DrugId::new("D001").unwrap(),
                drug_name: Some("Ibuprofen".to_string()),
                dosage: 100,
            }],
            status,
            created_at: created.map(|c| c.parse().unwrap()),
        }
    }

    #[test]
    fn fulfillable_statuses() {
        assert!(rx(PrescriptionStatus::Pending, None).is_fulfillable());
        assert!(rx(PrescriptionStatus::Failed, None).is_fulfillable());
        assert!(!rx(PrescriptionStatus::Fulfilled, None).is_fulfillable());
    }

    #[test]
    fn status_wire_format() {
        assert_eq!(
            serde_json::to_string(&PrescriptionStatus::Fulfilled).unwrap(),
            "\"FULFILLED\""
        );
        let s: PrescriptionStatus = serde_json::from_str("\"PENDING\"").unwrap();
        assert_eq!(s, PrescriptionStatus::Pending);
    }

    #[test]
    fn requests_drug() {
        let p = rx(PrescriptionStatus::Pending, None);
        assert!(p.requests(&DrugId::new("D001").unwrap()));
        assert!(!p.requests(&DrugId::new("D002").unwrap()));
    }

    #[test]
    fn response_omits_errors_on_success() {
        let ok = FulfillmentResponse {
            success: true,
            errors: None,
        };
        assert_eq!(serde_json::to_string(&ok).unwrap(), r#"{"success":true}"#);
    }

    #[test]
    fn filter_by_ids_and_status() {
        let p = rx(PrescriptionStatus::Pending, None);
        let f = PrescriptionFilter {
            patient_id: Some("P001".into()),
            status: Some(PrescriptionStatus::Pending),
            ..Default::default()
        };
        assert!(f.matches(&p));
        let f = PrescriptionFilter {
            pharmacy_id: Some("PH002".into()),
            ..Default::default()
        };
        assert!(!f.matches(&p));
        let f = PrescriptionFilter {
            status: Some(PrescriptionStatus::Failed),
            ..Default::default()
        };
        assert!(!f.matches(&p));
    }

    #[test]
    fn filter_by_creation_range() {
        let p = rx(PrescriptionStatus::Pending, Some("2024-01-15T10:30:00Z"));
        let day = |d: u32| NaiveDate::from_ymd_opt(2024, 1, d).unwrap();
        let f = PrescriptionFilter {
            created_from: Some(day(15)),
            created_to: Some(day(15)),
            ..Default::default()
        };
        assert!(f.matches(&p));
        let f = PrescriptionFilter {
            created_from: Some(day(16)),
            ..Default::default()
        };
        assert!(!f.matches(&p));

        let undated = rx(PrescriptionStatus::Pending, None);
        let f = PrescriptionFilter {
            created_to: Some(day(31)),
            ..Default::default()
        };
        assert!(!f.matches(&undated));
    }
}
