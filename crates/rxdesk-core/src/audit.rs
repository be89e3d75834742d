//! # Fulfillment Audit Log
//!
//! Every fulfillment attempt, successful or not, leaves one [`AuditLog`]
//! entry recording what was requested, what was dispensed, and why a
//! failed attempt was rejected.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::fulfillment::FulfillmentOutcome;
use crate::identity::{AuditLogId, PatientId, PharmacyId, PrescriptionId};
use crate::prescription::{Prescription, PrescriptionDrug};

/// Outcome recorded in an audit entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditStatus {
    /// The prescription was fulfilled.
    Success,
    /// The attempt was rejected.
    Failed,
}

impl AuditStatus {
    /// Return the wire representation of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Failed => "FAILED",
        }
    }
}

impl std::fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AuditStatus {
    type Err = ValidationError;

    /// Case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SUCCESS" => Ok(Self::Success),
            "FAILED" => Ok(Self::Failed),
            _ => Err(ValidationError::InvalidStatus(s.to_string())),
        }
    }
}

/// One fulfillment attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct AuditLog {
    /// Entry identifier.
    pub id: AuditLogId,
    /// The prescription the attempt was for.
    pub prescription_id: PrescriptionId,
    /// The patient on the prescription.
    pub patient_id: PatientId,
    /// Patient display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_name: Option<String>,
    /// The dispensing pharmacy.
    pub pharmacy_id: PharmacyId,
    /// Pharmacy display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pharmacy_name: Option<String>,
    /// Attempt outcome.
    pub status: AuditStatus,
    /// Lines on the prescription.
    pub drugs_requested: Vec<PrescriptionDrug>,
    /// Lines actually dispensed (empty on failure).
    pub drugs_dispensed: Vec<PrescriptionDrug>,
    /// Rejection reasons, present only on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reasons: Option<Vec<String>>,
    /// When the attempt happened.
    pub timestamp: DateTime<Utc>,
}

impl AuditLog {
    /// Build the entry for one evaluated attempt.
    pub fn record(
        id: AuditLogId,
        prescription: &Prescription,
        outcome: &FulfillmentOutcome,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let (status, failure_reasons) = if outcome.is_success() {
            (AuditStatus::Success, None)
        } else {
            (AuditStatus::Failed, Some(outcome.reasons()))
        };
        Self {
            id,
            prescription_id: prescription.id.clone(),
            patient_id: prescription.patient_id.clone(),
            patient_name: prescription.patient_name.clone(),
            pharmacy_id: prescription.pharmacy_id.clone(),
            pharmacy_name: prescription.pharmacy_name.clone(),
            status,
            drugs_requested: prescription.drugs.clone(),
            drugs_dispensed: outcome.dispensed().to_vec(),
            failure_reasons,
            timestamp,
        }
    }
}

/// Audit log query. Every provided field must match exactly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditFilter {
    /// Exact patient id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<String>,
    /// Exact pharmacy id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pharmacy_id: Option<String>,
    /// Exact outcome.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<AuditStatus>,
}

impl AuditFilter {
    /// Whether `log` passes the filter.
    pub fn matches(&self, log: &AuditLog) -> bool {
        let field = |expected: &Option<String>, actual: &str| {
            expected
                .as_deref()
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .map_or(true, |e| e == actual)
        };
        field(&self.patient_id, log.patient_id.as_str())
            && field(&self.pharmacy_id, log.pharmacy_id.as_str())
            && self.status.map_or(true, |s| s == log.status)
    }
}
