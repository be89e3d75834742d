//! # Dashboard API
//!
//! One call returning the headline counts shown on the back-office home
//! screen.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use rxdesk_core::{AuditStatus, PrescriptionStatus};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::state::AppState;

/// Drug catalog counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DrugCounts {
    pub total: usize,
    /// Below the configured low-stock threshold.
    pub low_stock: usize,
    pub expired: usize,
}

/// Prescription counts by status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionCounts {
    pub total: usize,
    pub pending: usize,
    pub fulfilled: usize,
    pub failed: usize,
}

/// Audit log counts by outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuditCounts {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
}

/// Dashboard summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub drugs: DrugCounts,
    pub pharmacies: usize,
    pub prescriptions: PrescriptionCounts,
    pub audit_logs: AuditCounts,
}

/// Build the dashboard router.
pub fn router() -> Router<AppState> {
    Router::new().route("/v1/dashboard", get(dashboard))
}

/// Compute the summary from the current state.
pub fn summarize(state: &AppState) -> DashboardSummary {
    let today = state.clock.today();
    let threshold = state.config.low_stock_threshold;

    let drugs = state.drugs.read(|m| DrugCounts {
        total: m.len(),
        low_stock: m.values().filter(|d| d.is_low_stock(threshold)).count(),
        expired: m.values().filter(|d| d.is_expired(today)).count(),
    });

    let prescriptions = state.prescriptions.read(|m| {
        m.values()
            .fold(PrescriptionCounts::default(), |mut acc, rx| {
                acc.total += 1;
                match rx.status {
                    PrescriptionStatus::Pending => acc.pending += 1,
                    PrescriptionStatus::Fulfilled => acc.fulfilled += 1,
                    PrescriptionStatus::Failed => acc.failed += 1,
                }
                acc
            })
    });

    let audit_logs = state.audit_logs.read(|m| {
        m.values().fold(AuditCounts::default(), |mut acc, log| {
            acc.total += 1;
            match log.status {
                AuditStatus::Success => acc.success += 1,
                AuditStatus::Failed => acc.failed += 1,
            }
            acc
        })
    });

    DashboardSummary {
        drugs,
        pharmacies: state.pharmacies.len(),
        prescriptions,
        audit_logs,
    }
}

/// GET /v1/dashboard: Headline counts.
#[utoipa::path(
    get,
    path = "/v1/dashboard",
    responses(
        (status = 200, description = "Dashboard summary", body = DashboardSummary),
    ),
    tag = "dashboard"
)]
pub(crate) async fn dashboard(State(state): State<AppState>) -> Json<DashboardSummary> {
    Json(summarize(&state))
}
