//! # Prescription API
//!
//! Listing, detail, and fulfillment. Fulfillment is the one write path
//! that touches three tables: it decrements drug stock, flips the
//! prescription status, and appends an audit log entry, all under the
//! inventory lock.

use std::collections::BTreeMap;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use rxdesk_core::fulfillment::evaluate;
use rxdesk_core::{
    AuditLog, AuditLogId, DrugId, FulfillmentOutcome, FulfillmentResponse, Prescription,
    PrescriptionDrug, PrescriptionFilter, PrescriptionId, PrescriptionStatus,
};

use crate::auth::CallerIdentity;
use crate::error::AppError;
use crate::extractors::{extract_query, parse_path_id};
use crate::state::AppState;

/// Build the prescriptions router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/prescriptions", get(list_prescriptions))
        .route("/v1/prescriptions/:id", get(get_prescription))
        .route("/v1/prescriptions/:id/fulfill", post(fulfill_prescription))
}

/// Evaluate a prescription and apply the outcome.
///
/// A fulfilled prescription is rejected with a conflict. Pending and
/// failed prescriptions are evaluated; success dispenses stock and marks
/// the prescription `FULFILLED`, failure marks it `FAILED`. Either way an
/// audit entry is appended.
pub fn fulfill(state: &AppState, id: &PrescriptionId) -> Result<FulfillmentOutcome, AppError> {
    let _inventory = state.lock_inventory();

    let rx = state
        .prescriptions
        .get(id)
        .ok_or_else(|| AppError::NotFound(format!("prescription {id}")))?;
    if !rx.is_fulfillable() {
        return Err(AppError::Conflict(format!(
            "prescription {id} is already {}",
            rx.status
        )));
    }

    let pharmacy = state.pharmacies.get(&rx.pharmacy_id);
    let today = state.clock.today();
    let outcome = state
        .drugs
        .read(|drugs| evaluate(&rx, drugs, pharmacy.as_ref(), today));

    let log_id = state.audit_logs.read(|m| AuditLogId::next_after(m.keys()))?;
    dispense(state, outcome.dispensed())?;
    let status = if outcome.is_success() {
        PrescriptionStatus::Fulfilled
    } else {
        PrescriptionStatus::Failed
    };
    state.prescriptions.update(id, |p| p.status = status);

    let log = AuditLog::record(log_id.clone(), &rx, &outcome, state.clock.now());
    state.audit_logs.insert(log_id.clone(), log);
    state.metrics.record_fulfillment(outcome.is_success());

    if outcome.is_success() {
        tracing::info!(
            prescription_id = %id,
            audit_log_id = %log_id,
            lines = outcome.dispensed().len(),
            "prescription fulfilled"
        );
    } else {
        tracing::warn!(
            prescription_id = %id,
            audit_log_id = %log_id,
            reasons = ?outcome.reasons(),
            "prescription fulfillment failed"
        );
    }
    Ok(outcome)
}

/// Decrement stock for every dispensed line in one write.
///
/// Nothing is written unless every line fits the stock left after the
/// lines before it; a shortfall here means the evaluation and the table
/// disagree, and surfaces as an internal error.
fn dispense(state: &AppState, lines: &[PrescriptionDrug]) -> Result<(), AppError> {
    state.drugs.write(|drugs| {
        let mut remaining: BTreeMap<DrugId, u32> = BTreeMap::new();
        for line in lines {
            let stock = match remaining.get(&line.drug_id) {
                Some(left) => *left,
                None => drugs
                    .get(&line.drug_id)
                    .map(|d| d.stock)
                    .ok_or_else(|| AppError::Internal(format!("drug {} vanished", line.drug_id)))?,
            };
            let left = stock.checked_sub(line.dosage).ok_or_else(|| {
                AppError::Internal(format!(
                    "dispensing {} of drug {} exceeds stock {stock}",
                    line.dosage, line.drug_id
                ))
            })?;
            remaining.insert(line.drug_id.clone(), left);
        }
        for (id, left) in remaining {
            if let Some(drug) = drugs.get_mut(&id) {
                drug.stock = left;
            }
        }
        Ok(())
    })
}

/// GET /v1/prescriptions: List prescriptions matching the filter.
#[utoipa::path(
    get,
    path = "/v1/prescriptions",
    params(
        ("patientId" = Option<String>, Query, description = "Exact patient id"),
        ("pharmacyId" = Option<String>, Query, description = "Exact pharmacy id"),
        ("status" = Option<PrescriptionStatus>, Query, description = "PENDING, FULFILLED, or FAILED"),
        ("createdFrom" = Option<String>, Query, description = "YYYY-MM-DD, inclusive"),
        ("createdTo" = Option<String>, Query, description = "YYYY-MM-DD, inclusive"),
    ),
    responses(
        (status = 200, description = "Matching prescriptions", body = Vec<Prescription>),
        (status = 400, description = "Malformed query", body = crate::error::ErrorBody),
    ),
    tag = "prescriptions"
)]
pub(crate) async fn list_prescriptions(
    State(state): State<AppState>,
    query: Result<Query<PrescriptionFilter>, QueryRejection>,
) -> Result<Json<Vec<Prescription>>, AppError> {
    let filter = extract_query(query)?;
    let prescriptions = state.prescriptions.read(|m| {
        m.values()
            .filter(|rx| filter.matches(rx))
            .cloned()
            .collect::<Vec<_>>()
    });
    Ok(Json(prescriptions))
}

/// GET /v1/prescriptions/:id: Get one prescription.
#[utoipa::path(
    get,
    path = "/v1/prescriptions/{id}",
    params(("id" = String, Path, description = "Prescription id")),
    responses(
        (status = 200, description = "Prescription found", body = Prescription),
        (status = 404, description = "Prescription not found", body = crate::error::ErrorBody),
    ),
    tag = "prescriptions"
)]
pub(crate) async fn get_prescription(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Json<Prescription>, AppError> {
    let id: PrescriptionId = parse_path_id(&raw, "prescription")?;
    state
        .prescriptions
        .get(&id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("prescription {id}")))
}

/// POST /v1/prescriptions/:id/fulfill: Attempt to fulfill a prescription.
///
/// Returns 200 with `{"success":true}` or 400 with the failure reasons.
#[utoipa::path(
    post,
    path = "/v1/prescriptions/{id}/fulfill",
    params(("id" = String, Path, description = "Prescription id")),
    responses(
        (status = 200, description = "Prescription fulfilled", body = FulfillmentResponse),
        (status = 400, description = "Fulfillment rejected", body = FulfillmentResponse),
        (status = 404, description = "Prescription not found", body = crate::error::ErrorBody),
        (status = 409, description = "Prescription already fulfilled", body = crate::error::ErrorBody),
    ),
    tag = "prescriptions"
)]
pub(crate) async fn fulfill_prescription(
    State(state): State<AppState>,
    Path(raw): Path<String>,
    caller: CallerIdentity,
) -> Result<(StatusCode, Json<FulfillmentResponse>), AppError> {
    let id: PrescriptionId = parse_path_id(&raw, "prescription")?;
    tracing::debug!(prescription_id = %id, by = %caller.username, "fulfillment requested");
    let outcome = fulfill(&state, &id)?;
    let status = if outcome.is_success() {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    };
    Ok((status, Json(outcome.to_response())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppConfig;
    use rxdesk_core::Dataset;

    fn state() -> AppState {
        AppState::from_dataset(AppConfig::default(), Dataset::demo().unwrap())
    }

    fn line(drug: &str, dosage: u32) -> PrescriptionDrug {
        PrescriptionDrug {
            drug_id: DrugId::new(drug).unwrap(),
            drug_name: None,
            dosage,
        }
    }

    fn stock(state: &AppState, drug: &str) -> u32 {
        state.drugs.get(&DrugId::new(drug).unwrap()).unwrap().stock
    }

    #[test]
    fn dispense_sums_repeated_lines() {
        let state = state();
        dispense(&state, &[line("D001", 100), line("D003", 30), line("D001", 50)]).unwrap();
        assert_eq!(stock(&state, "D001"), 0);
        assert_eq!(stock(&state, "D003"), 50);
    }

    #[test]
    fn dispense_beyond_stock_writes_nothing() {
        let state = state();
        let err = dispense(&state, &[line("D003", 10), line("D001", 100), line("D001", 60)])
            .unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
        assert_eq!(stock(&state, "D001"), 150);
        assert_eq!(stock(&state, "D003"), 80);
    }

    #[test]
    fn dispense_of_unknown_drug_is_internal() {
        let state = state();
        let err = dispense(&state, &[line("D009", 1)]).unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }
}
