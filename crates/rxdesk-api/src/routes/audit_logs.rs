//! # Audit Log API

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use rxdesk_core::{AuditFilter, AuditLog};

use crate::error::AppError;
use crate::extractors::extract_query;
use crate::state::AppState;

/// Build the audit log router.
pub fn router() -> Router<AppState> {
    Router::new().route("/v1/audit-logs", get(list_audit_logs))
}

/// GET /v1/audit-logs: Fulfillment history, oldest first.
#[utoipa::path(
    get,
    path = "/v1/audit-logs",
    params(
        ("patientId" = Option<String>, Query, description = "Exact patient id"),
        ("pharmacyId" = Option<String>, Query, description = "Exact pharmacy id"),
        ("status" = Option<AuditStatus>, Query, description = "SUCCESS or FAILED"),
    ),
    responses(
        (status = 200, description = "Matching audit entries", body = Vec<AuditLog>),
        (status = 400, description = "Malformed query", body = crate::error::ErrorBody),
    ),
    tag = "audit"
)]
pub(crate) async fn list_audit_logs(
    State(state): State<AppState>,
    query: Result<Query<AuditFilter>, QueryRejection>,
) -> Result<Json<Vec<AuditLog>>, AppError> {
    let filter = extract_query(query)?;
    let mut logs: Vec<AuditLog> = state.audit_logs.read(|m| {
        m.values()
            .filter(|log| filter.matches(log))
            .cloned()
            .collect()
    });
    logs.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id)));
    Ok(Json(logs))
}
