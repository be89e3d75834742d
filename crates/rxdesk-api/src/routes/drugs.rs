//! # Drug Catalog API
//!
//! Listing, alerts, and admin-only create/update/delete over the drug
//! catalog. Writes take the inventory lock so they cannot interleave with
//! a fulfillment that is reading stock.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::NaiveDate;
use rxdesk_core::{AlertLevel, Drug, DrugFilter, DrugId, DrugPatch, NewDrug, PrescriptionStatus};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::{require_role, CallerIdentity, Role};
use crate::error::AppError;
use crate::extractors::{extract_json, extract_query, parse_path_id};
use crate::state::AppState;

/// A drug that needs attention.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DrugAlert {
    #[serde(flatten)]
    pub drug: Drug,
    /// `high` when expired or critically low, `medium` when low.
    pub level: AlertLevel,
    /// Short status text, e.g. "expired" or "low".
    pub label: String,
    /// Stock as a percentage of capacity.
    pub stock_percentage: u8,
}

/// Build the alert for `drug`, or `None` when it needs no attention.
///
/// `threshold` can raise the low-stock line above the default; a drug that
/// is only low by that configured line is reported at `medium`.
pub fn alert_for(drug: &Drug, today: NaiveDate, threshold: u32) -> Option<DrugAlert> {
    let (level, label) = drug.alert(today, threshold)?;
    Some(DrugAlert {
        drug: drug.clone(),
        level,
        label: label.to_string(),
        stock_percentage: drug.stock_percentage(),
    })
}

/// Build the drugs router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/drugs", get(list_drugs).post(create_drug))
        .route("/v1/drugs/alerts", get(drug_alerts))
        .route(
            "/v1/drugs/:id",
            get(get_drug).put(update_drug).delete(delete_drug),
        )
}

/// GET /v1/drugs: List drugs matching the filter.
#[utoipa::path(
    get,
    path = "/v1/drugs",
    params(
        ("name" = Option<String>, Query, description = "Case-insensitive name substring"),
        ("manufacturer" = Option<String>, Query, description = "Case-insensitive manufacturer substring"),
        ("stockStatus" = Option<StockStatus>, Query, description = "normal, low, or critical"),
        ("expiresBefore" = Option<String>, Query, description = "YYYY-MM-DD, inclusive"),
    ),
    responses(
        (status = 200, description = "Matching drugs", body = Vec<Drug>),
        (status = 400, description = "Malformed query", body = crate::error::ErrorBody),
    ),
    tag = "drugs"
)]
pub(crate) async fn list_drugs(
    State(state): State<AppState>,
    query: Result<Query<DrugFilter>, QueryRejection>,
) -> Result<Json<Vec<Drug>>, AppError> {
    let filter = extract_query(query)?;
    let drugs = state.drugs.read(|m| {
        m.values()
            .filter(|d| filter.matches(d))
            .cloned()
            .collect::<Vec<_>>()
    });
    Ok(Json(drugs))
}

/// GET /v1/drugs/alerts: Drugs that are expired or low on stock.
#[utoipa::path(
    get,
    path = "/v1/drugs/alerts",
    responses(
        (status = 200, description = "Drugs needing attention, most severe first", body = Vec<DrugAlert>),
    ),
    tag = "drugs"
)]
pub(crate) async fn drug_alerts(State(state): State<AppState>) -> Json<Vec<DrugAlert>> {
    let today = state.clock.today();
    let threshold = state.config.low_stock_threshold;
    let mut alerts: Vec<DrugAlert> = state.drugs.read(|m| {
        m.values()
            .filter_map(|d| alert_for(d, today, threshold))
            .collect()
    });
    alerts.sort_by(|a, b| b.level.cmp(&a.level).then_with(|| a.drug.id.cmp(&b.drug.id)));
    Json(alerts)
}

/// GET /v1/drugs/:id: Get one drug.
#[utoipa::path(
    get,
    path = "/v1/drugs/{id}",
    params(("id" = String, Path, description = "Drug id")),
    responses(
        (status = 200, description = "Drug found", body = Drug),
        (status = 404, description = "Drug not found", body = crate::error::ErrorBody),
    ),
    tag = "drugs"
)]
pub(crate) async fn get_drug(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Json<Drug>, AppError> {
    let id: DrugId = parse_path_id(&raw, "drug")?;
    state
        .drugs
        .get(&id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("drug {id}")))
}

/// POST /v1/drugs: Add a drug to the catalog (admin).
#[utoipa::path(
    post,
    path = "/v1/drugs",
    request_body = NewDrug,
    responses(
        (status = 201, description = "Drug created", body = Drug),
        (status = 403, description = "Caller is not an admin", body = crate::error::ErrorBody),
        (status = 422, description = "Validation failed", body = crate::error::ErrorBody),
    ),
    tag = "drugs"
)]
pub(crate) async fn create_drug(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<NewDrug>, JsonRejection>,
) -> Result<(StatusCode, Json<Drug>), AppError> {
    require_role(&caller, Role::Admin)?;
    let req = extract_json(body)?;
    req.validate(state.clock.today())?;

    let _inventory = state.lock_inventory();
    let id = state.drugs.read(|m| DrugId::next_after(m.keys()))?;
    let drug = req.into_drug(id.clone());
    state.drugs.insert(id, drug.clone());
    tracing::info!(drug_id = %drug.id, by = %caller.username, "drug created");
    Ok((StatusCode::CREATED, Json(drug)))
}

/// PUT /v1/drugs/:id: Update provided fields of a drug (admin).
#[utoipa::path(
    put,
    path = "/v1/drugs/{id}",
    params(("id" = String, Path, description = "Drug id")),
    request_body = DrugPatch,
    responses(
        (status = 200, description = "Drug updated", body = Drug),
        (status = 403, description = "Caller is not an admin", body = crate::error::ErrorBody),
        (status = 404, description = "Drug not found", body = crate::error::ErrorBody),
        (status = 422, description = "Validation failed", body = crate::error::ErrorBody),
    ),
    tag = "drugs"
)]
pub(crate) async fn update_drug(
    State(state): State<AppState>,
    Path(raw): Path<String>,
    caller: CallerIdentity,
    body: Result<Json<DrugPatch>, JsonRejection>,
) -> Result<Json<Drug>, AppError> {
    require_role(&caller, Role::Admin)?;
    let id: DrugId = parse_path_id(&raw, "drug")?;
    let patch = extract_json(body)?;
    patch.validate(state.clock.today())?;

    let _inventory = state.lock_inventory();
    let drug = state
        .drugs
        .update(&id, |d| patch.apply(d))
        .ok_or_else(|| AppError::NotFound(format!("drug {id}")))?;
    tracing::info!(drug_id = %id, by = %caller.username, "drug updated");
    Ok(Json(drug))
}

/// DELETE /v1/drugs/:id: Remove a drug (admin).
///
/// Refused while a pending prescription still requests the drug.
#[utoipa::path(
    delete,
    path = "/v1/drugs/{id}",
    params(("id" = String, Path, description = "Drug id")),
    responses(
        (status = 204, description = "Drug deleted"),
        (status = 403, description = "Caller is not an admin", body = crate::error::ErrorBody),
        (status = 404, description = "Drug not found", body = crate::error::ErrorBody),
        (status = 409, description = "A pending prescription references the drug", body = crate::error::ErrorBody),
    ),
    tag = "drugs"
)]
pub(crate) async fn delete_drug(
    State(state): State<AppState>,
    Path(raw): Path<String>,
    caller: CallerIdentity,
) -> Result<StatusCode, AppError> {
    require_role(&caller, Role::Admin)?;
    let id: DrugId = parse_path_id(&raw, "drug")?;

    let _inventory = state.lock_inventory();
    if !state.drugs.contains(&id) {
        return Err(AppError::NotFound(format!("drug {id}")));
    }
    let blocking: Vec<String> = state.prescriptions.read(|m| {
        m.values()
            .filter(|rx| rx.status == PrescriptionStatus::Pending && rx.requests(&id))
            .map(|rx| rx.id.to_string())
            .collect()
    });
    if !blocking.is_empty() {
        return Err(AppError::Conflict(format!(
            "drug {id} is requested by pending prescriptions: {}",
            blocking.join(", ")
        )));
    }
    state.drugs.remove(&id);
    tracing::info!(drug_id = %id, by = %caller.username, "drug deleted");
    Ok(StatusCode::NO_CONTENT)
}
