//! # Pharmacy API
//!
//! Read-only access to pharmacy branches and their allocation tables.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use rxdesk_core::{Pharmacy, PharmacyFilter, PharmacyId};

use crate::error::AppError;
use crate::extractors::{extract_query, parse_path_id};
use crate::state::AppState;

/// Build the pharmacies router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/pharmacies", get(list_pharmacies))
        .route("/v1/pharmacies/:id", get(get_pharmacy))
}

/// GET /v1/pharmacies: List pharmacies.
#[utoipa::path(
    get,
    path = "/v1/pharmacies",
    params(("name" = Option<String>, Query, description = "Case-insensitive name substring")),
    responses(
        (status = 200, description = "Matching pharmacies", body = Vec<Pharmacy>),
    ),
    tag = "pharmacies"
)]
pub(crate) async fn list_pharmacies(
    State(state): State<AppState>,
    query: Result<Query<PharmacyFilter>, QueryRejection>,
) -> Result<Json<Vec<Pharmacy>>, AppError> {
    let filter = extract_query(query)?;
    let pharmacies = state.pharmacies.read(|m| {
        m.values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect::<Vec<_>>()
    });
    Ok(Json(pharmacies))
}

/// GET /v1/pharmacies/:id: Get one pharmacy with its allocations.
#[utoipa::path(
    get,
    path = "/v1/pharmacies/{id}",
    params(("id" = String, Path, description = "Pharmacy id")),
    responses(
        (status = 200, description = "Pharmacy found", body = Pharmacy),
        (status = 404, description = "Pharmacy not found", body = crate::error::ErrorBody),
    ),
    tag = "pharmacies"
)]
pub(crate) async fn get_pharmacy(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Json<Pharmacy>, AppError> {
    let id: PharmacyId = parse_path_id(&raw, "pharmacy")?;
    state
        .pharmacies
        .get(&id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("pharmacy {id}")))
}
