//! # OpenAPI Specification Assembly
//!
//! Assembles all utoipa-documented routes into a single OpenAPI spec served
//! at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

/// Assembled OpenAPI spec for the entire API surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "rxdesk API",
        version = "0.1.0",
        description = "Pharmacy back office: drug catalog, pharmacies, prescription fulfillment, and audit logs.",
        license(name = "MIT")
    ),
    paths(
        // Drugs
        crate::routes::drugs::list_drugs,
        crate::routes::drugs::drug_alerts,
        crate::routes::drugs::get_drug,
        crate::routes::drugs::create_drug,
        crate::routes::drugs::update_drug,
        crate::routes::drugs::delete_drug,
        // Pharmacies
        crate::routes::pharmacies::list_pharmacies,
        crate::routes::pharmacies::get_pharmacy,
        // Prescriptions
        crate::routes::prescriptions::list_prescriptions,
        crate::routes::prescriptions::get_prescription,
        crate::routes::prescriptions::fulfill_prescription,
        // Audit
        crate::routes::audit_logs::list_audit_logs,
        // Dashboard
        crate::routes::dashboard::dashboard,
        // Auth
        crate::routes::auth::captcha,
        crate::routes::auth::login,
        crate::routes::auth::register,
        crate::routes::auth::logout,
        crate::routes::auth::me,
    ),
    components(schemas(
        // Domain records
        rxdesk_core::Drug,
        rxdesk_core::NewDrug,
        rxdesk_core::DrugPatch,
        rxdesk_core::StockStatus,
        rxdesk_core::AlertLevel,
        rxdesk_core::Pharmacy,
        rxdesk_core::AllocatedDrug,
        rxdesk_core::Prescription,
        rxdesk_core::PrescriptionDrug,
        rxdesk_core::PrescriptionStatus,
        rxdesk_core::FulfillmentResponse,
        rxdesk_core::AuditLog,
        rxdesk_core::AuditStatus,
        // Error types
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
        // Route DTOs
        crate::routes::drugs::DrugAlert,
        crate::routes::dashboard::DashboardSummary,
        crate::routes::dashboard::DrugCounts,
        crate::routes::dashboard::PrescriptionCounts,
        crate::routes::dashboard::AuditCounts,
        crate::routes::auth::CaptchaResponse,
        crate::routes::auth::LoginRequest,
        crate::routes::auth::RegisterRequest,
        crate::routes::auth::AuthResponse,
        crate::accounts::User,
        crate::auth::Role,
        crate::middleware::metrics::MetricsSnapshot,
    )),
    tags(
        (name = "drugs", description = "Drug catalog"),
        (name = "pharmacies", description = "Pharmacy branches"),
        (name = "prescriptions", description = "Prescriptions and fulfillment"),
        (name = "audit", description = "Fulfillment audit log"),
        (name = "dashboard", description = "Summary counts"),
        (name = "auth", description = "Accounts and sessions"),
    )
)]
pub struct ApiDoc;

/// Build the OpenAPI router.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

/// GET /openapi.json: Return the generated OpenAPI specification.
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
