//! # rxdesk-api: Axum API Service for the rxdesk Back Office
//!
//! Serves the drug catalog, pharmacies, prescriptions, fulfillment, audit
//! logs, and back-office accounts from in-memory tables seeded at startup.
//!
//! ## API Surface
//!
//! | Prefix                 | Module                        |
//! |------------------------|-------------------------------|
//! | `/v1/drugs/*`          | [`routes::drugs`]             |
//! | `/v1/pharmacies/*`     | [`routes::pharmacies`]        |
//! | `/v1/prescriptions/*`  | [`routes::prescriptions`]     |
//! | `/v1/audit-logs`       | [`routes::audit_logs`]        |
//! | `/v1/dashboard`        | [`routes::dashboard`]         |
//! | `/v1/auth/*`           | [`routes::auth`]              |
//! | `/health/*`            | probes and counters (no auth) |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → MetricsMiddleware → AuthMiddleware → Handler
//! TraceLayer → MetricsMiddleware → RateLimitMiddleware → account handlers
//! ```
//!
//! ## OpenAPI
//!
//! Generated via utoipa derive macros at `/openapi.json`.

pub mod accounts;
pub mod auth;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

pub use error::AppError;
pub use state::{AppConfig, AppState};

use axum::middleware::from_fn;
use axum::routing::get;
use axum::{Extension, Json, Router};
use tower_http::trace::TraceLayer;

use crate::auth::AuthConfig;
use crate::middleware::metrics::{ApiMetrics, MetricsSnapshot};
use crate::middleware::rate_limit::RateLimiter;

/// Assemble the full application router with all routes and middleware.
///
/// Health probes, the captcha, login and registration are mounted outside
/// the auth middleware; the account routes among them are rate limited
/// per client address.
pub fn app(state: AppState) -> Router {
    let auth_config = AuthConfig {
        token: state.config.auth_token.clone(),
        require_auth: state.config.require_auth,
    };
    let limiter = RateLimiter::new(state.config.auth_rate_limit);

    // Authenticated API routes.
    let api = Router::new()
        .merge(routes::drugs::router())
        .merge(routes::pharmacies::router())
        .merge(routes::prescriptions::router())
        .merge(routes::audit_logs::router())
        .merge(routes::dashboard::router())
        .merge(routes::auth::router())
        .merge(openapi::router())
        .layer(from_fn(auth::auth_middleware));

    // Unauthenticated routes.
    let public = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness))
        .route("/health/metrics", get(metrics))
        .merge(
            routes::auth::public_router()
                .route_layer(from_fn(middleware::rate_limit::rate_limit_middleware))
                .route_layer(Extension(limiter)),
        );

    Router::new()
        .merge(public)
        .merge(api)
        .layer(from_fn(middleware::metrics::metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(Extension(auth_config))
        .layer(Extension(state.accounts.clone()))
        .layer(Extension(state.metrics.clone()))
        .with_state(state)
}

/// Liveness probe: always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe: returns 200 when the application is ready to serve.
async fn readiness() -> &'static str {
    "ready"
}

/// Request and fulfillment counters.
async fn metrics(Extension(metrics): Extension<ApiMetrics>) -> Json<MetricsSnapshot> {
    Json(metrics.snapshot())
}
