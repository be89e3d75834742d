//! # Account API
//!
//! Captcha, login, registration, logout, and the current user. Captcha,
//! login and registration are public; logout and `me` sit behind the auth
//! middleware like every other `/v1` route.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::accounts::{Registration, User};
use crate::auth::CallerIdentity;
use crate::error::AppError;
use crate::extractors::{extract_json, extract_validated_json, Validate};
use crate::state::AppState;

/// Freshly issued captcha.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CaptchaResponse {
    pub success: bool,
    pub captcha: String,
    pub captcha_id: String,
}

/// Login form.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    pub captcha: String,
    pub captcha_id: String,
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<(), String> {
        if self.username.trim().is_empty() || self.password.is_empty() {
            return Err("username and password must not be empty".to_string());
        }
        Ok(())
    }
}

/// Registration form.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub captcha: String,
    pub captcha_id: String,
}

/// Result of an account operation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    /// Session token to send as `Authorization: Bearer <token>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// Routes reachable without credentials.
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/v1/auth/captcha", get(captcha))
        .route("/v1/auth/login", post(login))
        .route("/v1/auth/register", post(register))
}

/// Routes that need an authenticated caller.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/auth/logout", post(logout))
        .route("/v1/auth/me", get(me))
}

/// GET /v1/auth/captcha: Issue a single-use captcha.
#[utoipa::path(
    get,
    path = "/v1/auth/captcha",
    responses((status = 200, description = "Captcha issued", body = CaptchaResponse)),
    tag = "auth"
)]
pub(crate) async fn captcha(State(state): State<AppState>) -> Json<CaptchaResponse> {
    let (captcha_id, captcha) = state.accounts.issue_captcha();
    Json(CaptchaResponse {
        success: true,
        captcha,
        captcha_id,
    })
}

/// POST /v1/auth/login: Open a session.
#[utoipa::path(
    post,
    path = "/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = AuthResponse),
        (status = 401, description = "Invalid credentials", body = crate::error::ErrorBody),
        (status = 422, description = "Invalid captcha", body = crate::error::ErrorBody),
    ),
    tag = "auth"
)]
pub(crate) async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, AppError> {
    let req = extract_validated_json(body)?;
    state.accounts.verify_captcha(&req.captcha_id, &req.captcha)?;
    let (user, token) = state.accounts.login(&req.username, &req.password)?;
    Ok(Json(AuthResponse {
        success: true,
        message: Some("login successful".to_string()),
        user: Some(user),
        token: Some(token),
    }))
}

/// POST /v1/auth/register: Create a `user`-role account.
#[utoipa::path(
    post,
    path = "/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 409, description = "Username or email taken", body = crate::error::ErrorBody),
        (status = 422, description = "Form or captcha invalid", body = crate::error::ErrorBody),
    ),
    tag = "auth"
)]
pub(crate) async fn register(
    State(state): State<AppState>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let req = extract_json(body)?;
    state.accounts.verify_captcha(&req.captcha_id, &req.captcha)?;
    let user = state.accounts.register(&Registration {
        username: req.username,
        email: req.email,
        password: req.password,
        confirm_password: req.confirm_password,
    })?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            success: true,
            message: Some("registration successful".to_string()),
            user: Some(user),
            token: None,
        }),
    ))
}

/// POST /v1/auth/logout: Close the caller's session.
#[utoipa::path(
    post,
    path = "/v1/auth/logout",
    responses((status = 200, description = "Logged out", body = AuthResponse)),
    tag = "auth"
)]
pub(crate) async fn logout(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> Json<AuthResponse> {
    if let Some(token) = &caller.session_token {
        state.accounts.logout(token);
        tracing::info!(username = %caller.username, "logout");
    }
    Json(AuthResponse {
        success: true,
        message: Some("logged out".to_string()),
        user: None,
        token: None,
    })
}

/// GET /v1/auth/me: The caller's account.
///
/// Static-token and open-mode callers have no account and get a 404.
#[utoipa::path(
    get,
    path = "/v1/auth/me",
    responses(
        (status = 200, description = "Current account", body = User),
        (status = 404, description = "Caller has no account", body = crate::error::ErrorBody),
    ),
    tag = "auth"
)]
pub(crate) async fn me(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> Result<Json<User>, AppError> {
    caller
        .session_token
        .as_deref()
        .and_then(|token| state.accounts.session_user(token))
        .map(Json)
        .ok_or_else(|| AppError::NotFound("no account for the operator token".to_string()))
}
