//! # Authentication & Authorization Middleware
//!
//! Bearer token middleware with role-based access control.
//!
//! ## Token Sources
//!
//! ```text
//! Bearer {AUTH_TOKEN}       : static operator token, treated as admin
//! Bearer {session token}    : issued by POST /v1/auth/login
//! ```
//!
//! With no `Authorization` header the request is rejected when
//! `require_auth` is set; otherwise it runs as the admin (development mode).
//!
//! ## CallerIdentity
//!
//! Every request that passes the middleware gets a [`CallerIdentity`] in
//! its extensions. Handlers extract it via the `FromRequestParts` impl.

use axum::extract::Request;
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use rxdesk_core::UserId;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use utoipa::ToSchema;

use crate::accounts::{Accounts, DEFAULT_ADMIN_USERNAME};
use crate::error::{AppError, ErrorBody, ErrorDetail};

// ── Role ────────────────────────────────────────────────────────────────────

/// Account roles, ordered by privilege.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Read access and prescription fulfillment.
    User,
    /// Everything, including drug catalog changes.
    Admin,
}

impl Role {
    /// Return the string representation of this role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}

// ── CallerIdentity ──────────────────────────────────────────────────────────

/// Identity of the authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    /// The caller's role.
    pub role: Role,
    /// The account, when the caller logged in. `None` for the static token.
    pub user_id: Option<UserId>,
    /// Display name used in logs.
    pub username: String,
    /// The session token the request carried, if any.
    pub session_token: Option<String>,
}

impl CallerIdentity {
    /// The operator identity used for the static token and for open mode.
    pub fn operator() -> Self {
        Self {
            role: Role::Admin,
            user_id: None,
            username: DEFAULT_ADMIN_USERNAME.to_string(),
            session_token: None,
        }
    }

    /// Check if the caller has at least the given minimum role.
    pub fn has_role(&self, minimum: Role) -> bool {
        self.role >= minimum
    }
}

#[axum::async_trait]
impl<S: Send + Sync> axum::extract::FromRequestParts<S> for CallerIdentity {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CallerIdentity>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("no caller identity in request context".into()))
    }
}

/// Check that the caller has at least the required role.
/// Returns 403 Forbidden if the caller's role is insufficient.
pub fn require_role(caller: &CallerIdentity, minimum: Role) -> Result<(), AppError> {
    if caller.has_role(minimum) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "role '{}' required, caller has '{}'",
            minimum.as_str(),
            caller.role.as_str()
        )))
    }
}

// ── Auth Configuration ──────────────────────────────────────────────────────

/// Auth configuration injected into request extensions.
///
/// Custom `Debug` redacts the token value.
#[derive(Clone)]
pub struct AuthConfig {
    pub token: Option<String>,
    pub require_auth: bool,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("require_auth", &self.require_auth)
            .finish()
    }
}

// ── Token Validation ────────────────────────────────────────────────────────

/// Constant-time comparison of bearer tokens.
fn constant_time_token_eq(provided: &str, expected: &str) -> bool {
    let provided = provided.as_bytes();
    let expected = expected.as_bytes();
    if provided.len() != expected.len() {
        let _ = expected.ct_eq(expected);
        return false;
    }
    provided.ct_eq(expected).into()
}

/// Resolve a bearer token to a caller.
pub fn resolve_bearer_token(
    provided: &str,
    config: &AuthConfig,
    accounts: Option<&Accounts>,
) -> Result<CallerIdentity, String> {
    if let Some(expected) = &config.token {
        if constant_time_token_eq(provided, expected) {
            return Ok(CallerIdentity::operator());
        }
    }
    accounts
        .and_then(|a| a.session_user(provided))
        .map(|user| CallerIdentity {
            role: user.role,
            user_id: Some(user.id),
            username: user.username,
            session_token: Some(provided.to_string()),
        })
        .ok_or_else(|| "invalid bearer token".to_string())
}

// ── Middleware ───────────────────────────────────────────────────────────────

/// Authenticate the request and inject a [`CallerIdentity`].
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let config = request
        .extensions()
        .get::<AuthConfig>()
        .cloned()
        .unwrap_or(AuthConfig {
            token: None,
            require_auth: false,
        });
    let accounts = request.extensions().get::<Accounts>().cloned();

    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let identity = match auth_header {
        Some(value) => match value.strip_prefix("Bearer ") {
            Some(provided) => resolve_bearer_token(provided.trim(), &config, accounts.as_ref()),
            None => Err("authorization header must use Bearer scheme".to_string()),
        },
        None if config.require_auth => Err("missing authorization header".to_string()),
        None => Ok(CallerIdentity::operator()),
    };

    match identity {
        Ok(identity) => {
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Err(msg) => {
            tracing::warn!(reason = %msg, "authentication failed");
            unauthorized_response(&msg)
        }
    }
}

fn unauthorized_response(message: &str) -> Response {
    let body = ErrorBody {
        error: ErrorDetail {
            code: "UNAUTHORIZED".to_string(),
            message: message.to_string(),
            details: None,
        },
    };
    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}
