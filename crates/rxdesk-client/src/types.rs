//! Wire types for responses that have no counterpart in `rxdesk-core`.
//!
//! Records shared with the server (drugs, prescriptions, audit logs) use the
//! core types directly. Fields use `#[serde(default)]` where the server may
//! omit them.

use chrono::{DateTime, Utc};
use rxdesk_core::{AlertLevel, Drug, UserId};
use serde::{Deserialize, Serialize};

// -- Drugs --------------------------------------------------------------------

/// A drug that is expired or low on stock, as returned by `/v1/drugs/alerts`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrugAlert {
    #[serde(flatten)]
    pub drug: Drug,
    pub level: AlertLevel,
    pub label: String,
    pub stock_percentage: u8,
}

// -- Dashboard ----------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrugCounts {
    pub total: usize,
    pub low_stock: usize,
    pub expired: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionCounts {
    pub total: usize,
    pub pending: usize,
    pub fulfilled: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditCounts {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
}

/// Headline counts from `/v1/dashboard`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub drugs: DrugCounts,
    pub pharmacies: usize,
    pub prescriptions: PrescriptionCounts,
    pub audit_logs: AuditCounts,
}

// -- Accounts -----------------------------------------------------------------

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

/// A back-office account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A captcha challenge. The code is returned in clear for display.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Captcha {
    pub captcha: String,
    pub captcha_id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    pub captcha: String,
    pub captcha_id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub captcha: String,
    pub captcha_id: String,
}

/// Response of login, registration and logout.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub token: Option<String>,
}

/// Request and fulfillment counters from `/health/metrics`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub requests: u64,
    pub errors: u64,
    pub fulfillments_succeeded: u64,
    pub fulfillments_failed: u64,
}
