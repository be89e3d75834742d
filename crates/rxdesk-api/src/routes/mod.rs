//! # API Route Modules
//!
//! - `drugs`: drug catalog, alerts, admin writes.
//! - `pharmacies`: pharmacy branches and allocations.
//! - `prescriptions`: listing and fulfillment.
//! - `audit_logs`: fulfillment history.
//! - `dashboard`: headline counts.
//! - `auth`: captcha, login, registration, sessions.

pub mod audit_logs;
pub mod auth;
pub mod dashboard;
pub mod drugs;
pub mod pharmacies;
pub mod prescriptions;
