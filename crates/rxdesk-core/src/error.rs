//! # Error Hierarchy
//!
//! Structured error types for rxdesk, built with `thiserror`.
//!
//! [`ValidationError`] covers malformed input at the edges (identifiers,
//! dates, form fields). [`RxError`] is the top-level type for operations
//! that also touch files or serialization.

use chrono::NaiveDate;
use thiserror::Error;

/// Top-level error type for rxdesk domain operations.
#[derive(Error, Debug)]
pub enum RxError {
    /// Input failed validation.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A referenced record does not exist.
    #[error("{kind} {id} not found")]
    NotFound {
        /// Record kind ("drug", "pharmacy", ...).
        kind: &'static str,
        /// The identifier that was looked up.
        id: String,
    },

    /// Every sequential id of a kind is taken.
    #[error("no {kind} ids left to issue")]
    IdsExhausted {
        /// Record kind ("drug", "audit log", ...).
        kind: &'static str,
    },

    /// A dataset is internally inconsistent (e.g. duplicate ids).
    #[error("dataset error: {0}")]
    Dataset(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization/deserialization error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Validation errors for identifiers, dates, and submitted forms.
///
/// Each variant carries the offending value or field name so the message
/// can be returned to an API caller as-is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Identifier is empty, too long, or contains disallowed characters.
    #[error("invalid {kind} id: \"{value}\" (expected 1-64 ASCII letters, digits, '-' or '_')")]
    InvalidId {
        /// Identifier kind ("drug", "pharmacy", ...).
        kind: &'static str,
        /// The rejected input.
        value: String,
    },

    /// A required text field is empty or whitespace.
    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    /// A drug's expiry date is today or in the past.
    #[error("expiry {expiry} must be a future date (today is {today})")]
    ExpiryNotInFuture {
        /// The submitted expiry.
        expiry: NaiveDate,
        /// The date it was checked against.
        today: NaiveDate,
    },

    /// Date string is not `YYYY-MM-DD`.
    #[error("invalid date: \"{value}\" (expected YYYY-MM-DD)")]
    InvalidDate {
        /// The rejected input.
        value: String,
    },

    /// Password and confirmation differ.
    #[error("password confirmation does not match")]
    PasswordMismatch,

    /// Email address has no `@` or an empty local/domain part.
    #[error("invalid email address: \"{0}\"")]
    InvalidEmail(String),

    /// A text field is shorter than its minimum length.
    #[error("{field} must be at least {min} characters")]
    FieldTooShort {
        /// Field name.
        field: &'static str,
        /// Minimum length in characters.
        min: usize,
    },

    /// Unknown audit status name.
    #[error("invalid status: \"{0}\" (expected SUCCESS or FAILED)")]
    InvalidStatus(String),
}
