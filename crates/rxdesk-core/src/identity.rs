//! # Identity Newtypes
//!
//! Domain-primitive newtypes for every record identifier. Each identifier
//! is a distinct type: a [`PharmacyId`] cannot be passed where a [`DrugId`]
//! is expected.
//!
//! ## Validation
//!
//! Identifiers are trimmed and must be 1-64 characters of ASCII letters,
//! digits, `-` or `_`. Validation runs on construction and on
//! deserialization, so a value of one of these types is always well formed.
//!
//! ## Sequential identifiers
//!
//! Drugs and audit logs created at runtime get human-readable sequential
//! ids (`D005`, `A003`). The next id is one past the highest numeric suffix
//! already in use, so deleting a record never causes its id to be reissued.
//! Once the suffix reaches `u32::MAX` no further id is issued.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{RxError, ValidationError};

/// Maximum identifier length in bytes.
pub const MAX_ID_LEN: usize = 64;

fn validate_id(kind: &'static str, raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    let well_formed = !trimmed.is_empty()
        && trimmed.len() <= MAX_ID_LEN
        && trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if well_formed {
        Ok(trimmed.to_string())
    } else {
        Err(ValidationError::InvalidId {
            kind,
            value: raw.to_string(),
        })
    }
}

/// Highest numeric suffix among ids of the form `{prefix}{digits}`.
fn max_sequence<'a>(prefix: &str, ids: impl IntoIterator<Item = &'a str>) -> u32 {
    ids.into_iter()
        .filter_map(|id| id.strip_prefix(prefix))
        .filter(|digits| !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()))
        .filter_map(|digits| digits.parse::<u32>().ok())
        .max()
        .unwrap_or(0)
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
        #[cfg_attr(feature = "openapi", derive(utoipa::ToSchema), schema(value_type = String))]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a validated identifier.
            pub fn new(value: impl AsRef<str>) -> Result<Self, ValidationError> {
                validate_id($kind, value.as_ref()).map(Self)
            }

            /// Return the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                Self::new(&raw).map_err(serde::de::Error::custom)
            }
        }
    };
    ($(#[$meta:meta])* $name:ident, $kind:literal, prefix = $prefix:literal) => {
        string_id!($(#[$meta])* $name, $kind);

        impl $name {
            /// Identifier prefix for sequentially numbered records.
            pub const PREFIX: &'static str = $prefix;

            /// The `n`th sequential identifier, zero-padded to three digits.
            pub fn sequential(n: u32) -> Self {
                Self(format!("{}{n:03}", $prefix))
            }

            /// The next free sequential identifier given the ids in use.
            ///
            /// Fails with [`RxError::IdsExhausted`] when the highest suffix
            /// in use is already `u32::MAX`.
            pub fn next_after<'a>(
                existing: impl IntoIterator<Item = &'a Self>,
            ) -> Result<Self, RxError> {
                let highest = max_sequence($prefix, existing.into_iter().map(|id| id.as_str()));
                highest
                    .checked_add(1)
                    .map(Self::sequential)
                    .ok_or(RxError::IdsExhausted { kind: $kind })
            }
        }
    };
}

string_id!(
    /// Identifier of a drug in the catalog (e.g. `D001`).
    DrugId,
    "drug",
    prefix = "D"
);

string_id!(
    /// Identifier of a pharmacy branch (e.g. `PH001`).
    PharmacyId,
    "pharmacy"
);

string_id!(
    /// Identifier of a prescription (e.g. `RX001`).
    PrescriptionId,
    "prescription"
);

string_id!(
    /// Identifier of a patient (e.g. `P001`).
    PatientId,
    "patient"
);

string_id!(
    /// Identifier of a fulfillment audit log entry (e.g. `A001`).
    AuditLogId,
    "audit log",
    prefix = "A"
);

string_id!(
    /// Identifier of a back-office user account (e.g. `U001`).
    UserId,
    "user",
    prefix = "U"
);
