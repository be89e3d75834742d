#![warn(missing_docs)]

//! # rxdesk-core: Domain Types for the rxdesk Pharmacy Back Office
//!
//! Every other crate in the workspace builds on the types defined here.
//! The crate has no I/O beyond loading dataset files and no async code.
//!
//! ## Contents
//!
//! - **Identifiers** ([`DrugId`], [`PharmacyId`], [`PrescriptionId`], ...):
//!   validated string newtypes. A `PharmacyId` cannot be passed where a
//!   `DrugId` is expected.
//! - **Records** ([`Drug`], [`Pharmacy`], [`Prescription`], [`AuditLog`])
//!   with the camelCase JSON shape served by the API.
//! - **Stock rules** on [`Drug`]: expiry, low stock, alert levels.
//! - **Fulfillment** ([`fulfillment::evaluate`]): the rule set deciding
//!   whether a prescription can be dispensed.
//! - **Seed data** ([`Dataset`]) for starting a server or running offline checks.
//!
//! All rule evaluation takes the current date as an argument. Callers obtain
//! it from a [`Clock`] so tests can pin time.

pub mod audit;
pub mod drug;
pub mod error;
pub mod fulfillment;
pub mod identity;
pub mod pharmacy;
pub mod prescription;
pub mod seed;
pub mod temporal;

pub use audit::{AuditFilter, AuditLog, AuditStatus};
pub use drug::{AlertLevel, Drug, DrugFilter, DrugPatch, NewDrug, StockStatus};
pub use error::{RxError, ValidationError};
pub use fulfillment::{DrugSource, FulfillmentFailure, FulfillmentOutcome};
pub use identity::{AuditLogId, DrugId, PatientId, PharmacyId, PrescriptionId, UserId};
pub use pharmacy::{AllocatedDrug, Pharmacy, PharmacyFilter};
pub use prescription::{
    FulfillmentResponse, Prescription, PrescriptionDrug, PrescriptionFilter, PrescriptionStatus,
};
pub use seed::{Dataset, DatasetFormat};
pub use temporal::{parse_date, Clock, FixedClock, SystemClock};
