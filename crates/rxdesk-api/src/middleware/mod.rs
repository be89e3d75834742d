//! # Middleware
//!
//! Tower middleware shared by every route. Authentication lives in
//! [`crate::auth`].

pub mod metrics;
pub mod rate_limit;
