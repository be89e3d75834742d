//! # rxdesk-client: Typed Rust client for the rxdesk API
//!
//! Provides typed access to every route the rxdesk API server exposes:
//! - **Drugs** via [`drugs::DrugClient`]
//! - **Pharmacies** via [`pharmacies::PharmacyClient`]
//! - **Prescriptions** and fulfillment via [`prescriptions::PrescriptionClient`]
//! - **Audit logs** via [`audit_logs::AuditLogClient`]
//! - **Dashboard** and health via [`dashboard::DashboardClient`]
//! - **Accounts** via [`auth::AuthClient`]
//!
//! Plus two stateful helpers: [`DrugCatalog`], a cached drug list, and
//! [`Session`], which applies a login token to every later request.
//!
//! ## Errors
//!
//! Non-2xx responses become [`ClientError::Api`] carrying the server's
//! `error.message`. A 404 on a single-record GET is `Ok(None)`. Transport
//! failures of reads, updates and deletes are retried with exponential
//! backoff before surfacing as [`ClientError::Http`]; a `POST` is retried
//! only when it never connected, so a timed-out create or fulfillment is
//! reported rather than repeated.

pub mod audit_logs;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod dashboard;
pub mod drugs;
pub mod error;
pub mod pharmacies;
pub mod prescriptions;
pub(crate) mod retry;
pub mod session;
pub(crate) mod transport;
pub mod types;

pub use catalog::DrugCatalog;
pub use config::ClientConfig;
pub use error::ClientError;
pub use session::Session;
pub use transport::HTML_RESPONSE_MESSAGE;

use std::time::Duration;

use transport::Transport;

/// Top-level rxdesk API client. Holds sub-clients sharing one connection pool
/// and one bearer token.
#[derive(Debug, Clone)]
pub struct RxClient {
    transport: Transport,
    drugs: drugs::DrugClient,
    pharmacies: pharmacies::PharmacyClient,
    prescriptions: prescriptions::PrescriptionClient,
    audit_logs: audit_logs::AuditLogClient,
    dashboard: dashboard::DashboardClient,
    auth: auth::AuthClient,
}

impl RxClient {
    /// Create a client from configuration.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        if let Some(token) = &config.token {
            reqwest::header::HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| ClientError::Config(config::ConfigError::InvalidToken))?;
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ClientError::Http {
                endpoint: "client_init".into(),
                source: e,
            })?;

        let transport = Transport::new(http, config.base_url, config.token);
        Ok(Self {
            drugs: drugs::DrugClient::new(transport.clone()),
            pharmacies: pharmacies::PharmacyClient::new(transport.clone()),
            prescriptions: prescriptions::PrescriptionClient::new(transport.clone()),
            audit_logs: audit_logs::AuditLogClient::new(transport.clone()),
            dashboard: dashboard::DashboardClient::new(transport.clone()),
            auth: auth::AuthClient::new(transport.clone()),
            transport,
        })
    }

    /// Create a client from `RXDESK_*` environment variables.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::new(ClientConfig::from_env()?)
    }

    pub fn drugs(&self) -> &drugs::DrugClient {
        &self.drugs
    }

    pub fn pharmacies(&self) -> &pharmacies::PharmacyClient {
        &self.pharmacies
    }

    pub fn prescriptions(&self) -> &prescriptions::PrescriptionClient {
        &self.prescriptions
    }

    pub fn audit_logs(&self) -> &audit_logs::AuditLogClient {
        &self.audit_logs
    }

    pub fn dashboard(&self) -> &dashboard::DashboardClient {
        &self.dashboard
    }

    pub fn auth(&self) -> &auth::AuthClient {
        &self.auth
    }

    /// A drug catalog cache backed by this client.
    pub fn catalog(&self) -> DrugCatalog {
        DrugCatalog::new(self.drugs.clone())
    }

    /// A login session bound to this client's token.
    pub fn session(&self) -> Session {
        Session::new(self.auth.clone())
    }

    /// Whether a bearer token is currently applied.
    pub fn has_token(&self) -> bool {
        self.transport.token().is_some()
    }
}
