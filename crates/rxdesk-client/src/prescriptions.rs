//! Typed client for prescriptions and fulfillment.

use reqwest::{Method, StatusCode};
use rxdesk_core::{FulfillmentResponse, Prescription, PrescriptionFilter, PrescriptionId};

use crate::error::ClientError;
use crate::transport::{api_error, decode, Transport};

/// Client for `/v1/prescriptions`.
#[derive(Debug, Clone)]
pub struct PrescriptionClient {
    transport: Transport,
}

impl PrescriptionClient {
    pub(crate) fn new(transport: Transport) -> Self {
        Self { transport }
    }

    /// List prescriptions matching `filter`.
    pub async fn list(&self, filter: &PrescriptionFilter) -> Result<Vec<Prescription>, ClientError> {
        let endpoint = "GET /v1/prescriptions";
        let resp = self
            .transport
            .send(endpoint, Method::GET, "/v1/prescriptions", |r| r.query(filter))
            .await?;
        self.transport.json(endpoint, resp).await
    }

    /// Get a prescription by id. Returns `Ok(None)` on 404.
    pub async fn get(&self, id: &PrescriptionId) -> Result<Option<Prescription>, ClientError> {
        let endpoint = format!("GET /v1/prescriptions/{id}");
        let path = format!("/v1/prescriptions/{id}");
        let resp = self
            .transport
            .send(&endpoint, Method::GET, &path, |r| r)
            .await?;
        self.transport.optional(&endpoint, resp).await
    }

    /// Attempt to fulfill a prescription.
    ///
    /// A rule failure (400) is an ordinary outcome and comes back as
    /// `Ok` with `success == false` and the reasons. Any other non-2xx
    /// status (404, 409, auth errors) is a [`ClientError::Api`].
    pub async fn fulfill(&self, id: &PrescriptionId) -> Result<FulfillmentResponse, ClientError> {
        let endpoint = format!("POST /v1/prescriptions/{id}/fulfill");
        let path = format!("/v1/prescriptions/{id}/fulfill");
        let resp = self
            .transport
            .send(&endpoint, Method::POST, &path, |r| r)
            .await?;

        let status = resp.status();
        if !(status.is_success() || status == StatusCode::BAD_REQUEST) {
            return Err(api_error(&endpoint, resp).await);
        }
        let outcome: FulfillmentResponse = decode(&endpoint, resp).await?;
        if outcome.success {
            tracing::info!(prescription_id = %id, "prescription fulfilled");
        } else {
            tracing::warn!(
                prescription_id = %id,
                reasons = outcome.errors.as_ref().map_or(0, Vec::len),
                "prescription fulfillment failed"
            );
        }
        Ok(outcome)
    }
}
