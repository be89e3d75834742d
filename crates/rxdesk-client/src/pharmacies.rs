//! Typed client for pharmacy branches.

use reqwest::Method;
use rxdesk_core::{Pharmacy, PharmacyFilter, PharmacyId};

use crate::error::ClientError;
use crate::transport::Transport;

/// Client for `/v1/pharmacies`.
#[derive(Debug, Clone)]
pub struct PharmacyClient {
    transport: Transport,
}

impl PharmacyClient {
    pub(crate) fn new(transport: Transport) -> Self {
        Self { transport }
    }

    /// List pharmacies matching `filter`.
    pub async fn list(&self, filter: &PharmacyFilter) -> Result<Vec<Pharmacy>, ClientError> {
        let endpoint = "GET /v1/pharmacies";
        let resp = self
            .transport
            .send(endpoint, Method::GET, "/v1/pharmacies", |r| r.query(filter))
            .await?;
        self.transport.json(endpoint, resp).await
    }

    /// Get a pharmacy by id. Returns `Ok(None)` on 404.
    pub async fn get(&self, id: &PharmacyId) -> Result<Option<Pharmacy>, ClientError> {
        let endpoint = format!("GET /v1/pharmacies/{id}");
        let path = format!("/v1/pharmacies/{id}");
        let resp = self
            .transport
            .send(&endpoint, Method::GET, &path, |r| r)
            .await?;
        self.transport.optional(&endpoint, resp).await
    }
}
