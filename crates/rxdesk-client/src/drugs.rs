//! Typed client for the drug catalog.
//!
//! | Method | Path                | Operation          |
//! |--------|---------------------|--------------------|
//! | GET    | `/v1/drugs`         | List with filter   |
//! | GET    | `/v1/drugs/alerts`  | Expired or low     |
//! | GET    | `/v1/drugs/{id}`    | Get by id          |
//! | POST   | `/v1/drugs`         | Create (admin)     |
//! | PUT    | `/v1/drugs/{id}`    | Update (admin)     |
//! | DELETE | `/v1/drugs/{id}`    | Delete (admin)     |

use reqwest::Method;
use rxdesk_core::{Drug, DrugFilter, DrugId, DrugPatch, NewDrug};

use crate::error::ClientError;
use crate::transport::Transport;
use crate::types::DrugAlert;

/// Client for `/v1/drugs`.
#[derive(Debug, Clone)]
pub struct DrugClient {
    transport: Transport,
}

impl DrugClient {
    pub(crate) fn new(transport: Transport) -> Self {
        Self { transport }
    }

    /// List drugs matching `filter`.
    pub async fn list(&self, filter: &DrugFilter) -> Result<Vec<Drug>, ClientError> {
        let endpoint = "GET /v1/drugs";
        let resp = self
            .transport
            .send(endpoint, Method::GET, "/v1/drugs", |r| r.query(filter))
            .await?;
        self.transport.json(endpoint, resp).await
    }

    /// Drugs needing attention, most severe first.
    pub async fn alerts(&self) -> Result<Vec<DrugAlert>, ClientError> {
        let endpoint = "GET /v1/drugs/alerts";
        let resp = self
            .transport
            .send(endpoint, Method::GET, "/v1/drugs/alerts", |r| r)
            .await?;
        self.transport.json(endpoint, resp).await
    }

    /// Get a drug by id. Returns `Ok(None)` on 404.
    pub async fn get(&self, id: &DrugId) -> Result<Option<Drug>, ClientError> {
        let endpoint = format!("GET /v1/drugs/{id}");
        let path = format!("/v1/drugs/{id}");
        let resp = self
            .transport
            .send(&endpoint, Method::GET, &path, |r| r)
            .await?;
        self.transport.optional(&endpoint, resp).await
    }

    /// Add a drug. The server assigns the id.
    pub async fn create(&self, drug: &NewDrug) -> Result<Drug, ClientError> {
        let endpoint = "POST /v1/drugs";
        let resp = self
            .transport
            .send(endpoint, Method::POST, "/v1/drugs", |r| r.json(drug))
            .await?;
        self.transport.json(endpoint, resp).await
    }

    /// Update the provided fields of a drug.
    pub async fn update(&self, id: &DrugId, patch: &DrugPatch) -> Result<Drug, ClientError> {
        let endpoint = format!("PUT /v1/drugs/{id}");
        let path = format!("/v1/drugs/{id}");
        let resp = self
            .transport
            .send(&endpoint, Method::PUT, &path, |r| r.json(patch))
            .await?;
        self.transport.json(&endpoint, resp).await
    }

    /// Delete a drug.
    pub async fn delete(&self, id: &DrugId) -> Result<(), ClientError> {
        let endpoint = format!("DELETE /v1/drugs/{id}");
        let path = format!("/v1/drugs/{id}");
        let resp = self
            .transport
            .send(&endpoint, Method::DELETE, &path, |r| r)
            .await?;
        self.transport.empty(&endpoint, resp).await
    }
}
