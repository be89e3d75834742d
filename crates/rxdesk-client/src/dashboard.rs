//! Typed client for the dashboard and health endpoints.

use reqwest::Method;

use crate::error::ClientError;
use crate::transport::Transport;
use crate::types::{DashboardSummary, MetricsSnapshot};

/// Client for `/v1/dashboard` and `/health/*`.
#[derive(Debug, Clone)]
pub struct DashboardClient {
    transport: Transport,
}

impl DashboardClient {
    pub(crate) fn new(transport: Transport) -> Self {
        Self { transport }
    }

    /// Headline counts.
    pub async fn summary(&self) -> Result<DashboardSummary, ClientError> {
        let endpoint = "GET /v1/dashboard";
        let resp = self
            .transport
            .send(endpoint, Method::GET, "/v1/dashboard", |r| r)
            .await?;
        self.transport.json(endpoint, resp).await
    }

    /// Request and fulfillment counters.
    pub async fn metrics(&self) -> Result<MetricsSnapshot, ClientError> {
        let endpoint = "GET /health/metrics";
        let resp = self
            .transport
            .send(endpoint, Method::GET, "/health/metrics", |r| r)
            .await?;
        self.transport.json(endpoint, resp).await
    }

    /// Whether the server answers its readiness probe.
    pub async fn ready(&self) -> Result<bool, ClientError> {
        let endpoint = "GET /health/readiness";
        let resp = self
            .transport
            .send(endpoint, Method::GET, "/health/readiness", |r| r)
            .await?;
        Ok(resp.status().is_success())
    }
}
