//! Typed client for the fulfillment audit log.

use reqwest::Method;
use rxdesk_core::{AuditFilter, AuditLog};

use crate::error::ClientError;
use crate::transport::Transport;

/// Client for `/v1/audit-logs`.
#[derive(Debug, Clone)]
pub struct AuditLogClient {
    transport: Transport,
}

impl AuditLogClient {
    pub(crate) fn new(transport: Transport) -> Self {
        Self { transport }
    }

    /// List audit entries matching `filter`, oldest first.
    pub async fn list(&self, filter: &AuditFilter) -> Result<Vec<AuditLog>, ClientError> {
        let endpoint = "GET /v1/audit-logs";
        let resp = self
            .transport
            .send(endpoint, Method::GET, "/v1/audit-logs", |r| r.query(filter))
            .await?;
        self.transport.json(endpoint, resp).await
    }
}
