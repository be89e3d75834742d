//! Shared request plumbing for the sub-clients.
//!
//! Every sub-client holds a clone of one [`Transport`]. The bearer token
//! lives behind a shared lock so a login through [`crate::Session`] is
//! picked up by every sub-client on its next request.

use std::sync::Arc;

use parking_lot::RwLock;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::ClientError;

/// Message recorded when an error response is an HTML page (a proxy or
/// misrouted request) instead of the API's JSON error body.
pub const HTML_RESPONSE_MESSAGE: &str = "Unexpected HTML response";

#[derive(Debug, Clone)]
pub(crate) struct Transport {
    http: reqwest::Client,
    base_url: Url,
    token: Arc<RwLock<Option<String>>>,
}

impl Transport {
    pub(crate) fn new(http: reqwest::Client, base_url: Url, token: Option<String>) -> Self {
        Self {
            http,
            base_url,
            token: Arc::new(RwLock::new(token)),
        }
    }

    pub(crate) fn set_token(&self, token: Option<String>) {
        *self.token.write() = token;
    }

    pub(crate) fn token(&self) -> Option<String> {
        self.token.read().clone()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    /// A request builder for `path` carrying the current bearer token.
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, self.url(path));
        match self.token.read().as_deref() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send a `method` request to `path`, letting `with` attach a query or
    /// body. Transport failures are retried where the method allows it and
    /// otherwise map to [`ClientError::Http`].
    pub(crate) async fn send<F>(
        &self,
        endpoint: &str,
        method: Method,
        path: &str,
        with: F,
    ) -> Result<Response, ClientError>
    where
        F: Fn(RequestBuilder) -> RequestBuilder,
    {
        crate::retry::retry_send(&method, || with(self.request(method.clone(), path)).send())
            .await
            .map_err(|e| ClientError::Http {
                endpoint: endpoint.to_string(),
                source: e,
            })
    }

    /// Decode a 2xx JSON body, or turn the response into [`ClientError::Api`].
    pub(crate) async fn json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        resp: Response,
    ) -> Result<T, ClientError> {
        if !resp.status().is_success() {
            return Err(api_error(endpoint, resp).await);
        }
        decode(endpoint, resp).await
    }

    /// Like [`Transport::json`], but a 404 becomes `Ok(None)`.
    pub(crate) async fn optional<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        resp: Response,
    ) -> Result<Option<T>, ClientError> {
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        self.json(endpoint, resp).await.map(Some)
    }

    /// Require a 2xx status and discard the body.
    pub(crate) async fn empty(&self, endpoint: &str, resp: Response) -> Result<(), ClientError> {
        if !resp.status().is_success() {
            return Err(api_error(endpoint, resp).await);
        }
        Ok(())
    }
}

pub(crate) async fn decode<T: DeserializeOwned>(
    endpoint: &str,
    resp: Response,
) -> Result<T, ClientError> {
    resp.json().await.map_err(|e| ClientError::Deserialization {
        endpoint: endpoint.to_string(),
        source: e,
    })
}

pub(crate) async fn api_error(endpoint: &str, resp: Response) -> ClientError {
    let status = resp.status().as_u16();
    let is_html = resp
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("text/html"));
    let body = resp.text().await.unwrap_or_default();
    ClientError::Api {
        endpoint: endpoint.to_string(),
        status,
        message: error_message(&body, is_html),
    }
}

/// The human-readable message of an error body.
///
/// Prefers the API's `error.message`, then a top-level `message`, then the
/// raw text. HTML pages are replaced by [`HTML_RESPONSE_MESSAGE`].
pub(crate) fn error_message(body: &str, is_html: bool) -> String {
    let trimmed = body.trim_start();
    if is_html || trimmed.starts_with("<!DOCTYPE") || trimmed.starts_with("<html") {
        return HTML_RESPONSE_MESSAGE.to_string();
    }
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        let message = value
            .pointer("/error/message")
            .or_else(|| value.get("message"))
            .and_then(|m| m.as_str());
        if let Some(message) = message {
            return message.to_string();
        }
    }
    body.to_string()
}
