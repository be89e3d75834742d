//! Typed client for captcha, login, registration and sessions.
//!
//! These calls return the raw server responses. [`crate::Session`] wraps
//! them and keeps the bearer token in step.

use reqwest::Method;

use crate::error::ClientError;
use crate::transport::Transport;
use crate::types::{AuthResponse, Captcha, LoginRequest, RegisterRequest, User};

/// Client for `/v1/auth`.
#[derive(Debug, Clone)]
pub struct AuthClient {
    transport: Transport,
}

impl AuthClient {
    pub(crate) fn new(transport: Transport) -> Self {
        Self { transport }
    }

    pub(crate) fn transport(&self) -> &Transport {
        &self.transport
    }

    /// Issue a single-use captcha.
    pub async fn captcha(&self) -> Result<Captcha, ClientError> {
        let endpoint = "GET /v1/auth/captcha";
        let resp = self
            .transport
            .send(endpoint, Method::GET, "/v1/auth/captcha", |r| r)
            .await?;
        self.transport.json(endpoint, resp).await
    }

    /// Log in. The returned token is not applied; see [`crate::Session::login`].
    pub async fn login(&self, req: &LoginRequest) -> Result<AuthResponse, ClientError> {
        let endpoint = "POST /v1/auth/login";
        let resp = self
            .transport
            .send(endpoint, Method::POST, "/v1/auth/login", |r| r.json(req))
            .await?;
        self.transport.json(endpoint, resp).await
    }

    /// Register a `user`-role account.
    pub async fn register(&self, req: &RegisterRequest) -> Result<AuthResponse, ClientError> {
        let endpoint = "POST /v1/auth/register";
        let resp = self
            .transport
            .send(endpoint, Method::POST, "/v1/auth/register", |r| r.json(req))
            .await?;
        self.transport.json(endpoint, resp).await
    }

    /// Close the current session on the server.
    pub async fn logout(&self) -> Result<(), ClientError> {
        let endpoint = "POST /v1/auth/logout";
        let resp = self
            .transport
            .send(endpoint, Method::POST, "/v1/auth/logout", |r| r)
            .await?;
        self.transport.empty(endpoint, resp).await
    }

    /// The caller's account. Returns `Ok(None)` for callers without one.
    pub async fn me(&self) -> Result<Option<User>, ClientError> {
        let endpoint = "GET /v1/auth/me";
        let resp = self
            .transport
            .send(endpoint, Method::GET, "/v1/auth/me", |r| r)
            .await?;
        self.transport.optional(endpoint, resp).await
    }
}
