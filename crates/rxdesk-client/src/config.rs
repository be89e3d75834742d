//! Client configuration.
//!
//! Defaults target a server on `http://127.0.0.1:8080`. Override through
//! environment variables or explicit construction.

use url::Url;

/// Default API base URL.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for connecting to an rxdesk API server.
///
/// Custom `Debug` implementation redacts the token.
#[derive(Clone)]
pub struct ClientConfig {
    /// Server base URL.
    pub base_url: Url,
    /// Bearer token sent with every request, if any.
    pub token: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl ClientConfig {
    /// Configuration for `base_url` with no token and the default timeout.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_url("base_url", base_url)?,
            token: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        })
    }

    /// Set the bearer token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `RXDESK_API_URL` (default: `http://127.0.0.1:8080`)
    /// - `RXDESK_API_TOKEN` (optional)
    /// - `RXDESK_TIMEOUT_SECS` (default: 30)
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: env_url("RXDESK_API_URL", DEFAULT_BASE_URL)?,
            token: std::env::var("RXDESK_API_TOKEN")
                .ok()
                .filter(|t| !t.trim().is_empty()),
            timeout_secs: match std::env::var("RXDESK_TIMEOUT_SECS") {
                Ok(raw) => raw
                    .parse()
                    .map_err(|_| ConfigError::InvalidTimeout(raw.clone()))?,
                Err(_) => DEFAULT_TIMEOUT_SECS,
            },
        })
    }
}

fn parse_url(name: &str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|e| ConfigError::InvalidUrl(name.to_string(), e.to_string()))
}

fn env_url(var: &str, default: &str) -> Result<Url, ConfigError> {
    let raw = std::env::var(var).unwrap_or_else(|_| default.to_string());
    parse_url(var, &raw)
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
    #[error("invalid RXDESK_TIMEOUT_SECS: \"{0}\"")]
    InvalidTimeout(String),
    #[error("token is not a valid header value")]
    InvalidToken,
}
