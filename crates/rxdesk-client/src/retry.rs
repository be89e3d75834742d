//! Transport-level retry for rxdesk API calls.
//!
//! HTTP responses are never retried, whatever their status. A transport
//! failure is retried only when repeating the request cannot apply a write
//! twice: any failure of an idempotent method, and for `POST` only a failed
//! connect, where the request never reached the server. A `POST` that timed
//! out may already have created a drug or dispensed stock, so it surfaces to
//! the caller on the first failure.

use std::future::Future;
use std::time::Duration;

use reqwest::Method;

/// Retry attempts after the initial request.
const MAX_RETRIES: u32 = 3;

/// Delay before the first retry; doubles each attempt.
const BASE_DELAY_MS: u64 = 200;

/// `GET`, `HEAD`, `OPTIONS`, `PUT` and `DELETE` carry the same effect however
/// often they are sent.
pub(crate) fn is_idempotent(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::HEAD | Method::OPTIONS | Method::PUT | Method::DELETE
    )
}

fn delay_for(attempt: u32) -> Duration {
    Duration::from_millis(BASE_DELAY_MS << attempt)
}

/// Send with exponential backoff, calling `send` at most `MAX_RETRIES + 1`
/// times. `retryable` decides per failure whether another attempt is safe.
async fn send_with_backoff<F, Fut, R>(send: F, retryable: R) -> Result<reqwest::Response, reqwest::Error>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<reqwest::Response, reqwest::Error>>,
    R: Fn(&reqwest::Error) -> bool,
{
    let mut attempt = 0;
    loop {
        match send().await {
            Ok(resp) => return Ok(resp),
            Err(e) if attempt < MAX_RETRIES && retryable(&e) => {
                let delay = delay_for(attempt);
                attempt += 1;
                tracing::warn!(
                    attempt,
                    max_retries = MAX_RETRIES,
                    "rxdesk API request failed, retrying in {delay:?}: {e}"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Send a `method` request built by `send`, retrying the failures that are
/// safe to repeat for that method.
pub(crate) async fn retry_send<F, Fut>(
    method: &Method,
    send: F,
) -> Result<reqwest::Response, reqwest::Error>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<reqwest::Response, reqwest::Error>>,
{
    let idempotent = is_idempotent(method);
    send_with_backoff(send, |e| idempotent || e.is_connect()).await
}
