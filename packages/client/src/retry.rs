//! Timeout and retry policy for calls to collaborator services.
//!
//! Every request goes through [`send`], which retries transient failures
//! (connection errors, timeouts, HTTP 429, HTTP 5xx) with exponential
//! backoff. Other 4xx responses are permanent and returned immediately.

use std::time::Duration;

use crate::ClientError;

/// Per-request timeout and retry budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Timeout applied to each individual attempt.
    pub timeout: Duration,
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry; doubled for each further retry.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            max_retries: 3,
            base_delay: Duration::from_millis(100),
        }
    }
}

impl RetryPolicy {
    /// Backoff before retry number `attempt` (1-based): 1×, 2×, 4×, ...
    /// the base delay.
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(1u32 << attempt.saturating_sub(1).min(16))
    }
}

/// What to do with a response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Disposition {
    Success,
    Retry,
    Permanent,
}

pub(crate) fn classify(status: reqwest::StatusCode) -> Disposition {
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        Disposition::Retry
    } else if status.is_client_error() {
        Disposition::Permanent
    } else {
        Disposition::Success
    }
}

/// Returns `true` if the error is likely transient and worth retrying.
fn is_transient(e: &reqwest::Error) -> bool {
    e.is_timeout() || e.is_connect() || e.is_request()
}

/// Sends the request built by `build_request`, retrying on transient
/// errors. Returns the successful [`reqwest::Response`].
///
/// The closure is called on each attempt since builders are consumed by
/// `.send()`.
///
/// # Errors
///
/// * [`ClientError::Status`] for a permanent 4xx response
/// * [`ClientError::Exhausted`] once every attempt failed transiently
/// * [`ClientError::Http`] for a non-transient transport error
pub async fn send<F>(policy: &RetryPolicy, build_request: F) -> Result<reqwest::Response, ClientError>
where
    F: Fn() -> reqwest::RequestBuilder + Send + Sync,
{
    let mut last_error = String::new();

    for attempt in 0..=policy.max_retries {
        if attempt > 0 {
            let delay = policy.delay(attempt);
            log::warn!("  retry {attempt}/{} in {delay:?}...", policy.max_retries);
            tokio::time::sleep(delay).await;
        }

        match build_request().timeout(policy.timeout).send().await {
            Err(e) if is_transient(&e) => {
                log::warn!("  transient error: {e}");
                last_error = e.to_string();
            }
            Err(e) => return Err(ClientError::Http(e)),
            Ok(response) => {
                let status = response.status();
                match classify(status) {
                    Disposition::Success => return Ok(response),
                    Disposition::Permanent => {
                        return Err(ClientError::Status {
                            status: status.as_u16(),
                            url: response.url().to_string(),
                        });
                    }
                    Disposition::Retry => {
                        log::warn!("  HTTP {status} from {}", response.url());
                        last_error = format!("HTTP {status}");
                    }
                }
            }
        }
    }

    log::error!(
        "Request failed after {} attempts: {last_error}",
        policy.max_retries + 1
    );
    Err(ClientError::Exhausted {
        attempts: policy.max_retries + 1,
        last_error,
    })
}
