#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! HTTP implementations of the collaborator traits.
//!
//! Used when identity or geography data is owned by another deployment of
//! the precinct server. Each client wraps a [`reqwest::Client`] and sends
//! every request through [`retry::send`]. Any failure that survives the
//! retry policy is reported as
//! [`precinct_access::AccessError::UpstreamUnavailable`], never as an
//! allow or a deny.

pub mod geography;
pub mod identity;
pub mod retry;

pub use geography::HttpLocationValidator;
pub use identity::HttpIdentityDirectory;
pub use retry::RetryPolicy;

use precinct_access::AccessError;
use thiserror::Error;

/// Errors from a collaborator call.
#[derive(Debug, Error)]
pub enum ClientError {
    /// A non-transient transport failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a permanent error status.
    #[error("HTTP {status} from {url}")]
    Status {
        /// Response status code.
        status: u16,
        /// Requested URL.
        url: String,
    },

    /// Every attempt failed transiently.
    #[error("gave up after {attempts} attempts: {last_error}")]
    Exhausted {
        /// Number of attempts made.
        attempts: u32,
        /// The last failure seen.
        last_error: String,
    },

    /// The response body was not what the API promises.
    #[error("Malformed response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ClientError {
    /// Whether the service answered `404 Not Found`.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status: 404, .. })
    }

    /// Converts into the error kind the access layer surfaces.
    #[must_use]
    pub fn into_access(self, service: &str) -> AccessError {
        log::error!("{service} unavailable: {self}");
        AccessError::UpstreamUnavailable {
            service: service.to_string(),
            message: self.to_string(),
        }
    }
}

/// Builds the shared HTTP client.
fn build_client(policy: &RetryPolicy) -> Result<reqwest::Client, ClientError> {
    Ok(reqwest::Client::builder()
        .timeout(policy.timeout)
        .build()?)
}

/// Joins `base` and `path` with exactly one slash.
fn join(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Reads the whole body and decodes it as JSON.
async fn decode<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ClientError> {
    let text = response.text().await?;
    Ok(serde_json::from_str(&text)?)
}

#[cfg(test)]
pub(crate) mod test_server {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio::io::{AsyncReadExt as _, AsyncWriteExt as _};
    use tokio::net::TcpListener;

    /// Serves `responses` in order, one per connection, repeating the last
    /// one. Returns the base URL and a hit counter.
    pub async fn serve(responses: Vec<(u16, &'static str)>) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();

        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                let hit = counter.fetch_add(1, Ordering::SeqCst);
                let (status, body) = responses[hit.min(responses.len() - 1)];

                read_request(&mut socket).await;
                let response = format!(
                    "HTTP/1.1 {status} Scripted\r\n\
                     Content-Type: application/json\r\n\
                     Content-Length: {}\r\n\
                     Connection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        (base, hits)
    }

    /// Reads one request, headers and body, so closing the socket does
    /// not reset the connection.
    async fn read_request(socket: &mut tokio::net::TcpStream) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let Ok(n) = socket.read(&mut chunk).await else {
                return;
            };
            if n == 0 {
                return;
            }
            buf.extend_from_slice(&chunk[..n]);

            let text = String::from_utf8_lossy(&buf);
            if let Some(end) = text.find("\r\n\r\n") {
                let length = text[..end]
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if buf.len() >= end + 4 + length {
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_normalizes_slashes() {
        assert_eq!(
            join("http://users:8081/", "/api/users/3"),
            "http://users:8081/api/users/3"
        );
        assert_eq!(join("http://geo", "api/geo"), "http://geo/api/geo");
    }

    #[test]
    fn failures_become_upstream_unavailable() {
        let err = ClientError::Exhausted {
            attempts: 4,
            last_error: "HTTP 503 Service Unavailable".to_string(),
        };
        assert!(!err.is_not_found());
        let access = err.into_access("user-service");
        assert_eq!(access.code(), "UPSTREAM_UNAVAILABLE");

        let not_found = ClientError::Status {
            status: 404,
            url: "http://users/api/users/9".to_string(),
        };
        assert!(not_found.is_not_found());
    }
}
