//! HTTP fetching -- one logical request in, one typed value (or failure) out.
//!
//! Split into focused pieces:
//! - [`Transport`] - a single GET round trip returning the raw, non-empty body
//! - [`HttpFetcher`] - the production transport built on `reqwest`
//! - [`decode`] - explicit decode functions, one per response shape
//! - [`Fetcher`] - pairs a transport with a decoder

pub mod decode;

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Semaphore;

use crate::config::HttpConfig;
use crate::error::{Error, Result};


/// Abstraction over a single HTTP GET, enabling testability.
///
/// Implementations return the body of a 2xx response and fail with
/// [`Error::Transport`], [`Error::HttpStatus`] or [`Error::EmptyBody`]
/// otherwise. Any response resource is released before returning.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Perform one GET against `path` (relative to the API base)
    async fn get(&self, path: &str) -> Result<Vec<u8>>;
}

/// Decoder for one response shape
pub type Decoder<T> = fn(&str, &[u8]) -> Result<T>;

/// Fetches a path through a [`Transport`] and decodes it into a typed value.
#[derive(Clone)]
pub struct Fetcher {
    transport: Arc<dyn Transport>,
}

impl Fetcher {
    /// Wrap a transport
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Fetch `path` and decode the body with `decode`
    pub async fn fetch<T>(&self, path: &str, decode: Decoder<T>) -> Result<T> {
        let body = self.transport.get(path).await?;
        decode(path, &body)
    }
}

/// Production [`Transport`] backed by a shared `reqwest::Client`.
pub struct HttpFetcher {
    client: reqwest::Client,
    base_url: String,
    log_bodies: bool,
    request_limit: Option<Arc<Semaphore>>,
}

impl HttpFetcher {
    /// Build the client from transport configuration
    ///
    /// # Errors
    /// Returns [`Error::Config`] if the request cap is zero or the HTTP
    /// client cannot be created
    pub fn new(config: &HttpConfig) -> Result<Self> {
        if config.max_concurrent_requests == Some(0) {
            return Err(Error::config(
                "http.max_concurrent_requests",
                "must be at least 1 (omit for unlimited)",
            ));
        }

        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| Error::Config {
                message: format!("Failed to create HTTP client: {}", e),
                key: None,
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            log_bodies: config.log_bodies,
            request_limit: config
                .max_concurrent_requests
                .map(|n| Arc::new(Semaphore::new(n))),
        })
    }

    /// Absolute URL for an API path
    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait::async_trait]
impl Transport for HttpFetcher {
    async fn get(&self, path: &str) -> Result<Vec<u8>> {
        let url = self.url_for(path);

        // Held until this function returns, released on every exit path
        let _permit = match &self.request_limit {
            Some(limit) => Some(
                Arc::clone(limit)
                    .acquire_owned()
                    .await
                    // The semaphore is never closed, so this cannot fire
                    .map_err(|_closed| Error::Config {
                        message: "request limiter closed".to_string(),
                        key: Some("http.max_concurrent_requests".to_string()),
                    })?,
            ),
            None => None,
        };

        let started = Instant::now();
        tracing::debug!(url = %url, "--> GET");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| {
                tracing::debug!(url = %url, error = %source, "<-- HTTP FAILED");
                Error::Transport {
                    url: url.clone(),
                    source,
                }
            })?;

        let status = response.status();
        tracing::debug!(
            url = %url,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "<-- response"
        );

        if !status.is_success() {
            drop(response);
            return Err(Error::HttpStatus {
                url,
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        let body = response.bytes().await.map_err(|source| Error::Transport {
            url: url.clone(),
            source,
        })?;

        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(Error::EmptyBody { url });
        }

        if self.log_bodies {
            tracing::trace!(url = %url, body = %String::from_utf8_lossy(&body), "response body");
        }

        Ok(body.to_vec())
    }
}
