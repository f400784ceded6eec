//! Configuration types for post-aggregator

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// HTTP transport configuration
///
/// Owned by the transport; the aggregators never look at it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Base address every API path is appended to
    /// (default: "http://127.0.0.1:9999/api/slow")
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Connection-establishment timeout (default: 30 seconds)
    ///
    /// This is the only timeout. There is no per-request deadline.
    #[serde(default = "default_connect_timeout", with = "duration_serde")]
    pub connect_timeout: Duration,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Log full response bodies at TRACE level (default: false)
    #[serde(default)]
    pub log_bodies: bool,

    /// Cap on simultaneous in-flight requests (None = unlimited)
    ///
    /// A permit is held only for the duration of one round trip, so nested
    /// fan-out never waits on a permit held by its own parent.
    #[serde(default)]
    pub max_concurrent_requests: Option<usize>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            connect_timeout: default_connect_timeout(),
            user_agent: default_user_agent(),
            log_bodies: false,
            max_concurrent_requests: None,
        }
    }
}

/// How comment authors are resolved for a single post
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentFanOut {
    /// One concurrent lookup per comment (default)
    #[default]
    Concurrent,
    /// One lookup at a time, in listing order
    Sequential,
}

/// Aggregation behaviour
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationConfig {
    /// Comment author resolution strategy
    #[serde(default)]
    pub comment_fan_out: CommentFanOut,

    /// Capacity of the event broadcast channel (default: 1000)
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            comment_fan_out: CommentFanOut::default(),
            event_buffer: default_event_buffer(),
        }
    }
}

/// Main configuration
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// HTTP transport settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Aggregation settings
    #[serde(default)]
    pub aggregation: AggregationConfig,
}

impl Config {
    /// Read a JSON configuration file and validate it
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration for values the aggregator cannot run with
    pub fn validate(&self) -> Result<()> {
        let base = url::Url::parse(&self.http.base_url).map_err(|e| {
            Error::config("http.base_url", format!("invalid base URL: {}", e))
        })?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(Error::config(
                "http.base_url",
                format!("unsupported scheme '{}'", base.scheme()),
            ));
        }

        if self.http.max_concurrent_requests == Some(0) {
            return Err(Error::config(
                "http.max_concurrent_requests",
                "must be at least 1 (omit for unlimited)",
            ));
        }

        if self.aggregation.event_buffer == 0 {
            return Err(Error::config(
                "aggregation.event_buffer",
                "must be at least 1",
            ));
        }

        Ok(())
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:9999/api/slow".to_string()
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_user_agent() -> String {
    concat!("post-aggregator/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_event_buffer() -> usize {
    1000
}

// Duration as whole seconds
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
