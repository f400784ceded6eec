//! Error types for post-aggregator
//!
//! The four fetch failures (`Transport`, `HttpStatus`, `EmptyBody`, `Decode`)
//! originate in the fetcher and travel unchanged through both aggregation
//! layers. The remaining variants cover cancellation, task panics and
//! configuration.

use thiserror::Error;

/// Result type alias for post-aggregator operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for post-aggregator
#[derive(Debug, Error)]
pub enum Error {
    /// Network or connection failure (timeout, DNS, reset, refused)
    #[error("transport error for {url}: {source}")]
    Transport {
        /// The URL that was being requested
        url: String,
        /// The underlying client error
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-2xx status
    #[error("HTTP {status} {reason} for {url}")]
    HttpStatus {
        /// The URL that was requested
        url: String,
        /// Numeric status code
        status: u16,
        /// Status line reason phrase (e.g. "Internal Server Error")
        reason: String,
    },

    /// The server answered 2xx but sent no body
    #[error("empty response body for {url}")]
    EmptyBody {
        /// The URL that was requested
        url: String,
    },

    /// The body did not match the expected shape
    #[error("failed to decode {shape} from {path}: {source}")]
    Decode {
        /// The request path the body came from
        path: String,
        /// Name of the expected shape (e.g. "author")
        shape: &'static str,
        /// The underlying JSON error
        #[source]
        source: serde_json::Error,
    },

    /// The task was stopped because its cancellation scope was cancelled
    #[error("operation cancelled")]
    Cancelled,

    /// A spawned task panicked before producing a result
    #[error("task panicked: {0}")]
    TaskPanicked(String),

    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "http.base_url")
        key: Option<String>,
    },

    /// I/O error (reading a config file)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error (parsing a config file)
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Create a configuration error for a specific key
    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }

    /// Whether this error only reports that the task was cancelled
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }

    /// HTTP status code carried by this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::HttpStatus { status, .. } => Some(*status),
            Error::Transport { source, .. } => source.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Machine-readable error code, used in run events
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Transport { .. } => "transport_failure",
            Error::HttpStatus { .. } => "http_status_failure",
            Error::EmptyBody { .. } => "empty_body_failure",
            Error::Decode { .. } => "decode_failure",
            Error::Cancelled => "cancelled",
            Error::TaskPanicked(_) => "task_panicked",
            Error::Config { .. } => "config_error",
            Error::Io(_) => "io_error",
            Error::Serialization(_) => "serialization_error",
        }
    }
}
