//! Error types for reco-bench-core

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Core error type
///
/// Only run-level failures surface here. Failures of individual requests
/// never become a `BenchError`: they are recorded as outcomes.
#[derive(Error, Debug)]
pub enum BenchError {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// The result sink could not persist an outcome
    #[error("result sink error: {0}")]
    Sink(#[from] SinkError),

    /// Orchestration error
    #[error("orchestration error: {0}")]
    Orchestration(String),

    /// The run was stopped before every parameter set completed
    #[error("run interrupted after {completed} of {total} requests")]
    Interrupted {
        /// Outcomes recorded before the interruption
        completed: usize,
        /// Parameter sets scheduled for the run
        total: usize,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BenchError {
    /// Build a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Build a configuration error for a required component that was not set
    pub fn missing_config(field: &str) -> Self {
        Self::Config(format!("{field} is required"))
    }

    /// Build an orchestration error
    pub fn orchestration(msg: impl Into<String>) -> Self {
        Self::Orchestration(msg.into())
    }
}

/// Result type alias
pub type BenchResult<T> = std::result::Result<T, BenchError>;

/// Errors raised by a result sink
#[derive(Error, Debug)]
pub enum SinkError {
    /// Underlying file error
    #[error("failed to write results: {0}")]
    Io(#[from] std::io::Error),

    /// A row could not be encoded
    #[error("failed to encode result row: {0}")]
    Csv(String),

    /// A write was attempted after the sink was closed
    #[error("result sink is closed")]
    Closed,
}

/// Classification of a failed request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The per-attempt deadline elapsed
    Timeout,
    /// Connection could not be established or was reset
    Connection,
    /// HTTP 5xx
    ServerError,
    /// HTTP 429
    RateLimited,
    /// HTTP 400
    InvalidRequest,
    /// HTTP 401
    Unauthorized,
    /// HTTP 403
    Forbidden,
    /// HTTP 404
    NotFound,
    /// Any other non-2xx status
    HttpError,
    /// The service reported that it is under maintenance
    Maintenance,
    /// The service rejected the client version
    UnsupportedVersion,
    /// A 2xx body that does not parse as the expected envelope
    InvalidResponse,
    /// A well-formed envelope with `success: false`
    ApiError,
    /// Failure inside the harness itself
    Internal,
}

impl ErrorKind {
    /// Label used in result rows and summaries
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Connection => "connection",
            Self::ServerError => "server_error",
            Self::RateLimited => "rate_limited",
            Self::InvalidRequest => "invalid_request",
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not_found",
            Self::HttpError => "http_error",
            Self::Maintenance => "maintenance",
            Self::UnsupportedVersion => "unsupported_version",
            Self::InvalidResponse => "invalid_response",
            Self::ApiError => "api_error",
            Self::Internal => "internal",
        }
    }

    /// Classify a non-2xx HTTP status
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => Self::InvalidRequest,
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            426 => Self::UnsupportedVersion,
            429 => Self::RateLimited,
            500..=599 => Self::ServerError,
            _ => Self::HttpError,
        }
    }

    /// Whether a failure of this kind is worth another attempt
    ///
    /// Rate limiting is listed as retryable here; clients may still decline
    /// to retry it based on their own policy.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Timeout
                | Self::Connection
                | Self::ServerError
                | Self::RateLimited
                | Self::HttpError
        )
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
