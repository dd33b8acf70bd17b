//! Client errors

use std::time::Duration;

use reco_bench_core::ErrorKind;
use thiserror::Error;

use crate::retry::Retryable;

/// Longest response body kept in an error message
const MAX_BODY_CHARS: usize = 500;

/// Errors raised while constructing a client
#[derive(Error, Debug)]
pub enum ClientError {
    /// The target URL is empty or does not parse
    #[error("invalid target URL: {0}")]
    InvalidUrl(String),

    /// The underlying HTTP client could not be built
    #[error("failed to build HTTP client: {0}")]
    Build(#[from] reqwest::Error),
}

/// Failure of a single HTTP attempt
///
/// These never leave the client; the last one is folded into the
/// `AttemptOutcome` of the request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AttemptError {
    /// The attempt hit its deadline
    #[error("request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// The request never produced a response
    #[error("connection error: {0}")]
    Connection(String),

    /// Non-2xx status without a recognised service signal
    #[error("HTTP {status}: {body}")]
    Status {
        /// HTTP status
        status: u16,
        /// Truncated response body
        body: String,
    },

    /// The service reported that it is under maintenance
    #[error("service maintenance (HTTP {status}): {message}")]
    Maintenance {
        /// HTTP status
        status: u16,
        /// Message from the service
        message: String,
    },

    /// The service rejected the client version
    #[error("unsupported version (HTTP {status}): {message}")]
    UnsupportedVersion {
        /// HTTP status
        status: u16,
        /// Message from the service
        message: String,
    },

    /// A 2xx body that is not the expected envelope
    #[error("invalid response body: {message}")]
    InvalidResponse {
        /// HTTP status
        status: u16,
        /// What was wrong with the body
        message: String,
    },

    /// The envelope reported `success: false`
    #[error("API error {code}: {message}")]
    Api {
        /// HTTP status
        status: u16,
        /// `errorCode` from the envelope, or `UNKNOWN`
        code: String,
        /// `message` from the envelope
        message: String,
    },
}

impl AttemptError {
    /// Build a status error, truncating the body
    pub fn status(status: u16, body: &str) -> Self {
        Self::Status {
            status,
            body: truncate(body.trim(), MAX_BODY_CHARS),
        }
    }

    /// Classification used in outcomes and statistics
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::Connection(_) => ErrorKind::Connection,
            Self::Status { status, .. } => ErrorKind::from_status(*status),
            Self::Maintenance { .. } => ErrorKind::Maintenance,
            Self::UnsupportedVersion { .. } => ErrorKind::UnsupportedVersion,
            Self::InvalidResponse { .. } => ErrorKind::InvalidResponse,
            Self::Api { .. } => ErrorKind::ApiError,
        }
    }

    /// HTTP status of the response, if one arrived
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::Timeout(_) | Self::Connection(_) => None,
            Self::Status { status, .. }
            | Self::Maintenance { status, .. }
            | Self::UnsupportedVersion { status, .. }
            | Self::InvalidResponse { status, .. }
            | Self::Api { status, .. } => Some(*status),
        }
    }
}

impl Retryable for AttemptError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout(_) | Self::Connection(_) => true,
            Self::Status { .. } => self.kind().is_retryable(),
            Self::Maintenance { .. }
            | Self::UnsupportedVersion { .. }
            | Self::InvalidResponse { .. }
            | Self::Api { .. } => false,
        }
    }

    fn is_rate_limited(&self) -> bool {
        matches!(self, Self::Status { status: 429, .. })
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
