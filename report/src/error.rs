//! Report errors

use thiserror::Error;

/// Errors raised while writing reports
#[derive(Error, Debug)]
pub enum ReportError {
    /// File could not be written
    #[error("failed to write report: {0}")]
    Io(#[from] std::io::Error),

    /// Statistics could not be serialized
    #[error("failed to serialize statistics: {0}")]
    Json(#[from] serde_json::Error),

    /// Summary text could not be formatted
    #[error("failed to format summary: {0}")]
    Format(#[from] std::fmt::Error),
}
