//! Sampler errors

use thiserror::Error;

/// Errors raised while loading parameter domains
///
/// Sampling itself never fails.
#[derive(Error, Debug)]
pub enum SamplerError {
    /// The domain file could not be read
    #[error("failed to read domain file {path}: {source}")]
    Io {
        /// Path that was read
        path: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The domain file is not valid JSON for the domain schema
    #[error("invalid domain file: {0}")]
    Parse(#[from] serde_json::Error),

    /// A required domain list is empty
    #[error("domain list '{0}' must not be empty")]
    EmptyDomain(&'static str),
}
