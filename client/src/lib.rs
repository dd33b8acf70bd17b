//! Retrying HTTP client
//!
//! [`RetryingClient`] sends one parameter set to the recommendation endpoint
//! and folds every attempt into a single `AttemptOutcome`. Failures are
//! classified into retryable (timeouts, connection errors, 5xx, other 4xx)
//! and terminal ones (400/401/403/404, maintenance and version signals,
//! malformed bodies, `success: false` envelopes). HTTP 429 is retried only
//! when the policy allows it.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod client;
mod error;
mod retry;

pub use client::{RetryingClient, USER_AGENT};
pub use error::{AttemptError, ClientError};
pub use retry::{RetryPolicy, Retryable};
