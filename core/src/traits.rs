//! Core traits for target clients and result sinks
//!
//! These traits are defined in core to avoid circular dependencies.
//! Implementations live in their respective crates (client/, storage/).

use async_trait::async_trait;

use crate::error::SinkError;
use crate::request::{RequestId, RequestParams};
use crate::response::AttemptOutcome;

// ============================================================================
// Target Client Trait
// ============================================================================

/// Executes one parameter set against the endpoint under test
///
/// Implementations own timeouts, retries and error classification. They
/// never fail: every problem is folded into the returned outcome.
#[async_trait]
pub trait TargetClient: Send + Sync {
    /// Endpoint description used in logs
    fn endpoint(&self) -> &str;

    /// Execute the request, retrying as configured, and return the final outcome
    async fn execute(&self, request_id: RequestId, params: &RequestParams) -> AttemptOutcome;
}

// ============================================================================
// Outcome Sink Trait
// ============================================================================

/// Persists outcomes as they complete
///
/// Writes may arrive from many tasks at once; implementations serialize
/// them so each outcome lands as one contiguous record.
pub trait OutcomeSink: Send + Sync {
    /// Append one outcome
    fn write_outcome(&self, outcome: &AttemptOutcome) -> Result<(), SinkError>;

    /// Flush and release the underlying resource. Closing twice is a no-op.
    fn close(&self) -> Result<(), SinkError>;
}
