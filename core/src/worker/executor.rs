//! Execution of a single scheduled request

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use tokio::sync::broadcast;

use crate::error::{ErrorKind, SinkError};
use crate::request::{RequestId, RequestParams};
use crate::response::AttemptOutcome;
use crate::traits::{OutcomeSink, TargetClient};

use super::gate::{ConcurrencyGate, GatePermit};
use super::rate_limiter::RequestRateLimiter;

/// Lifecycle of a unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitState {
    /// Created, not yet started
    Pending,
    /// Waiting on the token bucket
    AwaitingRateToken,
    /// Waiting on the concurrency gate
    AwaitingConcurrencySlot,
    /// Request in flight
    Executing,
    /// Outcome recorded
    Completed,
}

/// Why a unit did not produce an outcome
#[derive(Debug, thiserror::Error)]
pub enum UnitError {
    /// Shutdown arrived before the request started
    #[error("cancelled before execution")]
    Cancelled,

    /// The outcome could not be persisted
    #[error(transparent)]
    Sink(#[from] SinkError),
}

/// One parameter set moving through rate token, slot, execution and recording
///
/// Units are independent tokio tasks; a failing unit never affects its
/// siblings.
pub struct WorkUnit {
    index: usize,
    request_id: RequestId,
    params: RequestParams,
    client: Arc<dyn TargetClient>,
    sink: Arc<dyn OutcomeSink>,
    rate_limiter: Arc<RequestRateLimiter>,
    gate: Arc<ConcurrencyGate>,
    state: UnitState,
}

impl WorkUnit {
    /// Create a pending unit
    pub fn new(
        index: usize,
        params: RequestParams,
        client: Arc<dyn TargetClient>,
        sink: Arc<dyn OutcomeSink>,
        rate_limiter: Arc<RequestRateLimiter>,
        gate: Arc<ConcurrencyGate>,
    ) -> Self {
        Self {
            index,
            request_id: RequestId::generate(),
            params,
            client,
            sink,
            rate_limiter,
            gate,
            state: UnitState::Pending,
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> UnitState {
        self.state
    }

    /// Run the unit to completion
    ///
    /// Shutdown is honoured until the request starts executing; after that
    /// the unit always finishes and records its outcome. The outcome is
    /// written while the slot is held.
    pub async fn run(
        mut self,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<AttemptOutcome, UnitError> {
        let _permit = tokio::select! {
            biased;

            _ = shutdown.recv() => {
                tracing::debug!(index = self.index, state = ?self.state, "Unit cancelled");
                return Err(UnitError::Cancelled);
            }

            admitted = self.admit() => admitted?,
        };

        self.transition(UnitState::Executing);
        let outcome = self.execute().await;

        self.sink.write_outcome(&outcome)?;
        self.transition(UnitState::Completed);

        Ok(outcome)
    }

    async fn admit(&mut self) -> Result<GatePermit, UnitError> {
        self.transition(UnitState::AwaitingRateToken);
        self.rate_limiter.wait_for_token().await;

        self.transition(UnitState::AwaitingConcurrencySlot);
        self.gate.acquire().await.map_err(|_| UnitError::Cancelled)
    }

    /// Call the client, converting a panic into an `internal` failure
    async fn execute(&self) -> AttemptOutcome {
        let started = Instant::now();
        let call = self.client.execute(self.request_id.clone(), &self.params);

        match AssertUnwindSafe(call).catch_unwind().await {
            Ok(outcome) => outcome,
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                tracing::error!(
                    index = self.index,
                    request_id = %self.request_id,
                    panic = %message,
                    "Client panicked"
                );
                AttemptOutcome::failure(
                    self.request_id.clone(),
                    self.params.clone(),
                    ErrorKind::Internal,
                    format!("client panicked: {message}"),
                    started.elapsed().as_millis() as u64,
                    1,
                    None,
                )
            }
        }
    }

    fn transition(&mut self, next: UnitState) {
        tracing::trace!(index = self.index, from = ?self.state, to = ?next, "Unit state change");
        self.state = next;
    }
}

impl std::fmt::Debug for WorkUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkUnit")
            .field("index", &self.index)
            .field("request_id", &self.request_id)
            .field("state", &self.state)
            .field("endpoint", &self.client.endpoint())
            .finish()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
