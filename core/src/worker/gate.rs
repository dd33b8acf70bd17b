//! Admission control for in-flight requests

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Counting semaphore that bounds how many requests execute at once
///
/// Waiters are served in arrival order. A released permit goes straight to
/// the oldest waiter, so a newcomer can never overtake a queued task.
pub struct ConcurrencyGate {
    semaphore: Arc<Semaphore>,
    max_permits: usize,
}

/// A held slot; dropping it releases the slot
#[derive(Debug)]
pub struct GatePermit {
    _permit: OwnedSemaphorePermit,
}

/// Returned by [`ConcurrencyGate::acquire`] once the gate has been closed
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("concurrency gate is closed")]
pub struct GateClosed;

impl ConcurrencyGate {
    /// Create a gate with `max_permits` slots (at least 1)
    pub fn new(max_permits: usize) -> Self {
        let max_permits = max_permits.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(max_permits)),
            max_permits,
        }
    }

    /// Wait for a slot
    pub async fn acquire(&self) -> Result<GatePermit, GateClosed> {
        Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map(|permit| GatePermit { _permit: permit })
            .map_err(|_| GateClosed)
    }

    /// Take a slot only if one is free right now
    pub fn try_acquire(&self) -> Option<GatePermit> {
        Arc::clone(&self.semaphore)
            .try_acquire_owned()
            .ok()
            .map(|permit| GatePermit { _permit: permit })
    }

    /// Free slots
    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Configured number of slots
    pub fn max_permits(&self) -> usize {
        self.max_permits
    }

    /// Slots currently held
    pub fn in_flight(&self) -> usize {
        self.max_permits.saturating_sub(self.available_permits())
    }

    /// Reject current and future waiters. Held permits stay valid.
    pub fn close(&self) {
        self.semaphore.close();
    }

    /// Whether [`close`](Self::close) has been called
    pub fn is_closed(&self) -> bool {
        self.semaphore.is_closed()
    }
}

impl std::fmt::Debug for ConcurrencyGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConcurrencyGate")
            .field("max_permits", &self.max_permits)
            .field("available", &self.available_permits())
            .field("closed", &self.is_closed())
            .finish()
    }
}
