//! Worker module for executing scheduled requests
//!
//! Every sampled parameter set becomes one [`WorkUnit`], a tokio task that
//! walks a short, fixed lifecycle:
//!
//! 1. Wait for a token from the shared [`RequestRateLimiter`]
//! 2. Wait for a slot from the shared [`ConcurrencyGate`]
//! 3. Execute the request via a `TargetClient`
//! 4. Record the outcome through an `OutcomeSink`, then release the slot
//!
//! The two gates are independent: the bucket bounds how fast requests
//! start, the gate bounds how many run at once.
//!
//! # Example
//!
//! ```ignore
//! use reco_bench_core::worker::{ConcurrencyGate, RequestRateLimiter, WorkUnit};
//!
//! let limiter = Arc::new(RequestRateLimiter::new(6, 30));
//! let gate = Arc::new(ConcurrencyGate::new(3));
//! let unit = WorkUnit::new(0, params, client, sink, limiter, gate);
//!
//! let outcome = unit.run(shutdown_rx).await?;
//! println!("{}: {}", outcome.request_id, outcome.status);
//! ```

mod executor;
mod gate;
mod rate_limiter;

pub use executor::{UnitError, UnitState, WorkUnit};
pub use gate::{ConcurrencyGate, GateClosed, GatePermit};
pub use rate_limiter::{RateLimiterState, RequestRateLimiter};

#[cfg(test)]
mod tests;
