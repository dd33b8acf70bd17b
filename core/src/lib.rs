//! reco-bench-core: Concurrency and resilience engine for reco-bench
//!
//! This crate provides the foundational types used across all reco-bench
//! components, including:
//!
//! - Request parameters, response envelope and per-request outcomes
//! - Core traits (TargetClient, OutcomeSink)
//! - Token bucket rate limiting and FIFO admission control
//! - Run orchestration and statistics
//! - Error handling

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod metrics;
pub mod orchestrator;
pub mod request;
pub mod response;
pub mod traits;
pub mod worker;

pub use config::*;
pub use error::*;
pub use metrics::*;
pub use orchestrator::{Orchestrator, OrchestratorBuilder, RunReport};
pub use request::*;
pub use response::*;
pub use traits::*;
pub use worker::{ConcurrencyGate, GatePermit, RateLimiterState, RequestRateLimiter, WorkUnit};
