//! Orchestrator for run lifecycle management
//!
//! The Orchestrator coordinates a complete run:
//! - Spawning one work unit per sampled parameter set
//! - Sharing a single rate limiter and concurrency gate across units
//! - Managing graceful shutdown via a broadcast channel
//! - Closing the sink and aggregating outcomes into statistics
//!
//! # Example
//!
//! ```ignore
//! use reco_bench_core::OrchestratorBuilder;
//!
//! let orchestrator = OrchestratorBuilder::new()
//!     .config(config)
//!     .client(client)
//!     .sink(sink)
//!     .build()?;
//!
//! let report = orchestrator.run_with_signal_handling(params).await?;
//! println!("{} successful", report.statistics.successful);
//! ```

mod aggregator;
mod builder;
mod executor;
mod progress;

pub use aggregator::RunReport;
pub use builder::OrchestratorBuilder;
pub use executor::Orchestrator;
