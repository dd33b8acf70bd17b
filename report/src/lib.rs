//! Report generation for finished runs
//!
//! Writes the human-readable summary log and the machine-readable
//! statistics file for a [`RunStatistics`](reco_bench_core::RunStatistics).

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod summary;

pub use error::ReportError;
pub use summary::{render_summary, statistics_path_for, write_statistics_json, write_summary_log};
