//! Result sinks
//!
//! [`CsvResultSink`] appends one row per outcome to a CSV file as units
//! complete, so partial results survive an interrupted run.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod csv_sink;

pub use csv_sink::{sanitize_error, CsvResultSink, CSV_HEADER, MAX_ERROR_CHARS};
