//! Summary log and statistics file

use std::fmt::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use reco_bench_core::RunStatistics;

use crate::error::ReportError;

/// Render the summary log text
pub fn render_summary(
    stats: &RunStatistics,
    generated: DateTime<Utc>,
) -> Result<String, ReportError> {
    let mut out = String::new();
    write_summary(&mut out, stats, generated)?;
    Ok(out)
}

fn write_summary(
    out: &mut impl Write,
    stats: &RunStatistics,
    generated: DateTime<Utc>,
) -> std::fmt::Result {
    writeln!(out, "=== Dish Categories Recommendations Test Summary ===")?;
    writeln!(
        out,
        "Generated: {}",
        generated.to_rfc3339_opts(SecondsFormat::Millis, true)
    )?;
    writeln!(out)?;

    writeln!(out, "Results:")?;
    writeln!(out, "- Total Requests: {}", stats.total)?;
    writeln!(out, "- Successful: {}", stats.successful)?;
    writeln!(out, "- Failed: {}", stats.failed)?;
    writeln!(out, "- Timed Out: {}", stats.timed_out)?;
    writeln!(out, "- Success Rate: {:.2}%", stats.success_rate * 100.0)?;
    writeln!(out, "- Retried: {}", stats.retried)?;
    writeln!(out, "- Total Attempts: {}", stats.total_attempts)?;
    writeln!(out)?;

    writeln!(out, "Performance:")?;
    writeln!(
        out,
        "- Average Response Time: {:.2}ms",
        stats.average_elapsed_ms
    )?;
    writeln!(
        out,
        "- Response Time p50/p95/p99: {:.2}ms / {:.2}ms / {:.2}ms",
        stats.elapsed.p50, stats.elapsed.p95, stats.elapsed.p99
    )?;
    writeln!(
        out,
        "- Average Response Count: {:.2}",
        stats.average_item_count
    )?;
    writeln!(out, "- Unique Categories Found: {}", stats.unique_categories)?;
    writeln!(out, "- Wall Clock: {}ms", stats.wall_clock_ms)?;
    writeln!(out)?;

    writeln!(out, "Errors by Status Code:")?;
    write_counts(out, &stats.errors_by_status)?;
    writeln!(out)?;

    writeln!(out, "Errors by Type:")?;
    write_counts(out, &stats.errors_by_type)
}

fn write_counts<'a>(
    out: &mut impl Write,
    counts: impl IntoIterator<Item = (&'a String, &'a usize)>,
) -> std::fmt::Result {
    let mut empty = true;
    for (label, count) in counts {
        empty = false;
        writeln!(out, "- {label}: {count}")?;
    }
    if empty {
        writeln!(out, "- none")?;
    }
    Ok(())
}

/// Write the summary log to `path`, creating parent directories
pub fn write_summary_log(stats: &RunStatistics, path: &Path) -> Result<(), ReportError> {
    create_parent(path)?;
    std::fs::write(path, render_summary(stats, Utc::now())?)?;

    tracing::info!(path = %path.display(), "Summary log written");
    Ok(())
}

/// Path of the statistics file that accompanies a summary log
///
/// `results/run.log` becomes `results/run.json`.
pub fn statistics_path_for(summary_path: &Path) -> PathBuf {
    summary_path.with_extension("json")
}

/// Write `stats` as pretty-printed JSON to `path`
pub fn write_statistics_json(stats: &RunStatistics, path: &Path) -> Result<(), ReportError> {
    create_parent(path)?;
    let json = serde_json::to_string_pretty(stats)?;
    std::fs::write(path, json)?;

    tracing::info!(path = %path.display(), "Statistics written");
    Ok(())
}

fn create_parent(path: &Path) -> Result<(), ReportError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}
