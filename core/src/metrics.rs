//! Run statistics derived from outcomes

use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::response::{AttemptOutcome, OutcomeStatus};

/// Summary statistics for a run
///
/// Computed once, after every unit has finished, from the full list of
/// outcomes.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RunStatistics {
    /// Outcomes recorded
    pub total: usize,
    /// Outcomes with status `success`
    pub successful: usize,
    /// Outcomes with status `error`
    pub failed: usize,
    /// Outcomes with status `timeout`
    pub timed_out: usize,
    /// Successful share of all outcomes (0.0 - 1.0)
    pub success_rate: f64,

    /// Mean elapsed time over all outcomes
    pub average_elapsed_ms: f64,
    /// Fastest outcome
    pub min_elapsed_ms: u64,
    /// Slowest outcome
    pub max_elapsed_ms: u64,
    /// Elapsed time percentiles over all outcomes
    pub elapsed: LatencyPercentiles,

    /// Mean item count over successful outcomes
    pub average_item_count: f64,
    /// Distinct categories across all successful responses
    pub unique_categories: usize,

    /// Failure count per error kind
    pub errors_by_type: BTreeMap<String, usize>,
    /// Failure count per HTTP status, `unknown` when no response arrived
    pub errors_by_status: BTreeMap<String, usize>,

    /// HTTP attempts across the run
    pub total_attempts: u64,
    /// Outcomes that needed more than one attempt
    pub retried: usize,
    /// Wall-clock duration of the run
    pub wall_clock_ms: u64,
}

impl RunStatistics {
    /// Calculate statistics from outcomes
    pub fn from_outcomes(outcomes: &[AttemptOutcome], wall_clock: Duration) -> Self {
        let total = outcomes.len();
        let count = |status: OutcomeStatus| outcomes.iter().filter(|o| o.status == status).count();
        let successful = count(OutcomeStatus::Success);
        let failed = count(OutcomeStatus::Error);
        let timed_out = count(OutcomeStatus::Timeout);

        let success_rate = if total > 0 {
            successful as f64 / total as f64
        } else {
            0.0
        };

        let elapsed_values: Vec<f64> = outcomes.iter().map(|o| o.elapsed_ms as f64).collect();
        let elapsed = LatencyPercentiles::from_values(&elapsed_values);

        let item_counts: Vec<usize> = outcomes
            .iter()
            .filter(|o| o.is_success())
            .filter_map(|o| o.item_count)
            .collect();
        let average_item_count = if item_counts.is_empty() {
            0.0
        } else {
            item_counts.iter().sum::<usize>() as f64 / item_counts.len() as f64
        };

        let unique_categories = outcomes
            .iter()
            .flat_map(|o| o.categories.iter())
            .filter(|c| !c.is_empty())
            .collect::<HashSet<_>>()
            .len();

        let mut errors_by_type = BTreeMap::new();
        let mut errors_by_status = BTreeMap::new();
        for outcome in outcomes.iter().filter(|o| !o.is_success()) {
            let kind = outcome
                .error_kind
                .map(|k| k.as_str().to_string())
                .unwrap_or_else(|| outcome.status.as_str().to_string());
            *errors_by_type.entry(kind).or_insert(0) += 1;

            let status = outcome
                .http_status
                .map(|s| s.to_string())
                .unwrap_or_else(|| "unknown".to_string());
            *errors_by_status.entry(status).or_insert(0) += 1;
        }

        Self {
            total,
            successful,
            failed,
            timed_out,
            success_rate,
            average_elapsed_ms: elapsed.mean,
            min_elapsed_ms: outcomes.iter().map(|o| o.elapsed_ms).min().unwrap_or(0),
            max_elapsed_ms: outcomes.iter().map(|o| o.elapsed_ms).max().unwrap_or(0),
            elapsed,
            average_item_count,
            unique_categories,
            errors_by_type,
            errors_by_status,
            total_attempts: outcomes.iter().map(|o| u64::from(o.attempts)).sum(),
            retried: outcomes.iter().filter(|o| o.attempts > 1).count(),
            wall_clock_ms: wall_clock.as_millis() as u64,
        }
    }

    /// Share of outcomes that failed, timeouts included (0.0 - 1.0)
    pub fn error_rate(&self) -> f64 {
        if self.total > 0 {
            1.0 - self.success_rate
        } else {
            0.0
        }
    }
}

/// Latency percentiles (all values in milliseconds)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
pub struct LatencyPercentiles {
    /// Minimum value
    pub min: f64,
    /// 50th percentile (median)
    pub p50: f64,
    /// 90th percentile
    pub p90: f64,
    /// 95th percentile
    pub p95: f64,
    /// 99th percentile
    pub p99: f64,
    /// Maximum value
    pub max: f64,
    /// Mean value
    pub mean: f64,
}

impl LatencyPercentiles {
    /// Calculate percentiles from a slice of values
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }

        let mut sorted: Vec<f64> = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let len = sorted.len();
        let mean = sorted.iter().sum::<f64>() / len as f64;

        Self {
            min: sorted[0],
            p50: percentile(&sorted, 0.50),
            p90: percentile(&sorted, 0.90),
            p95: percentile(&sorted, 0.95),
            p99: percentile(&sorted, 0.99),
            max: sorted[len - 1],
            mean,
        }
    }
}

/// Linear interpolation between the closest ranks
fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    if sorted.len() == 1 {
        return sorted[0];
    }

    let idx = p * (sorted.len() - 1) as f64;
    let lower = idx.floor() as usize;
    let upper = idx.ceil() as usize;
    let frac = idx - lower as f64;

    if upper >= sorted.len() {
        sorted[sorted.len() - 1]
    } else {
        sorted[lower] * (1.0 - frac) + sorted[upper] * frac
    }
}
