//! Result aggregation for a finished run

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::metrics::RunStatistics;
use crate::response::AttemptOutcome;

/// Everything a run produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// One outcome per parameter set, in completion order
    pub outcomes: Vec<AttemptOutcome>,

    /// Statistics derived from `outcomes`
    pub statistics: RunStatistics,
}

impl RunReport {
    /// Aggregate outcomes into a report
    pub fn from_outcomes(outcomes: Vec<AttemptOutcome>, wall_clock: Duration) -> Self {
        let statistics = RunStatistics::from_outcomes(&outcomes, wall_clock);
        Self {
            outcomes,
            statistics,
        }
    }

    /// Outcomes that did not succeed
    pub fn failures(&self) -> impl Iterator<Item = &AttemptOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }

    /// Overall requests per second
    pub fn requests_per_second(&self) -> f64 {
        let secs = self.statistics.wall_clock_ms as f64 / 1000.0;
        if secs > 0.0 {
            self.statistics.total as f64 / secs
        } else {
            0.0
        }
    }
}
