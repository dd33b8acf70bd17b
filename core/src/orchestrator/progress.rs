//! Per-completion progress reporting

use indicatif::{ProgressBar, ProgressStyle};

use crate::response::AttemptOutcome;

/// Tracks completed units with a progress bar and tracing events
pub(crate) struct ProgressTracker {
    bar: ProgressBar,
    total: usize,
    completed: usize,
}

impl ProgressTracker {
    pub(crate) fn new(total: usize, visible: bool) -> Self {
        let bar = if visible {
            ProgressBar::new(total as u64)
        } else {
            ProgressBar::hidden()
        };
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");
        bar.set_style(style);

        Self {
            bar,
            total,
            completed: 0,
        }
    }

    pub(crate) fn record(&mut self, outcome: &AttemptOutcome) {
        self.completed += 1;
        self.bar.inc(1);

        let percent = if self.total > 0 {
            self.completed as f64 * 100.0 / self.total as f64
        } else {
            100.0
        };

        if outcome.is_success() {
            tracing::info!(
                progress = %format!("[{percent:.1}%] {}/{}", self.completed, self.total),
                request_id = %outcome.request_id,
                address = %outcome.params.address,
                language_tag = %outcome.params.language_tag,
                elapsed_ms = outcome.elapsed_ms,
                count = outcome.item_count.unwrap_or(0),
                attempts = outcome.attempts,
                "Request succeeded"
            );
        } else {
            self.bar.set_message(format!(
                "last failure: {}",
                outcome.error_kind.map(|k| k.as_str()).unwrap_or("unknown")
            ));
            tracing::warn!(
                progress = %format!("[{percent:.1}%] {}/{}", self.completed, self.total),
                request_id = %outcome.request_id,
                address = %outcome.params.address,
                language_tag = %outcome.params.language_tag,
                status = %outcome.status,
                elapsed_ms = outcome.elapsed_ms,
                attempts = outcome.attempts,
                error = outcome.error.as_deref().unwrap_or(""),
                "Request failed"
            );
        }
    }

    pub(crate) fn finish(&self) {
        self.bar.finish_with_message("done");
    }

    pub(crate) fn abandon(&self) {
        self.bar.abandon_with_message("aborted");
    }
}
