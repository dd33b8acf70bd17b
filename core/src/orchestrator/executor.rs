//! Orchestrator execution logic

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::broadcast;
use tokio::task::JoinSet;

use crate::config::RunConfig;
use crate::error::{BenchError, BenchResult};
use crate::request::RequestParams;
use crate::traits::{OutcomeSink, TargetClient};
use crate::worker::{ConcurrencyGate, RequestRateLimiter, UnitError, WorkUnit};

use super::aggregator::RunReport;
use super::progress::ProgressTracker;

/// Orchestrator manages the run lifecycle
///
/// Responsible for spawning one unit per parameter set, coordinating
/// shutdown, closing the sink and aggregating outcomes.
pub struct Orchestrator {
    /// Run configuration
    pub(crate) config: RunConfig,

    /// Target client (shared across units)
    pub(crate) client: Arc<dyn TargetClient>,

    /// Result sink (shared across units)
    pub(crate) sink: Arc<dyn OutcomeSink>,

    /// Request start rate limiter
    pub(crate) rate_limiter: Arc<RequestRateLimiter>,

    /// Concurrency limiter
    pub(crate) gate: Arc<ConcurrencyGate>,

    /// Shutdown signal sender
    pub(crate) shutdown_tx: broadcast::Sender<()>,

    /// Draw a progress bar on the terminal
    pub(crate) show_progress: bool,
}

impl Orchestrator {
    /// Create a new orchestrator
    ///
    /// Use `OrchestratorBuilder` for a more ergonomic construction.
    pub fn new(
        config: RunConfig,
        client: Arc<dyn TargetClient>,
        sink: Arc<dyn OutcomeSink>,
    ) -> Self {
        let rate_limiter = Arc::new(RequestRateLimiter::new(
            config.burst_capacity(),
            config.requests_per_minute,
        ));
        let gate = Arc::new(ConcurrencyGate::new(config.max_concurrent));
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            client,
            sink,
            rate_limiter,
            gate,
            shutdown_tx,
            show_progress: false,
        }
    }

    /// Get a shutdown signal receiver
    pub fn shutdown_receiver(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Stop admitting new requests
    ///
    /// Requests already executing finish and are recorded; the rest are
    /// cancelled and the run returns [`BenchError::Interrupted`].
    pub fn shutdown(&self) {
        self.gate.close();
        let _ = self.shutdown_tx.send(());
    }

    /// Get the run configuration
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Shared rate limiter
    pub fn rate_limiter(&self) -> &RequestRateLimiter {
        &self.rate_limiter
    }

    /// Shared concurrency gate
    pub fn gate(&self) -> &ConcurrencyGate {
        &self.gate
    }

    /// Run one unit per parameter set and wait for all of them
    ///
    /// Request failures never fail the run. The run fails only when the
    /// sink cannot persist an outcome or when it is interrupted.
    pub async fn run(&self, params: Vec<RequestParams>) -> BenchResult<RunReport> {
        let start = Instant::now();
        let total = params.len();

        tracing::info!(
            total,
            endpoint = self.client.endpoint(),
            requests_per_minute = self.config.requests_per_minute,
            max_concurrent = self.config.max_concurrent,
            burst_capacity = self.config.burst_capacity(),
            "Starting run"
        );

        let mut units = JoinSet::new();
        for (index, params) in params.into_iter().enumerate() {
            let unit = WorkUnit::new(
                index,
                params,
                Arc::clone(&self.client),
                Arc::clone(&self.sink),
                Arc::clone(&self.rate_limiter),
                Arc::clone(&self.gate),
            );
            units.spawn(unit.run(self.shutdown_tx.subscribe()));
        }

        let mut progress = ProgressTracker::new(total, self.show_progress);
        let mut outcomes = Vec::with_capacity(total);
        let mut cancelled = 0usize;
        let mut fatal: Option<BenchError> = None;

        while let Some(joined) = units.join_next().await {
            match joined {
                Ok(Ok(outcome)) => {
                    progress.record(&outcome);
                    outcomes.push(outcome);
                }
                Ok(Err(UnitError::Cancelled)) => cancelled += 1,
                Ok(Err(UnitError::Sink(e))) => {
                    if fatal.is_none() {
                        tracing::error!(error = %e, "Result sink failed, aborting run");
                        self.shutdown();
                        fatal = Some(BenchError::Sink(e));
                    }
                }
                Err(e) => {
                    if fatal.is_none() {
                        tracing::error!(error = %e, "Unit task failed, aborting run");
                        self.shutdown();
                        fatal = Some(BenchError::orchestration(format!("unit task failed: {e}")));
                    }
                }
            }
        }

        let closed = self.sink.close();

        if let Some(err) = fatal {
            progress.abandon();
            if let Err(close_err) = closed {
                tracing::warn!(error = %close_err, "Failed to close result sink");
            }
            return Err(err);
        }
        closed?;

        if cancelled > 0 {
            progress.abandon();
            tracing::warn!(
                completed = outcomes.len(),
                cancelled,
                total,
                "Run interrupted"
            );
            return Err(BenchError::Interrupted {
                completed: outcomes.len(),
                total,
            });
        }

        progress.finish();
        let report = RunReport::from_outcomes(outcomes, start.elapsed());
        tracing::info!(
            elapsed_secs = start.elapsed().as_secs_f64(),
            total = report.statistics.total,
            successful = report.statistics.successful,
            failed = report.statistics.failed,
            timed_out = report.statistics.timed_out,
            "Run completed"
        );

        Ok(report)
    }

    /// Run with Ctrl+C signal handling
    ///
    /// Ctrl+C stops admitting new requests; in-flight requests complete and
    /// the sink is closed before returning.
    pub async fn run_with_signal_handling(
        &self,
        params: Vec<RequestParams>,
    ) -> BenchResult<RunReport> {
        let shutdown_tx = self.shutdown_tx.clone();
        let gate = Arc::clone(&self.gate);

        // Spawn signal handler task
        let signal_handle = tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    tracing::info!("Received Ctrl+C, finishing in-flight requests...");
                    gate.close();
                    let _ = shutdown_tx.send(());
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to listen for Ctrl+C");
                }
            }
        });

        let result = self.run(params).await;

        signal_handle.abort();

        result
    }

    /// Run with an overall deadline
    ///
    /// Behaves like Ctrl+C once `timeout` has elapsed.
    pub async fn run_with_timeout(
        &self,
        params: Vec<RequestParams>,
        timeout: Duration,
    ) -> BenchResult<RunReport> {
        let shutdown_tx = self.shutdown_tx.clone();
        let gate = Arc::clone(&self.gate);

        let timeout_handle = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            tracing::info!("Run deadline reached, initiating shutdown...");
            gate.close();
            let _ = shutdown_tx.send(());
        });

        let result = self.run(params).await;

        timeout_handle.abort();

        result
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("config", &self.config)
            .field("endpoint", &self.client.endpoint())
            .field("rate_limiter", &self.rate_limiter)
            .field("gate", &self.gate)
            .finish()
    }
}
