//! Builder pattern for Orchestrator construction

use std::sync::Arc;

use crate::config::RunConfig;
use crate::error::{BenchError, BenchResult};
use crate::traits::{OutcomeSink, TargetClient};

use super::executor::Orchestrator;

/// Builder for creating an Orchestrator with proper configuration
///
/// # Example
///
/// ```ignore
/// let orchestrator = OrchestratorBuilder::new()
///     .config(config)
///     .client(Arc::new(client))
///     .sink(Arc::new(sink))
///     .show_progress(true)
///     .build()?;
/// ```
pub struct OrchestratorBuilder {
    config: RunConfig,
    client: Option<Arc<dyn TargetClient>>,
    sink: Option<Arc<dyn OutcomeSink>>,
    show_progress: bool,
}

impl OrchestratorBuilder {
    /// Create a new orchestrator builder with default configuration
    pub fn new() -> Self {
        Self {
            config: RunConfig::default(),
            client: None,
            sink: None,
            show_progress: false,
        }
    }

    /// Set the full run configuration
    pub fn config(mut self, config: RunConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the concurrency level
    pub fn concurrency(mut self, max_concurrent: usize) -> Self {
        self.config.max_concurrent = max_concurrent;
        self
    }

    /// Set the rate limit (requests per minute)
    pub fn rate_limit(mut self, requests_per_minute: u32) -> Self {
        self.config.requests_per_minute = requests_per_minute;
        self
    }

    /// Set the target client
    pub fn client(mut self, client: Arc<dyn TargetClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Set the result sink
    pub fn sink(mut self, sink: Arc<dyn OutcomeSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Show a progress bar while running
    pub fn show_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Build the orchestrator
    ///
    /// # Errors
    ///
    /// Returns an error if the client or sink are not set, or if
    /// configuration validation fails.
    pub fn build(self) -> BenchResult<Orchestrator> {
        let client = self
            .client
            .ok_or_else(|| BenchError::missing_config("client"))?;

        let sink = self.sink.ok_or_else(|| BenchError::missing_config("sink"))?;

        self.config
            .validate()
            .map_err(|e| BenchError::config(e.to_string()))?;

        let mut orchestrator = Orchestrator::new(self.config, client, sink);
        orchestrator.show_progress = self.show_progress;

        Ok(orchestrator)
    }
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
