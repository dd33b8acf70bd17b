//! Run configuration types

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How parameter sets are drawn from the parameter domains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplingStrategy {
    /// Enumerate the full product of the domains in a fixed order
    Cartesian,
    /// Independent uniform draws
    Random,
    /// Deterministic interleaving that rotates every (address, language) pair
    #[default]
    Stratified,
}

impl SamplingStrategy {
    /// Strategy name as accepted on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cartesian => "cartesian",
            Self::Random => "random",
            Self::Stratified => "stratified",
        }
    }
}

impl std::fmt::Display for SamplingStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SamplingStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cartesian" => Ok(Self::Cartesian),
            "random" => Ok(Self::Random),
            "stratified" => Ok(Self::Stratified),
            other => Err(format!(
                "unknown sampling strategy '{other}' (expected cartesian, random or stratified)"
            )),
        }
    }
}

/// Run configuration
///
/// Describes what to sample, how fast and how wide to send it, how to
/// retry, where the target lives and where results go. Every field has a
/// default, so partial JSON config files are accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Sampling strategy
    pub strategy: SamplingStrategy,

    /// Upper bound on the number of parameter sets
    pub max_requests: usize,

    /// Seed for the random strategy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    /// Sustained request rate
    pub requests_per_minute: u32,

    /// Maximum number of requests in flight
    pub max_concurrent: usize,

    /// Token bucket capacity; `2 * max_concurrent` when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub burst_capacity: Option<usize>,

    /// Deadline for a single HTTP attempt
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,

    /// Retries after the first attempt
    pub max_retries: u32,

    /// Backoff before the second attempt
    #[serde(with = "humantime_serde")]
    pub retry_backoff_base: Duration,

    /// Backoff ceiling
    #[serde(with = "humantime_serde")]
    pub retry_backoff_max: Duration,

    /// Add up to 10% random jitter to each backoff
    pub retry_jitter: bool,

    /// Treat HTTP 429 as retryable
    pub retry_on_rate_limited: bool,

    /// Target base URL
    pub base_url: String,

    /// Endpoint path, appended to `base_url`
    pub endpoint_path: String,

    /// CSV result file
    pub output_path: PathBuf,

    /// Human-readable summary file
    pub summary_path: PathBuf,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            strategy: SamplingStrategy::Stratified,
            max_requests: 100,
            seed: None,
            requests_per_minute: 30,
            max_concurrent: 3,
            burst_capacity: None,
            timeout: Duration::from_secs(60),
            max_retries: 3,
            retry_backoff_base: Duration::from_secs(1),
            retry_backoff_max: Duration::from_secs(30),
            retry_jitter: true,
            retry_on_rate_limited: true,
            base_url: "http://localhost:3000".to_string(),
            endpoint_path: "/v1/dish-categories/recommendations".to_string(),
            output_path: PathBuf::from("./test-results/dish-categories-recommendations.csv"),
            summary_path: PathBuf::from("./test-results/dish-categories-recommendations.log"),
        }
    }
}

impl RunConfig {
    /// Create a config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the sampling strategy
    pub fn with_strategy(mut self, strategy: SamplingStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set the maximum number of requests
    pub fn with_max_requests(mut self, max_requests: usize) -> Self {
        self.max_requests = max_requests;
        self
    }

    /// Set the random sampling seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the rate limit (requests per minute)
    pub fn with_rate_limit(mut self, requests_per_minute: u32) -> Self {
        self.requests_per_minute = requests_per_minute;
        self
    }

    /// Set the concurrency limit
    pub fn with_concurrency(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent;
        self
    }

    /// Set the token bucket capacity
    pub fn with_burst_capacity(mut self, burst: usize) -> Self {
        self.burst_capacity = Some(burst);
        self
    }

    /// Set the per-attempt timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the retry budget
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the backoff base and ceiling
    pub fn with_backoff(mut self, base: Duration, max: Duration) -> Self {
        self.retry_backoff_base = base;
        self.retry_backoff_max = max;
        self
    }

    /// Enable or disable backoff jitter
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.retry_jitter = jitter;
        self
    }

    /// Enable or disable retries on HTTP 429
    pub fn with_retry_on_rate_limited(mut self, retry: bool) -> Self {
        self.retry_on_rate_limited = retry;
        self
    }

    /// Set the target base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the endpoint path
    pub fn with_endpoint_path(mut self, path: impl Into<String>) -> Self {
        self.endpoint_path = path.into();
        self
    }

    /// Set the CSV output path
    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = path.into();
        self
    }

    /// Set the summary output path
    pub fn with_summary_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.summary_path = path.into();
        self
    }

    /// Effective token bucket capacity
    pub fn burst_capacity(&self) -> usize {
        self.burst_capacity
            .unwrap_or_else(|| self.max_concurrent.saturating_mul(2))
    }

    /// Full URL of the endpoint under test
    pub fn endpoint_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.endpoint_path)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.requests_per_minute == 0 {
            return Err(ConfigError::InvalidRateLimit(
                "requests per minute must be at least 1".into(),
            ));
        }

        if self.max_concurrent == 0 {
            return Err(ConfigError::InvalidConcurrency(
                "max concurrent must be at least 1".into(),
            ));
        }

        if self.burst_capacity() < self.max_concurrent {
            return Err(ConfigError::InvalidBurst(format!(
                "burst capacity {} is below max concurrent {}",
                self.burst_capacity(),
                self.max_concurrent
            )));
        }

        if self.timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout(
                "timeout must be greater than zero".into(),
            ));
        }

        if self.retry_backoff_base > self.retry_backoff_max {
            return Err(ConfigError::InvalidBackoff(format!(
                "backoff base {:?} exceeds backoff max {:?}",
                self.retry_backoff_base, self.retry_backoff_max
            )));
        }

        if self.base_url.trim().is_empty() {
            return Err(ConfigError::InvalidEndpoint("base URL is empty".into()));
        }

        if !self.endpoint_path.starts_with('/') {
            return Err(ConfigError::InvalidEndpoint(format!(
                "endpoint path '{}' must start with '/'",
                self.endpoint_path
            )));
        }

        Ok(())
    }
}

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Invalid concurrency value
    #[error("Invalid concurrency: {0}")]
    InvalidConcurrency(String),

    /// Invalid rate limit
    #[error("Invalid rate limit: {0}")]
    InvalidRateLimit(String),

    /// Invalid burst capacity
    #[error("Invalid burst capacity: {0}")]
    InvalidBurst(String),

    /// Invalid timeout
    #[error("Invalid timeout: {0}")]
    InvalidTimeout(String),

    /// Invalid retry backoff
    #[error("Invalid backoff: {0}")]
    InvalidBackoff(String),

    /// Invalid target endpoint
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),
}
