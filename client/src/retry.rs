//! Retry policy with capped exponential backoff

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use rand::Rng;
use reco_bench_core::RunConfig;
use serde::{Deserialize, Serialize};

/// Errors that a [`RetryPolicy`] can reason about
pub trait Retryable {
    /// Whether another attempt could succeed
    fn is_retryable(&self) -> bool;

    /// Whether the server asked the client to slow down
    fn is_rate_limited(&self) -> bool {
        false
    }
}

/// How failed attempts are retried
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,

    /// Delay before the first retry
    #[serde(with = "humantime_serde")]
    pub initial_delay: Duration,

    /// Upper bound on the exponential part of the delay
    #[serde(with = "humantime_serde")]
    pub max_delay: Duration,

    /// Add up to 10% random jitter on top of each delay
    pub jitter: bool,

    /// Retry HTTP 429 responses
    pub retry_on_rate_limited: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            jitter: true,
            retry_on_rate_limited: true,
        }
    }
}

impl RetryPolicy {
    /// Policy described by a run configuration
    pub fn from_config(config: &RunConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            initial_delay: config.retry_backoff_base,
            max_delay: config.retry_backoff_max,
            jitter: config.retry_jitter,
            retry_on_rate_limited: config.retry_on_rate_limited,
        }
    }

    /// Set the retry count
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the backoff bounds
    pub fn with_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_delay = initial;
        self.max_delay = max;
        self
    }

    /// Enable or disable jitter
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Choose whether 429 responses are retried
    pub fn with_retry_on_rate_limited(mut self, retry: bool) -> Self {
        self.retry_on_rate_limited = retry;
        self
    }

    /// Total attempts including the first
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay after `attempt` failed attempts, before jitter
    ///
    /// `min(initial * 2^(attempt-1), max)`; zero for `attempt == 0`.
    pub fn base_delay(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        2u32.checked_pow(attempt - 1)
            .and_then(|factor| self.initial_delay.checked_mul(factor))
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }

    /// Delay after `attempt` failed attempts, jitter included
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base = self.base_delay(attempt);
        if !self.jitter {
            return base;
        }

        let bound = u64::try_from(base.as_micros() / 10).unwrap_or(u64::MAX);
        if bound == 0 {
            return base;
        }
        base + Duration::from_micros(rand::thread_rng().gen_range(0..=bound))
    }

    /// Whether `error` deserves another attempt under this policy
    pub fn should_retry<E: Retryable>(&self, error: &E) -> bool {
        if error.is_rate_limited() {
            self.retry_on_rate_limited
        } else {
            error.is_retryable()
        }
    }

    /// Run `op` until it succeeds, fails terminally, or attempts run out
    ///
    /// `op` receives the 1-based attempt number. Returns the final result
    /// with the number of attempts made.
    pub async fn run<F, Fut, T, E>(&self, mut op: F) -> (Result<T, E>, u32)
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Retryable + Display,
    {
        let max_attempts = self.max_attempts();
        let mut attempt = 1;

        loop {
            match op(attempt).await {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::debug!(attempt, "Attempt succeeded after retries");
                    }
                    return (Ok(value), attempt);
                }
                Err(error) => {
                    if attempt >= max_attempts || !self.should_retry(&error) {
                        return (Err(error), attempt);
                    }

                    let delay = self.delay_for_attempt(attempt);
                    tracing::warn!(
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "Attempt failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
