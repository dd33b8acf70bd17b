//! Rate limiting for request execution

use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

/// Slack for float drift when a refill lands exactly on a whole token
const TOKEN_EPSILON: f64 = 1e-9;

/// Token bucket shared by every unit of a run
///
/// The bucket starts full. Tokens refill continuously at
/// `requests_per_minute / 60_000` per millisecond up to `capacity`, so a
/// run may burst up to `capacity` requests and then settles at the
/// configured rate.
pub struct RequestRateLimiter {
    state: Mutex<BucketState>,
    capacity: f64,
    refill_rate_per_ms: f64,
    requests_per_minute: u32,
    min_wait: Duration,
}

struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

/// Point-in-time view of the bucket
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimiterState {
    /// Maximum tokens
    pub capacity: f64,
    /// Tokens added per millisecond
    pub refill_rate_per_ms: f64,
    /// Tokens available now
    pub current_tokens: f64,
    /// Time of the last refill
    pub last_refill: Instant,
}

impl RequestRateLimiter {
    /// Shortest sleep taken by [`wait_for_token`](Self::wait_for_token)
    pub const DEFAULT_MIN_WAIT: Duration = Duration::from_millis(100);

    /// Create a full bucket
    ///
    /// Zero values are raised to 1.
    pub fn new(capacity: usize, requests_per_minute: u32) -> Self {
        let requests_per_minute = requests_per_minute.max(1);
        let capacity = capacity.max(1) as f64;

        Self {
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
            capacity,
            refill_rate_per_ms: f64::from(requests_per_minute) / 60_000.0,
            requests_per_minute,
            min_wait: Self::DEFAULT_MIN_WAIT,
        }
    }

    /// Override the minimum sleep between token checks
    pub fn with_min_wait(mut self, min_wait: Duration) -> Self {
        self.min_wait = min_wait;
        self
    }

    /// Take a token if one is available
    pub fn try_consume(&self) -> bool {
        let mut state = self.state.lock();
        self.refill(&mut state);
        if has_token(state.tokens) {
            state.tokens = (state.tokens - 1.0).max(0.0);
            true
        } else {
            false
        }
    }

    /// Wait until a token is available and take it
    ///
    /// The lock is only held while checking; the sleep happens outside it,
    /// so a waiting task never blocks other callers.
    pub async fn wait_for_token(&self) {
        loop {
            let wait = {
                let mut state = self.state.lock();
                self.refill(&mut state);
                if has_token(state.tokens) {
                    state.tokens = (state.tokens - 1.0).max(0.0);
                    return;
                }
                self.deficit_wait(state.tokens)
            };
            tokio::time::sleep(wait.max(self.min_wait)).await;
        }
    }

    /// Time until the next token becomes available
    pub fn time_until_token(&self) -> Duration {
        let mut state = self.state.lock();
        self.refill(&mut state);
        if has_token(state.tokens) {
            Duration::ZERO
        } else {
            self.deficit_wait(state.tokens)
        }
    }

    /// Snapshot of the bucket, refilled to now
    pub fn state(&self) -> RateLimiterState {
        let mut state = self.state.lock();
        self.refill(&mut state);
        RateLimiterState {
            capacity: self.capacity,
            refill_rate_per_ms: self.refill_rate_per_ms,
            current_tokens: state.tokens,
            last_refill: state.last_refill,
        }
    }

    /// Configured sustained rate
    pub fn requests_per_minute(&self) -> u32 {
        self.requests_per_minute
    }

    fn refill(&self, state: &mut BucketState) {
        let now = Instant::now();
        let elapsed_ms = now.saturating_duration_since(state.last_refill).as_secs_f64() * 1000.0;
        state.tokens = (state.tokens + elapsed_ms * self.refill_rate_per_ms).min(self.capacity);
        state.last_refill = now;
    }

    /// Rounded up to the next nanosecond so the wait always covers the deficit
    fn deficit_wait(&self, tokens: f64) -> Duration {
        let ms = (1.0 - tokens).max(0.0) / self.refill_rate_per_ms;
        Duration::from_nanos((ms * 1_000_000.0).ceil() as u64)
    }
}

fn has_token(tokens: f64) -> bool {
    tokens + TOKEN_EPSILON >= 1.0
}

impl std::fmt::Debug for RequestRateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestRateLimiter")
            .field("capacity", &self.capacity)
            .field("requests_per_minute", &self.requests_per_minute)
            .field("min_wait", &self.min_wait)
            .finish()
    }
}
