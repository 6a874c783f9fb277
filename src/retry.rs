//! Retry policy for routing-service requests.

use std::time::Duration;

use tracing::warn;

use crate::error::FetchError;
use crate::traits::Sleeper;

/// How often and how long to wait before giving up on a request.
///
/// Rate-limit responses and transient failures are counted separately, each
/// against `max_retries`. Any other failure ends the run at once.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub rate_limit_backoff: Duration,
    pub transient_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            rate_limit_backoff: Duration::from_secs(2),
            transient_backoff: Duration::from_millis(500),
        }
    }
}

/// A request that failed every attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct Exhausted {
    pub attempts: u32,
    pub last_error: FetchError,
}

impl RetryPolicy {
    /// No retries at all, e.g. for best-effort calls.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            rate_limit_backoff: Duration::ZERO,
            transient_backoff: Duration::ZERO,
        }
    }

    /// Runs `operation` until it succeeds or the retry budget is spent.
    pub fn run<T, S, F>(&self, sleeper: &S, mut operation: F) -> Result<T, Exhausted>
    where
        S: Sleeper + ?Sized,
        F: FnMut() -> Result<T, FetchError>,
    {
        let mut attempts = 0;
        let mut rate_limited = 0;
        let mut transient = 0;

        loop {
            attempts += 1;
            let err = match operation() {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            let (retries, backoff) = if err.is_rate_limit() {
                rate_limited += 1;
                (rate_limited, self.rate_limit_backoff)
            } else if err.is_transient() {
                transient += 1;
                (transient, self.transient_backoff)
            } else {
                return Err(Exhausted {
                    attempts,
                    last_error: err,
                });
            };

            if retries > self.max_retries {
                return Err(Exhausted {
                    attempts,
                    last_error: err,
                });
            }

            warn!(attempt = attempts, error = %err, "routing request failed, retrying in {:?}", backoff);
            sleeper.sleep(backoff);
        }
    }

    /// Like `run`, but substitutes `fallback` once retries are exhausted.
    pub fn run_or_else<T, S, F, G>(&self, sleeper: &S, operation: F, fallback: G) -> T
    where
        S: Sleeper + ?Sized,
        F: FnMut() -> Result<T, FetchError>,
        G: FnOnce(Exhausted) -> T,
    {
        self.run(sleeper, operation).unwrap_or_else(fallback)
    }
}
