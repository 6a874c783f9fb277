//! Error taxonomy for planning runs and routing-service calls.

use thiserror::Error;

/// Result alias used across the planner.
pub type Result<T> = std::result::Result<T, PlannerError>;

/// Failures surfaced to the caller. A run that returns one of these never
/// produces a partial result.
#[derive(Debug, Error)]
pub enum PlannerError {
    /// The routing service exhausted its retries on a path with no fallback.
    #[error("routing service unavailable after {attempts} attempts: {source}")]
    ProviderUnavailable {
        attempts: u32,
        #[source]
        source: FetchError,
    },

    /// A sequence referenced an index with no backing stop.
    #[error("stop index {0} has no backing stop")]
    StopNotFound(usize),

    /// A day references a facility name missing from the current stop set.
    #[error("stop {0:?} is not among the active stops")]
    StopNameNotFound(String),

    /// Two facilities share a name, so edits could not tell them apart.
    #[error("facility name {0:?} is used more than once")]
    DuplicateStopName(String),

    #[error("no active stops to plan")]
    NoActiveStops,

    #[error("no home base configured")]
    NoHomeBase,

    /// The matrix was computed for a different stop set.
    #[error("distance matrix covers {matrix} locations but the run has {expected}")]
    StaleMatrix { matrix: usize, expected: usize },

    #[error("day {0} does not exist")]
    DayNotFound(u32),

    #[error("stop {stop} is not on day {day}")]
    StopNotInDay { stop: usize, day: u32 },

    #[error("invalid clock time {0:?}, expected HH:MM")]
    InvalidClockTime(String),
}

/// Transport-level failures of a single routing-service request.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FetchError {
    #[error("rate limited by routing service")]
    RateLimited,

    #[error("routing service returned HTTP {0}")]
    Status(u16),

    #[error("routing service answered with code {0:?}")]
    Code(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("malformed response: {0}")]
    Decode(String),
}

impl FetchError {
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, FetchError::RateLimited)
    }

    /// Server-side and network failures that may clear up on their own.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Status(status) => *status >= 500 || *status == 408,
            FetchError::Network(_) => true,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.status().map(|status| status.as_u16()) == Some(429) {
            FetchError::RateLimited
        } else if let Some(status) = err.status() {
            FetchError::Status(status.as_u16())
        } else if err.is_decode() {
            FetchError::Decode(err.to_string())
        } else {
            FetchError::Network(err.to_string())
        }
    }
}
