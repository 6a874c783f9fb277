//! Seams between the planner and its collaborators.
//!
//! Applications implement `Facility` for their own records; the routing
//! service and the clock used for backoff are swappable so tests can inject
//! fakes.

use std::time::Duration;

use crate::error::{FetchError, Result};
use crate::model::{Coordinate, DistanceMatrix};
use crate::polyline::Polyline;

/// An active facility to be visited.
pub trait Facility {
    /// Stable name used to correlate stops across runs.
    fn name(&self) -> &str;

    /// Pre-resolved location.
    fn location(&self) -> Coordinate;

    /// Visit duration override in minutes. `None` uses the settings default.
    fn visit_minutes(&self) -> Option<u32>;
}

/// Provides a distance/duration matrix for a set of locations.
///
/// The matrix is indexed by the provided location order; the first location
/// is the home base.
pub trait DistanceMatrixProvider {
    fn matrix_for(&self, locations: &[Coordinate]) -> Result<DistanceMatrix>;
}

/// Raw pairwise table as returned by a routing service.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    /// Meters; `None` where the service found no route.
    pub distances: Vec<Vec<Option<f64>>>,
    /// Seconds; `None` where the service found no route.
    pub durations: Vec<Vec<Option<f64>>>,
}

/// A single request/response against the external routing service.
pub trait RoutingBackend {
    fn table(&self, locations: &[Coordinate]) -> std::result::Result<RawTable, FetchError>;

    fn route(&self, locations: &[Coordinate]) -> std::result::Result<Polyline, FetchError>;
}

/// Blocks the current thread. Swapped for a recorder in tests.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

/// Sleeps on the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}
