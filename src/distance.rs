//! Distance matrix resolution against the routing service.
//!
//! Small location sets are resolved with one table request. Larger sets are
//! split into sequential batches whose intra-batch cells are exact; every
//! cell still empty afterwards (cross-batch pairs, failed batches) gets a
//! straight-line estimate.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::{PlannerError, Result};
use crate::haversine::HaversineMatrix;
use crate::model::{Coordinate, DailyRoute, DistanceMatrix};
use crate::polyline::Polyline;
use crate::retry::RetryPolicy;
use crate::traits::{DistanceMatrixProvider, RawTable, RoutingBackend, Sleeper, ThreadSleeper};

const METERS_PER_MILE: f64 = 1609.344;

/// Request sizing for the routing service.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchConfig {
    /// Most locations a single table request may carry.
    pub max_locations: usize,
    /// Pause between consecutive batch requests.
    pub inter_batch_delay: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_locations: 100,
            inter_batch_delay: Duration::from_secs(1),
        }
    }
}

/// Distance provider backed by a routing service.
pub struct DistanceService<B, S = ThreadSleeper> {
    backend: B,
    sleeper: S,
    retry: RetryPolicy,
    batching: BatchConfig,
    fallback: HaversineMatrix,
}

impl<B: RoutingBackend> DistanceService<B> {
    pub fn new(backend: B) -> Self {
        Self::with_sleeper(backend, ThreadSleeper)
    }
}

impl<B: RoutingBackend, S: Sleeper> DistanceService<B, S> {
    pub fn with_sleeper(backend: B, sleeper: S) -> Self {
        Self {
            backend,
            sleeper,
            retry: RetryPolicy::default(),
            batching: BatchConfig::default(),
            fallback: HaversineMatrix::default(),
        }
    }

    pub fn retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn batching(mut self, batching: BatchConfig) -> Self {
        self.batching = batching;
        self
    }

    pub fn fallback(mut self, fallback: HaversineMatrix) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Resolves the full matrix; `locations[0]` is the home base.
    pub fn matrix(&self, locations: &[Coordinate]) -> Result<DistanceMatrix> {
        let n = locations.len();
        if n <= 1 {
            return Ok(DistanceMatrix::zeroed(n));
        }

        let limit = self.batching.max_locations.max(2);
        if n <= limit {
            self.single_request(locations)
        } else {
            Ok(self.batched(locations, limit))
        }
    }

    fn single_request(&self, locations: &[Coordinate]) -> Result<DistanceMatrix> {
        let table = self
            .retry
            .run(&self.sleeper, || self.backend.table(locations))
            .map_err(|exhausted| PlannerError::ProviderUnavailable {
                attempts: exhausted.attempts,
                source: exhausted.last_error,
            })?;

        let mut matrix = DistanceMatrix::zeroed(locations.len());
        write_block(&mut matrix, &table, 0);
        // Unroutable pairs come back as null; estimate them like cross-batch cells.
        let filled = self.fallback.fill_missing(&mut matrix, locations);
        if filled > 0 {
            debug!(cells = filled, "estimated unroutable cells");
        }
        Ok(matrix)
    }

    fn batched(&self, locations: &[Coordinate], limit: usize) -> DistanceMatrix {
        let n = locations.len();
        let batches = n.div_ceil(limit);
        info!(locations = n, batches, "resolving distance matrix in batches");

        let mut matrix = DistanceMatrix::zeroed(n);
        for (batch, chunk) in locations.chunks(limit).enumerate() {
            if batch > 0 {
                self.sleeper.sleep(self.batching.inter_batch_delay);
            }
            let offset = batch * limit;
            let table = self.retry.run_or_else(
                &self.sleeper,
                || self.backend.table(chunk).map(Some),
                |exhausted| {
                    warn!(
                        batch,
                        attempts = exhausted.attempts,
                        error = %exhausted.last_error,
                        "routing service degraded, using straight-line estimates for batch"
                    );
                    None
                },
            );
            if let Some(table) = table {
                write_block(&mut matrix, &table, offset);
                debug!(batch, size = chunk.len(), "batch resolved");
            }
        }

        let filled = self.fallback.fill_missing(&mut matrix, locations);
        info!(cells = filled, "filled cross-batch cells with straight-line estimates");
        matrix
    }

    /// Road geometry through `locations` in order. Best effort: `None` on any
    /// failure.
    pub fn route_geometry(&self, locations: &[Coordinate]) -> Option<Polyline> {
        if locations.len() < 2 {
            return None;
        }
        match self.backend.route(locations) {
            Ok(polyline) if !polyline.is_empty() => Some(polyline),
            Ok(_) => None,
            Err(err) => {
                debug!(error = %err, "route geometry unavailable");
                None
            }
        }
    }

    /// Geometry of a whole day, home to home.
    pub fn day_geometry(&self, route: &DailyRoute, home: Coordinate) -> Option<Polyline> {
        let locations: Vec<Coordinate> = std::iter::once(home)
            .chain(route.facilities.iter().map(|stop| stop.location))
            .chain(std::iter::once(home))
            .collect();
        self.route_geometry(&locations)
    }
}

impl<B: RoutingBackend, S: Sleeper> DistanceMatrixProvider for DistanceService<B, S> {
    fn matrix_for(&self, locations: &[Coordinate]) -> Result<DistanceMatrix> {
        self.matrix(locations)
    }
}

/// Copies a raw table into the matrix at `offset`, converting meters to miles
/// and seconds to whole minutes.
fn write_block(matrix: &mut DistanceMatrix, table: &RawTable, offset: usize) {
    for (i, (distances, durations)) in table.distances.iter().zip(&table.durations).enumerate() {
        for (j, (meters, seconds)) in distances.iter().zip(durations).enumerate() {
            let (row, col) = (offset + i, offset + j);
            if row == col {
                continue;
            }
            if let (Some(meters), Some(seconds)) = (meters, seconds) {
                matrix.miles[row][col] = meters / METERS_PER_MILE;
                matrix.minutes[row][col] = (seconds / 60.0).round() as u32;
            }
        }
    }
}
