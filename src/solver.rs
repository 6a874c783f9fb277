//! Multi-day planner: clusters stops into territories, then fills days from
//! each territory until every stop is placed.

use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::balance::{balance, merge};
use crate::cluster::{Cluster, cluster, points_for, target_cluster_count};
use crate::error::{PlannerError, Result};
use crate::model::{Coordinate, DailyRoute, DistanceMatrix, HOME_INDEX, OptimizationResult, StopArena};
use crate::route::{build_route, nearest_neighbor, optimize};
use crate::settings::Constraints;

/// Tunable heuristics.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveOptions {
    /// k-means iteration cap.
    pub max_cluster_iterations: usize,
    /// 2-opt pass cap per route.
    pub max_two_opt_passes: usize,
    /// Minimum mileage gain for a 2-opt move to count.
    pub improvement_epsilon: f64,
    /// Drive time assumed per stop when estimating a cluster's day length.
    pub travel_minutes_per_stop: f64,
    /// Clusters merge when centroids are within this multiple of their
    /// average intra-cluster distance.
    pub adjacency_factor: f64,
    /// Tightness used when re-clustering stops missed by the main pass.
    pub orphan_tightness: f64,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            max_cluster_iterations: 100,
            max_two_opt_passes: 200,
            improvement_epsilon: 1e-9,
            travel_minutes_per_stop: 15.0,
            adjacency_factor: 2.0,
            orphan_tightness: 1.0,
        }
    }
}

/// Plans every stop in `stops` into days.
///
/// `matrix` must have been computed for exactly `stops` with `home` first.
pub fn solve(
    stops: &StopArena,
    matrix: &DistanceMatrix,
    constraints: &Constraints,
    home: Coordinate,
    options: &SolveOptions,
) -> Result<OptimizationResult> {
    if stops.is_empty() {
        return Err(PlannerError::NoActiveStops);
    }
    matrix.ensure_covers(stops)?;

    let capacity = day_capacity(stops, constraints, options);
    let all = stops.indices();
    let clusters = territories(stops, &all, capacity, constraints, home, options, constraints.tightness());
    debug!(stops = stops.len(), capacity, clusters = clusters.len(), "clustered stops");

    let mut days = DayBuilder::new(stops, matrix, constraints, options);
    for territory in &clusters {
        days.fill(&territory.indices())?;
    }

    let orphans = days.missing(&all);
    if !orphans.is_empty() {
        warn!(count = orphans.len(), "stops missed by clustering, planning them separately");
        let retry = territories(stops, &orphans, capacity, constraints, home, options, options.orphan_tightness);
        for territory in &retry {
            days.fill(&territory.indices())?;
        }
    }

    let result = OptimizationResult::from_routes(days.finish());
    info!(
        days = result.total_days,
        facilities = result.total_facilities,
        miles = result.total_miles,
        "planned stops"
    );
    Ok(result)
}

/// Stops a cluster should hold so one cluster roughly fills one day.
pub fn day_capacity(stops: &StopArena, constraints: &Constraints, options: &SolveOptions) -> usize {
    if let Some(limit) = constraints.stop_limit() {
        return limit;
    }
    if let Some(minutes) = constraints.minute_limit() {
        let average_visit = stops.iter().map(|stop| stop.visit_minutes as f64).sum::<f64>() / stops.len().max(1) as f64;
        let per_stop = average_visit + options.travel_minutes_per_stop;
        if per_stop > 0.0 {
            return ((minutes / per_stop).floor() as usize).max(1);
        }
    }
    stops.len().max(1)
}

/// Clusters, balances and merges `indices`, nearest territory first.
fn territories(
    stops: &StopArena,
    indices: &[usize],
    capacity: usize,
    constraints: &Constraints,
    home: Coordinate,
    options: &SolveOptions,
    tightness: f64,
) -> Vec<Cluster> {
    let points = points_for(stops, indices);
    let k = target_cluster_count(points.len(), capacity);
    let clusters = cluster(&points, k, options.max_cluster_iterations, tightness);
    let clusters = balance(clusters, capacity, home, constraints.balance_weight());
    merge(clusters, capacity, constraints, home, options)
}

/// Accumulates committed days.
struct DayBuilder<'a> {
    stops: &'a StopArena,
    matrix: &'a DistanceMatrix,
    constraints: &'a Constraints,
    options: &'a SolveOptions,
    routes: Vec<DailyRoute>,
}

impl<'a> DayBuilder<'a> {
    fn new(
        stops: &'a StopArena,
        matrix: &'a DistanceMatrix,
        constraints: &'a Constraints,
        options: &'a SolveOptions,
    ) -> Self {
        Self {
            stops,
            matrix,
            constraints,
            options,
            routes: Vec::new(),
        }
    }

    fn next_day(&self) -> u32 {
        self.routes.len() as u32 + 1
    }

    fn route(&self, sequence: &[usize]) -> Result<DailyRoute> {
        let refined = optimize(self.matrix, sequence, HOME_INDEX, self.options);
        build_route(
            self.stops,
            &refined,
            self.matrix,
            HOME_INDEX,
            self.constraints.start_time,
            self.next_day(),
        )
    }

    fn fits(&self, route: &DailyRoute) -> bool {
        self.constraints.admits(route.stop_count(), route.totals.total_minutes)
    }

    /// Commits one territory as a single day when it fits, otherwise splits
    /// it greedily along its nearest-neighbour order.
    fn fill(&mut self, ids: &[usize]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let tour = nearest_neighbor(self.matrix, ids, HOME_INDEX);
        let whole = self.route(&tour)?;
        if self.fits(&whole) {
            self.routes.push(whole);
            return Ok(());
        }

        let mut remaining = tour.as_slice();
        while !remaining.is_empty() {
            // A lone stop is always placed, even when it alone breaks a limit.
            let mut taken = 1;
            let mut day = self.route(&remaining[..1])?;
            while taken < remaining.len() {
                let tentative = self.route(&remaining[..=taken])?;
                if !self.fits(&tentative) {
                    break;
                }
                day = tentative;
                taken += 1;
            }
            if !self.fits(&day) {
                warn!(stop = remaining[0], minutes = day.totals.total_minutes, "single stop exceeds the day limit");
            }
            debug!(day = day.day, stops = day.stop_count(), "committed split day");
            self.routes.push(day);
            remaining = &remaining[taken..];
        }
        Ok(())
    }

    fn missing(&self, expected: &[usize]) -> Vec<usize> {
        let placed: HashSet<usize> = self.routes.iter().flat_map(|route| route.sequence.iter().copied()).collect();
        expected.iter().copied().filter(|index| !placed.contains(index)).collect()
    }

    fn finish(self) -> Vec<DailyRoute> {
        self.routes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ClockTime;
    use crate::haversine::HaversineMatrix;
    use crate::traits::DistanceMatrixProvider;

    const HOME: Coordinate = Coordinate::new(36.0, -115.0);

    fn setup(entries: Vec<(f64, f64, u32)>) -> (StopArena, DistanceMatrix) {
        let stops = StopArena::build(
            entries
                .into_iter()
                .enumerate()
                .map(|(i, (lat, lng, minutes))| (format!("F{}", i + 1), Coordinate::new(lat, lng), minutes)),
        );
        let matrix = HaversineMatrix::default().matrix_for(&stops.coordinates(HOME)).unwrap();
        (stops, matrix)
    }

    fn stops_only(limit: usize) -> Constraints {
        Constraints {
            use_facilities_constraint: true,
            max_facilities_per_day: limit,
            use_hours_constraint: false,
            ..Constraints::default()
        }
    }

    #[test]
    fn empty_input_is_rejected() {
        let stops = StopArena::default();
        let err = solve(&stops, &DistanceMatrix::zeroed(1), &Constraints::default(), HOME, &SolveOptions::default());
        assert!(matches!(err, Err(PlannerError::NoActiveStops)));
    }

    #[test]
    fn capacity_prefers_stop_limit() {
        let (stops, _) = setup(vec![(36.1, -115.1, 30); 4]);
        let options = SolveOptions::default();
        assert_eq!(day_capacity(&stops, &stops_only(5), &options), 5);

        let hours = Constraints {
            use_facilities_constraint: false,
            use_hours_constraint: true,
            max_hours_per_day: 3.0,
            ..Constraints::default()
        };
        // 180 / (30 + 15)
        assert_eq!(day_capacity(&stops, &hours, &options), 4);

        let open = Constraints {
            use_facilities_constraint: false,
            use_hours_constraint: false,
            ..Constraints::default()
        };
        assert_eq!(day_capacity(&stops, &open, &options), 4);
    }

    #[test]
    fn splits_a_territory_by_stop_limit() {
        let entries = (0..7).map(|i| (36.10 + i as f64 * 0.002, -115.10, 20)).collect();
        let (stops, matrix) = setup(entries);
        let result = solve(&stops, &matrix, &stops_only(3), HOME, &SolveOptions::default()).unwrap();

        assert!(result.routes.iter().all(|route| route.stop_count() <= 3));
        let mut all = result.assigned_indices();
        all.sort();
        assert_eq!(all, (1..=7).collect::<Vec<_>>());
    }

    #[test]
    fn oversized_stop_gets_its_own_day() {
        let constraints = Constraints {
            use_facilities_constraint: false,
            use_hours_constraint: true,
            max_hours_per_day: 2.0,
            start_time: ClockTime::from_hm(7, 0),
            ..Constraints::default()
        };
        let (stops, matrix) = setup(vec![(36.05, -115.05, 300), (36.051, -115.05, 30)]);
        let result = solve(&stops, &matrix, &constraints, HOME, &SolveOptions::default()).unwrap();

        assert_eq!(result.total_days, 2);
        let long_day = result.routes.iter().find(|route| route.contains(1)).unwrap();
        assert_eq!(long_day.stop_count(), 1);
        assert!(long_day.total_hours() > 2.0);
        for route in &result.routes {
            assert!(route.stop_count() == 1 || route.total_hours() <= 2.0);
        }
    }

    #[test]
    fn orphans_are_detected() {
        let (stops, matrix) = setup(vec![(36.1, -115.1, 30), (36.2, -115.2, 30), (36.3, -115.3, 30)]);
        let constraints = stops_only(5);
        let options = SolveOptions::default();
        let mut days = DayBuilder::new(&stops, &matrix, &constraints, &options);
        days.fill(&[2]).unwrap();

        assert_eq!(days.missing(&stops.indices()), vec![1, 3]);
        days.fill(&[1, 3]).unwrap();
        assert!(days.missing(&stops.indices()).is_empty());
        assert_eq!(days.finish().len(), 2);
    }
}
