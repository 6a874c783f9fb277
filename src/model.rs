//! Planner data model: coordinates, the per-run stop arena, day routes and
//! the result snapshot handed to persistence and map rendering.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::clock::ClockTime;
use crate::error::{PlannerError, Result};

/// Index of the home base in every matrix and sequence.
pub const HOME_INDEX: usize = 0;

/// Display name used for the home base in segments.
pub const HOME_NAME: &str = "Home";

/// A point in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl From<(f64, f64)> for Coordinate {
    fn from((lat, lng): (f64, f64)) -> Self {
        Self { lat, lng }
    }
}

/// A facility visit within one planning run.
///
/// `index` is only meaningful inside the run that produced it; use `name` to
/// correlate across runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stop {
    pub index: usize,
    pub name: String,
    pub location: Coordinate,
    pub visit_minutes: u32,
}

/// The stops of one run, addressed by 1-based index.
#[derive(Debug, Clone, Default)]
pub struct StopArena {
    stops: Vec<Stop>,
    by_name: HashMap<String, usize>,
    duplicate: Option<String>,
}

impl StopArena {
    /// Builds the arena from `(name, location, visit minutes)` in order.
    /// Indices are assigned 1..=n. A repeated name keeps its first index for
    /// lookups and is reported by `ensure_unique_names`.
    pub fn build<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, Coordinate, u32)>,
        S: Into<String>,
    {
        let mut arena = Self::default();
        for (name, location, visit_minutes) in entries {
            let index = arena.stops.len() + 1;
            let name = name.into();
            if arena.by_name.contains_key(&name) {
                arena.duplicate.get_or_insert_with(|| name.clone());
            } else {
                arena.by_name.insert(name.clone(), index);
            }
            arena.stops.push(Stop {
                index,
                name,
                location,
                visit_minutes,
            });
        }
        arena
    }

    pub fn len(&self) -> usize {
        self.stops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Stop> {
        index.checked_sub(1).and_then(|i| self.stops.get(i))
    }

    /// Like `get`, but a miss is an invariant violation.
    pub fn require(&self, index: usize) -> Result<&Stop> {
        self.get(index).ok_or(PlannerError::StopNotFound(index))
    }

    /// Names are the only link between runs, so they must be unique.
    pub fn ensure_unique_names(&self) -> Result<()> {
        match &self.duplicate {
            Some(name) => Err(PlannerError::DuplicateStopName(name.clone())),
            None => Ok(()),
        }
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Stop> {
        self.stops.iter()
    }

    /// All stop indices, ascending.
    pub fn indices(&self) -> Vec<usize> {
        (1..=self.stops.len()).collect()
    }

    /// Matrix input order: home first, then stops by index.
    pub fn coordinates(&self, home: Coordinate) -> Vec<Coordinate> {
        std::iter::once(home)
            .chain(self.stops.iter().map(|stop| stop.location))
            .collect()
    }
}

/// Travel distances (miles) and durations (minutes) over `{home} ∪ stops`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceMatrix {
    pub miles: Vec<Vec<f64>>,
    pub minutes: Vec<Vec<u32>>,
}

impl DistanceMatrix {
    /// A zero-filled matrix for `size` locations.
    pub fn zeroed(size: usize) -> Self {
        Self {
            miles: vec![vec![0.0; size]; size],
            minutes: vec![vec![0; size]; size],
        }
    }

    pub fn size(&self) -> usize {
        self.miles.len()
    }

    pub fn miles(&self, from: usize, to: usize) -> f64 {
        self.miles[from][to]
    }

    pub fn minutes(&self, from: usize, to: usize) -> u32 {
        self.minutes[from][to]
    }

    /// Fails unless the matrix was built for exactly this arena and is square.
    pub fn ensure_covers(&self, stops: &StopArena) -> Result<()> {
        let expected = stops.len() + 1;
        let square = self.miles.iter().all(|row| row.len() == expected)
            && self.minutes.iter().all(|row| row.len() == expected);
        if self.size() != expected || self.minutes.len() != expected || !square {
            return Err(PlannerError::StaleMatrix {
                matrix: self.size(),
                expected,
            });
        }
        Ok(())
    }
}

/// One leg of a day: drive from `from` to `to`, then visit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub from: String,
    pub to: String,
    pub miles: f64,
    pub drive_minutes: u32,
    pub arrival: ClockTime,
    pub departure: ClockTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayTotals {
    pub miles: f64,
    pub drive_minutes: u32,
    pub visit_minutes: u32,
    pub total_minutes: u32,
    pub end_time: ClockTime,
    pub last_departure: ClockTime,
}

/// The itinerary of one travel day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyRoute {
    pub day: u32,
    pub sequence: Vec<usize>,
    pub facilities: Vec<Stop>,
    pub segments: Vec<Segment>,
    pub totals: DayTotals,
}

impl DailyRoute {
    pub fn stop_count(&self) -> usize {
        self.facilities.len()
    }

    pub fn total_hours(&self) -> f64 {
        self.totals.total_minutes as f64 / 60.0
    }

    pub fn contains(&self, index: usize) -> bool {
        self.sequence.contains(&index)
    }
}

/// All days of a plan plus grand totals. Edits produce a new value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationResult {
    pub routes: Vec<DailyRoute>,
    pub total_days: u32,
    pub total_miles: f64,
    pub total_facilities: usize,
    pub total_drive_minutes: u32,
    pub total_visit_minutes: u32,
    pub total_minutes: u32,
}

impl OptimizationResult {
    /// Drops empty days, renumbers the rest from 1 and recomputes totals.
    pub fn from_routes(routes: Vec<DailyRoute>) -> Self {
        let routes: Vec<DailyRoute> = routes
            .into_iter()
            .filter(|route| !route.sequence.is_empty())
            .enumerate()
            .map(|(position, mut route)| {
                route.day = position as u32 + 1;
                route
            })
            .collect();

        Self {
            total_days: routes.len() as u32,
            total_miles: routes.iter().map(|r| r.totals.miles).sum(),
            total_facilities: routes.iter().map(DailyRoute::stop_count).sum(),
            total_drive_minutes: routes.iter().map(|r| r.totals.drive_minutes).sum(),
            total_visit_minutes: routes.iter().map(|r| r.totals.visit_minutes).sum(),
            total_minutes: routes.iter().map(|r| r.totals.total_minutes).sum(),
            routes,
        }
    }

    pub fn day(&self, day: u32) -> Option<&DailyRoute> {
        self.routes.iter().find(|route| route.day == day)
    }

    /// Every stop index across all days, in day order.
    pub fn assigned_indices(&self) -> Vec<usize> {
        self.routes
            .iter()
            .flat_map(|route| route.sequence.iter().copied())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arena() -> StopArena {
        StopArena::build([
            ("Alpha", Coordinate::new(36.10, -115.10), 30),
            ("Bravo", Coordinate::new(36.20, -115.20), 45),
        ])
    }

    #[test]
    fn arena_is_one_based() {
        let stops = arena();
        assert!(stops.get(0).is_none());
        assert_eq!(stops.get(1).unwrap().name, "Alpha");
        assert_eq!(stops.get(2).unwrap().visit_minutes, 45);
        assert!(stops.get(3).is_none());
        assert!(matches!(stops.require(3), Err(PlannerError::StopNotFound(3))));
    }

    #[test]
    fn arena_lookup_by_name() {
        let stops = arena();
        assert_eq!(stops.index_of("Bravo"), Some(2));
        assert_eq!(stops.index_of("Charlie"), None);
    }

    #[test]
    fn coordinates_start_with_home() {
        let home = Coordinate::new(36.0, -115.0);
        let coords = arena().coordinates(home);
        assert_eq!(coords.len(), 3);
        assert_eq!(coords[0], home);
        assert_eq!(coords[2], Coordinate::new(36.20, -115.20));
    }

    #[test]
    fn stale_matrix_is_rejected() {
        let matrix = DistanceMatrix::zeroed(2);
        assert!(matches!(
            matrix.ensure_covers(&arena()),
            Err(PlannerError::StaleMatrix { matrix: 2, expected: 3 })
        ));
        assert!(DistanceMatrix::zeroed(3).ensure_covers(&arena()).is_ok());
    }

    #[test]
    fn jagged_matrix_is_rejected() {
        let mut matrix = DistanceMatrix::zeroed(3);
        matrix.miles[1].truncate(1);
        assert!(matches!(
            matrix.ensure_covers(&arena()),
            Err(PlannerError::StaleMatrix { expected: 3, .. })
        ));

        let mut matrix = DistanceMatrix::zeroed(3);
        matrix.minutes[2].push(0);
        assert!(matrix.ensure_covers(&arena()).is_err());
    }

    #[test]
    fn repeated_names_are_reported() {
        assert!(arena().ensure_unique_names().is_ok());

        let stops = StopArena::build([
            ("Walgreens", Coordinate::new(36.10, -115.10), 30),
            ("Walgreens", Coordinate::new(36.12, -115.12), 30),
            ("Target", Coordinate::new(36.20, -115.20), 30),
        ]);
        assert_eq!(stops.len(), 3);
        assert_eq!(stops.index_of("Walgreens"), Some(1));
        assert!(matches!(
            stops.ensure_unique_names(),
            Err(PlannerError::DuplicateStopName(name)) if name == "Walgreens"
        ));
    }

    #[test]
    fn from_routes_renumbers_and_drops_empty_days() {
        let totals = DayTotals {
            miles: 10.0,
            drive_minutes: 20,
            visit_minutes: 30,
            total_minutes: 50,
            end_time: ClockTime::from_hm(9, 0),
            last_departure: ClockTime::from_hm(8, 50),
        };
        let day = |day: u32, sequence: Vec<usize>| DailyRoute {
            day,
            sequence,
            facilities: Vec::new(),
            segments: Vec::new(),
            totals: totals.clone(),
        };

        let result = OptimizationResult::from_routes(vec![day(1, vec![1]), day(2, vec![]), day(3, vec![2])]);

        assert_eq!(result.total_days, 2);
        assert_eq!(result.routes[1].day, 2);
        assert_eq!(result.total_minutes, 100);
        assert!((result.total_miles - 20.0).abs() < 1e-9);
    }
}
