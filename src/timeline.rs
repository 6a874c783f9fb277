//! Re-timing of already ordered days.
//!
//! Used when visit durations or the start time change: drive legs and stop
//! order are kept exactly as they are, only the clock is replayed.

use crate::clock::ClockTime;
use crate::model::{DailyRoute, DayTotals, OptimizationResult, Stop};

/// Replays `route` from `start`, taking each stop's visit length from
/// `visit_minutes`.
pub fn recalculate<F>(route: &DailyRoute, start: ClockTime, visit_minutes: F) -> DailyRoute
where
    F: Fn(&Stop) -> u32,
{
    let facilities: Vec<Stop> = route
        .facilities
        .iter()
        .map(|stop| Stop {
            visit_minutes: visit_minutes(stop),
            ..stop.clone()
        })
        .collect();

    let mut segments = route.segments.clone();
    let mut clock = start;
    let mut last_departure = start;
    let mut visit_total: u32 = 0;

    for (position, segment) in segments.iter_mut().enumerate() {
        clock = clock.add_minutes(segment.drive_minutes);
        segment.arrival = clock;
        // Segments past the last stop are the drive home.
        let visit = facilities.get(position).map_or(0, |stop| stop.visit_minutes);
        clock = clock.add_minutes(visit);
        segment.departure = clock;
        if position < facilities.len() {
            visit_total = visit_total.saturating_add(visit);
            last_departure = clock;
        }
    }

    DailyRoute {
        day: route.day,
        sequence: route.sequence.clone(),
        facilities,
        segments,
        totals: DayTotals {
            miles: route.totals.miles,
            drive_minutes: route.totals.drive_minutes,
            visit_minutes: visit_total,
            total_minutes: clock.since(start),
            end_time: clock,
            last_departure,
        },
    }
}

/// Keeps every stop's current visit length.
pub fn current_visit(stop: &Stop) -> u32 {
    stop.visit_minutes
}

/// Re-times every day of `result`.
pub fn recalculate_result<F>(result: &OptimizationResult, start: ClockTime, visit_minutes: F) -> OptimizationResult
where
    F: Fn(&Stop) -> u32,
{
    let routes = result
        .routes
        .iter()
        .map(|route| recalculate(route, start, &visit_minutes))
        .collect();
    OptimizationResult::from_routes(routes)
}
