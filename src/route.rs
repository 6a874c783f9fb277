//! Single-day route construction: stop ordering and the timed itinerary.

use crate::clock::ClockTime;
use crate::error::Result;
use crate::model::{DailyRoute, DayTotals, DistanceMatrix, HOME_NAME, Segment, StopArena};
use crate::solver::SolveOptions;

/// Miles of `home -> sequence... -> home`.
pub fn tour_miles(matrix: &DistanceMatrix, sequence: &[usize], home: usize) -> f64 {
    if sequence.is_empty() {
        return 0.0;
    }
    let mut total = matrix.miles(home, sequence[0]);
    for pair in sequence.windows(2) {
        total += matrix.miles(pair[0], pair[1]);
    }
    total + matrix.miles(sequence[sequence.len() - 1], home)
}

/// Nearest-neighbour tour over `ids`, seeded from the stop nearest home.
pub fn nearest_neighbor(matrix: &DistanceMatrix, ids: &[usize], home: usize) -> Vec<usize> {
    let mut remaining = ids.to_vec();
    let mut tour = Vec::with_capacity(ids.len());
    let mut current = home;

    while !remaining.is_empty() {
        let mut best = 0;
        for (position, &candidate) in remaining.iter().enumerate() {
            if matrix.miles(current, candidate) < matrix.miles(current, remaining[best]) {
                best = position;
            }
        }
        current = remaining.remove(best);
        tour.push(current);
    }

    tour
}

/// 2-opt refinement of a home-to-home tour.
///
/// Every segment reversal is scored on the full tour, so asymmetric matrices
/// are handled. Improvements must exceed `options.improvement_epsilon`.
pub fn optimize(matrix: &DistanceMatrix, sequence: &[usize], home: usize, options: &SolveOptions) -> Vec<usize> {
    let mut tour = sequence.to_vec();
    let n = tour.len();
    if n < 2 {
        return tour;
    }

    let mut best = tour_miles(matrix, &tour, home);
    for _ in 0..options.max_two_opt_passes {
        let mut improved = false;
        for i in 0..n - 1 {
            for j in i + 1..n {
                tour[i..=j].reverse();
                let candidate = tour_miles(matrix, &tour, home);
                if candidate < best - options.improvement_epsilon {
                    best = candidate;
                    improved = true;
                } else {
                    tour[i..=j].reverse();
                }
            }
        }
        if !improved {
            break;
        }
    }

    tour
}

/// Walks `sequence` from home and back, producing the day's timeline.
///
/// Fails with `StopNotFound` when an index has no stop and with
/// `StaleMatrix` when the matrix does not match `stops`.
pub fn build_route(
    stops: &StopArena,
    sequence: &[usize],
    matrix: &DistanceMatrix,
    home: usize,
    start: ClockTime,
    day: u32,
) -> Result<DailyRoute> {
    matrix.ensure_covers(stops)?;

    let mut facilities = Vec::with_capacity(sequence.len());
    let mut segments = Vec::with_capacity(sequence.len() + 1);
    let mut clock = start;
    let mut previous = home;
    let mut previous_name = HOME_NAME.to_string();
    let mut miles = 0.0;
    let mut drive_minutes = 0;
    let mut visit_minutes: u32 = 0;

    for &index in sequence {
        let stop = stops.require(index)?;
        let leg_miles = matrix.miles(previous, index);
        let leg_minutes = matrix.minutes(previous, index);
        let arrival = clock.add_minutes(leg_minutes);
        let departure = arrival.add_minutes(stop.visit_minutes);

        segments.push(Segment {
            from: previous_name,
            to: stop.name.clone(),
            miles: leg_miles,
            drive_minutes: leg_minutes,
            arrival,
            departure,
        });
        facilities.push(stop.clone());

        miles += leg_miles;
        drive_minutes += leg_minutes;
        visit_minutes = visit_minutes.saturating_add(stop.visit_minutes);
        clock = departure;
        previous = index;
        previous_name = stop.name.clone();
    }

    let last_departure = clock;
    if !sequence.is_empty() {
        let leg_miles = matrix.miles(previous, home);
        let leg_minutes = matrix.minutes(previous, home);
        clock = clock.add_minutes(leg_minutes);
        segments.push(Segment {
            from: previous_name,
            to: HOME_NAME.to_string(),
            miles: leg_miles,
            drive_minutes: leg_minutes,
            arrival: clock,
            departure: clock,
        });
        miles += leg_miles;
        drive_minutes += leg_minutes;
    }

    Ok(DailyRoute {
        day,
        sequence: sequence.to_vec(),
        facilities,
        segments,
        totals: DayTotals {
            miles,
            drive_minutes,
            visit_minutes,
            total_minutes: clock.since(start),
            end_time: clock,
            last_departure,
        },
    })
}

/// Nearest-neighbour order refined by 2-opt.
pub fn plan_order(matrix: &DistanceMatrix, ids: &[usize], home: usize, options: &SolveOptions) -> Vec<usize> {
    let tour = nearest_neighbor(matrix, ids, home);
    optimize(matrix, &tour, home, options)
}
