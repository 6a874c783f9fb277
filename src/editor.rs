//! Incremental edits on a finished plan.
//!
//! Every edit takes a snapshot and returns a new one. Only the days touched
//! by the edit are re-ordered and re-timed; the rest are carried over as-is.

use tracing::debug;

use crate::clock::ClockTime;
use crate::error::{PlannerError, Result};
use crate::model::{DailyRoute, DistanceMatrix, HOME_INDEX, OptimizationResult, StopArena};
use crate::route::{build_route, optimize};
use crate::solver::SolveOptions;

/// The current stop set and its matrix, rebuilt for the edit.
///
/// Day members are matched to `stops` by name, so a plan produced by an
/// earlier run stays editable after the facility list changed.
#[derive(Debug, Clone)]
pub struct EditContext {
    pub stops: StopArena,
    pub matrix: DistanceMatrix,
    pub start_time: ClockTime,
    pub options: SolveOptions,
}

impl EditContext {
    pub fn new(stops: StopArena, matrix: DistanceMatrix, start_time: ClockTime) -> Result<Self> {
        stops.ensure_unique_names()?;
        matrix.ensure_covers(&stops)?;
        Ok(Self {
            stops,
            matrix,
            start_time,
            options: SolveOptions::default(),
        })
    }

    pub fn with_options(mut self, options: SolveOptions) -> Self {
        self.options = options;
        self
    }

    /// Maps member names to current indices, re-optimizes and re-times.
    fn rebuild(&self, day: u32, names: &[String]) -> Result<DailyRoute> {
        let sequence = names
            .iter()
            .map(|name| {
                self.stops
                    .index_of(name)
                    .ok_or_else(|| PlannerError::StopNameNotFound(name.clone()))
            })
            .collect::<Result<Vec<_>>>()?;
        let refined = optimize(&self.matrix, &sequence, HOME_INDEX, &self.options);
        build_route(&self.stops, &refined, &self.matrix, HOME_INDEX, self.start_time, day)
    }

    /// Points an untouched day at the current indices without re-ordering or
    /// re-timing it.
    fn reindex(&self, route: &DailyRoute) -> Result<DailyRoute> {
        let mut route = route.clone();
        for (slot, stop) in route.facilities.iter_mut().enumerate() {
            let index = self
                .stops
                .index_of(&stop.name)
                .ok_or_else(|| PlannerError::StopNameNotFound(stop.name.clone()))?;
            stop.index = index;
            route.sequence[slot] = index;
        }
        Ok(route)
    }
}

/// Moves stop `stop` (a run index) from `from_day` to the end of `to_day`,
/// then re-plans both days.
pub fn move_stop(
    result: &OptimizationResult,
    context: &EditContext,
    stop: usize,
    from_day: u32,
    to_day: u32,
) -> Result<OptimizationResult> {
    bulk_move_stops(result, context, &[(stop, from_day)], to_day)
}

/// Moves each `(stop, from_day)` pair into `to_day`. Source days left empty
/// are dropped and the remaining days renumbered.
pub fn bulk_move_stops(
    result: &OptimizationResult,
    context: &EditContext,
    moves: &[(usize, u32)],
    to_day: u32,
) -> Result<OptimizationResult> {
    let mut members = member_names(result);
    let target = position_of(result, to_day)?;

    let mut touched = vec![target];
    for &(stop, from_day) in moves {
        let source = position_of(result, from_day)?;
        if source == target {
            continue;
        }
        let slot = result.routes[source]
            .sequence
            .iter()
            .position(|&index| index == stop)
            .ok_or(PlannerError::StopNotInDay { stop, day: from_day })?;
        let name = result.routes[source].facilities[slot].name.clone();
        let Some(found) = members[source].iter().position(|member| *member == name) else {
            // Already moved by an earlier entry of this batch.
            continue;
        };
        members[source].remove(found);
        members[target].push(name);
        if !touched.contains(&source) {
            touched.push(source);
        }
    }

    debug!(moves = moves.len(), to_day, days = touched.len(), "moving stops");
    rebuild_days(result, context, &members, &touched)
}

/// Deletes `stop` from `day` and re-plans that day; an emptied day is
/// dropped.
pub fn remove_stop(result: &OptimizationResult, context: &EditContext, stop: usize, day: u32) -> Result<OptimizationResult> {
    let position = position_of(result, day)?;
    let slot = result.routes[position]
        .sequence
        .iter()
        .position(|&index| index == stop)
        .ok_or(PlannerError::StopNotInDay { stop, day })?;

    let mut members = member_names(result);
    members[position].remove(slot);

    debug!(stop, day, remaining = members[position].len(), "removing stop");
    rebuild_days(result, context, &members, &[position])
}

fn position_of(result: &OptimizationResult, day: u32) -> Result<usize> {
    result
        .routes
        .iter()
        .position(|route| route.day == day)
        .ok_or(PlannerError::DayNotFound(day))
}

fn member_names(result: &OptimizationResult) -> Vec<Vec<String>> {
    result
        .routes
        .iter()
        .map(|route| route.facilities.iter().map(|stop| stop.name.clone()).collect())
        .collect()
}

fn rebuild_days(
    result: &OptimizationResult,
    context: &EditContext,
    members: &[Vec<String>],
    touched: &[usize],
) -> Result<OptimizationResult> {
    let mut routes = Vec::with_capacity(result.routes.len());
    for (position, route) in result.routes.iter().enumerate() {
        if !touched.contains(&position) {
            routes.push(context.reindex(route)?);
        } else if !members[position].is_empty() {
            routes.push(context.rebuild(route.day, &members[position])?);
        }
    }
    Ok(OptimizationResult::from_routes(routes))
}
