//! Entry point for the application layer: facilities in, plan out.

use tracing::info;

use crate::editor::EditContext;
use crate::error::{PlannerError, Result};
use crate::model::{Coordinate, DistanceMatrix, OptimizationResult, StopArena};
use crate::settings::Settings;
use crate::solver::{SolveOptions, solve};
use crate::traits::{DistanceMatrixProvider, Facility};

/// Builds the run's stop arena; facilities without their own visit length
/// get `default_visit_minutes`.
pub fn build_stops<F: Facility>(facilities: &[F], default_visit_minutes: u32) -> StopArena {
    StopArena::build(facilities.iter().map(|facility| {
        (
            facility.name().to_string(),
            facility.location(),
            facility.visit_minutes().unwrap_or(default_visit_minutes),
        )
    }))
}

pub struct Planner<M> {
    provider: M,
    options: SolveOptions,
}

impl<M: DistanceMatrixProvider> Planner<M> {
    pub fn new(provider: M) -> Self {
        Self {
            provider,
            options: SolveOptions::default(),
        }
    }

    pub fn with_options(mut self, options: SolveOptions) -> Self {
        self.options = options;
        self
    }

    pub fn provider(&self) -> &M {
        &self.provider
    }

    /// Validates inputs, then builds the arena and resolves its matrix.
    /// Precondition failures are reported before the provider is called.
    pub fn prepare<F: Facility>(
        &self,
        facilities: &[F],
        home: Option<Coordinate>,
        settings: &Settings,
    ) -> Result<(StopArena, DistanceMatrix, Coordinate)> {
        let home = home.ok_or(PlannerError::NoHomeBase)?;
        if facilities.is_empty() {
            return Err(PlannerError::NoActiveStops);
        }

        let stops = build_stops(facilities, settings.default_visit_minutes);
        stops.ensure_unique_names()?;
        let matrix = self.provider.matrix_for(&stops.coordinates(home))?;
        matrix.ensure_covers(&stops)?;
        Ok((stops, matrix, home))
    }

    /// Plans all `facilities` into days starting and ending at `home`.
    pub fn plan<F: Facility>(
        &self,
        facilities: &[F],
        home: Option<Coordinate>,
        settings: &Settings,
    ) -> Result<OptimizationResult> {
        let (stops, matrix, home) = self.prepare(facilities, home, settings)?;
        info!(facilities = stops.len(), "planning route");
        solve(&stops, &matrix, &settings.constraints, home, &self.options)
    }

    /// Fresh stops and matrix for editing an existing plan.
    pub fn edit_context<F: Facility>(
        &self,
        facilities: &[F],
        home: Option<Coordinate>,
        settings: &Settings,
    ) -> Result<EditContext> {
        let (stops, matrix, _) = self.prepare(facilities, home, settings)?;
        Ok(EditContext::new(stops, matrix, settings.constraints.start_time)?.with_options(self.options.clone()))
    }
}
