//! inspection-planner core
//!
//! Splits a list of facilities into travel days from a home base and builds
//! a timed itinerary for each day.

pub mod error;
pub mod clock;
pub mod model;
pub mod settings;
pub mod traits;
pub mod haversine;
pub mod polyline;
pub mod retry;
pub mod osrm;
pub mod distance;
pub mod cluster;
pub mod balance;
pub mod route;
pub mod solver;
pub mod editor;
pub mod timeline;
pub mod planner;

pub use error::{FetchError, PlannerError, Result};
pub use model::{Coordinate, DailyRoute, DistanceMatrix, OptimizationResult, Segment, Stop, StopArena};
pub use planner::Planner;
pub use settings::{Constraints, Settings};
