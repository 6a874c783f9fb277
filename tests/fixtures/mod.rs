//! Test fixtures for inspection-planner.
//!
//! Provides realistic test data including:
//! - Real Las Vegas / Henderson locations (from OpenStreetMap)
//! - A builder for facilities with sensible defaults

pub mod las_vegas_locations;

pub use las_vegas_locations::*;

use inspection_planner::model::Coordinate;
use inspection_planner::traits::Facility;

/// Builder for test facilities.
#[derive(Clone, Debug)]
pub struct TestFacility {
    pub name: String,
    pub location: Coordinate,
    pub visit_minutes: Option<u32>,
}

impl TestFacility {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            location: Coordinate::new(0.0, 0.0),
            visit_minutes: None,
        }
    }

    pub fn at(mut self, lat: f64, lng: f64) -> Self {
        self.location = Coordinate::new(lat, lng);
        self
    }

    pub fn minutes(mut self, minutes: u32) -> Self {
        self.visit_minutes = Some(minutes);
        self
    }
}

impl From<&Location> for TestFacility {
    fn from(location: &Location) -> Self {
        TestFacility::new(location.name).at(location.lat, location.lng)
    }
}

impl Facility for TestFacility {
    fn name(&self) -> &str {
        &self.name
    }

    fn location(&self) -> Coordinate {
        self.location
    }

    fn visit_minutes(&self) -> Option<u32> {
        self.visit_minutes
    }
}
