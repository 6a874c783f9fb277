//! Per-user planning settings handed in by the application layer.

use serde::{Deserialize, Serialize};

use crate::clock::ClockTime;

/// Day limits and clustering knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Constraints {
    pub use_facilities_constraint: bool,
    pub max_facilities_per_day: usize,
    pub use_hours_constraint: bool,
    pub max_hours_per_day: f64,
    pub start_time: ClockTime,
    /// 0..=1, higher means more, smaller clusters.
    pub cluster_tightness: f64,
    /// 0..=1, higher favours even day sizes over geographic tightness.
    pub cluster_balance_weight: f64,
}

impl Default for Constraints {
    fn default() -> Self {
        Self {
            use_facilities_constraint: true,
            max_facilities_per_day: 8,
            use_hours_constraint: true,
            max_hours_per_day: 8.0,
            start_time: ClockTime::from_hm(8, 0),
            cluster_tightness: 0.5,
            cluster_balance_weight: 0.5,
        }
    }
}

impl Constraints {
    /// Active stop limit, if any.
    pub fn stop_limit(&self) -> Option<usize> {
        (self.use_facilities_constraint && self.max_facilities_per_day > 0)
            .then_some(self.max_facilities_per_day)
    }

    /// Active day length limit in minutes, if any.
    pub fn minute_limit(&self) -> Option<f64> {
        (self.use_hours_constraint && self.max_hours_per_day > 0.0).then_some(self.max_hours_per_day * 60.0)
    }

    /// Whether a day with `stops` stops lasting `total_minutes` fits.
    pub fn admits(&self, stops: usize, total_minutes: u32) -> bool {
        let within_stops = self.stop_limit().is_none_or(|limit| stops <= limit);
        let within_hours = self.minute_limit().is_none_or(|limit| total_minutes as f64 <= limit);
        within_stops && within_hours
    }

    pub fn tightness(&self) -> f64 {
        self.cluster_tightness.clamp(0.0, 1.0)
    }

    pub fn balance_weight(&self) -> f64 {
        self.cluster_balance_weight.clamp(0.0, 1.0)
    }
}

/// Everything the planner reads from the user's settings record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    #[serde(flatten)]
    pub constraints: Constraints,
    /// Used for facilities without their own visit duration.
    pub default_visit_minutes: u32,
    /// Offset applied by callers that align a plan with sunset; the planner
    /// carries it but does not schedule against it.
    pub sunset_offset_minutes: i32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            constraints: Constraints::default(),
            default_visit_minutes: 30,
            sunset_offset_minutes: 0,
        }
    }
}
