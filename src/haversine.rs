//! Straight-line distance estimates (fallback when the routing service is
//! unavailable or a cell was never requested).
//!
//! Uses great-circle distance stretched by a detour factor, and an assumed
//! average speed for travel time. Less accurate than road routing but always
//! available.

use rayon::prelude::*;

use crate::error::Result;
use crate::model::{Coordinate, DistanceMatrix};
use crate::traits::DistanceMatrixProvider;

/// Earth radius in miles.
const EARTH_RADIUS_MILES: f64 = 3958.8;

/// Straight line to road distance.
pub const DEFAULT_DETOUR_FACTOR: f64 = 1.3;

/// Average driving speed assumption for time estimation.
pub const DEFAULT_SPEED_MPH: f64 = 45.0;

/// Great-circle distance in miles.
pub fn haversine_miles(from: Coordinate, to: Coordinate) -> f64 {
    let lat1_rad = from.lat.to_radians();
    let lat2_rad = to.lat.to_radians();
    let delta_lat = (to.lat - from.lat).to_radians();
    let delta_lng = (to.lng - from.lng).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2) + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_MILES * c
}

/// Haversine-based distance matrix provider.
#[derive(Debug, Clone)]
pub struct HaversineMatrix {
    pub detour_factor: f64,
    /// Assumed average driving speed in mph.
    pub speed_mph: f64,
}

impl Default for HaversineMatrix {
    fn default() -> Self {
        Self {
            detour_factor: DEFAULT_DETOUR_FACTOR,
            speed_mph: DEFAULT_SPEED_MPH,
        }
    }
}

impl HaversineMatrix {
    pub fn new(detour_factor: f64, speed_mph: f64) -> Self {
        Self { detour_factor, speed_mph }
    }

    /// Estimated road miles between two points.
    pub fn road_miles(&self, from: Coordinate, to: Coordinate) -> f64 {
        haversine_miles(from, to) * self.detour_factor
    }

    /// Travel minutes for a road distance, never below one minute for a
    /// non-zero distance.
    pub fn miles_to_minutes(&self, miles: f64) -> u32 {
        if miles <= 0.0 {
            return 0;
        }
        ((miles / self.speed_mph) * 60.0).round().max(1.0) as u32
    }

    /// Fills every off-diagonal cell whose distance or duration is still zero.
    /// A known distance is kept and only its duration derived from it.
    /// Returns the number of cells touched.
    pub fn fill_missing(&self, matrix: &mut DistanceMatrix, locations: &[Coordinate]) -> usize {
        matrix
            .miles
            .par_iter_mut()
            .zip(matrix.minutes.par_iter_mut())
            .enumerate()
            .map(|(i, (miles_row, minutes_row))| {
                let mut filled = 0;
                for j in 0..locations.len() {
                    if i == j || (miles_row[j] > 0.0 && minutes_row[j] > 0) {
                        continue;
                    }
                    if miles_row[j] <= 0.0 {
                        miles_row[j] = self.road_miles(locations[i], locations[j]);
                    }
                    if minutes_row[j] == 0 {
                        minutes_row[j] = self.miles_to_minutes(miles_row[j]);
                    }
                    filled += 1;
                }
                filled
            })
            .sum()
    }
}

impl DistanceMatrixProvider for HaversineMatrix {
    fn matrix_for(&self, locations: &[Coordinate]) -> Result<DistanceMatrix> {
        let mut matrix = DistanceMatrix::zeroed(locations.len());
        self.fill_missing(&mut matrix, locations);
        Ok(matrix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_same_point() {
        let point = Coordinate::new(36.1, -115.1);
        assert!(haversine_miles(point, point) < 0.001, "Same point should have ~0 distance");
    }

    #[test]
    fn test_haversine_known_distance() {
        // Las Vegas to Los Angeles is ~230 miles straight line
        let dist = haversine_miles(Coordinate::new(36.17, -115.14), Coordinate::new(34.05, -118.24));
        assert!(dist > 215.0 && dist < 250.0, "LV to LA should be ~230 miles, got {}", dist);
    }

    #[test]
    fn test_matrix_diagonal_is_zero() {
        let provider = HaversineMatrix::default();
        let locations = vec![
            Coordinate::new(36.1, -115.1),
            Coordinate::new(36.2, -115.2),
            Coordinate::new(36.3, -115.3),
        ];
        let matrix = provider.matrix_for(&locations).unwrap();

        for i in 0..locations.len() {
            assert_eq!(matrix.miles(i, i), 0.0, "Diagonal should be zero");
            assert_eq!(matrix.minutes(i, i), 0, "Diagonal should be zero");
        }
    }

    #[test]
    fn test_matrix_symmetric_and_detoured() {
        let provider = HaversineMatrix::default();
        let a = Coordinate::new(36.1, -115.1);
        let b = Coordinate::new(36.2, -115.2);
        let matrix = provider.matrix_for(&[a, b]).unwrap();

        assert_eq!(matrix.miles(0, 1), matrix.miles(1, 0));
        assert_eq!(matrix.minutes(0, 1), matrix.minutes(1, 0));
        assert!((matrix.miles(0, 1) / haversine_miles(a, b) - DEFAULT_DETOUR_FACTOR).abs() < 1e-9);
    }

    #[test]
    fn test_reasonable_travel_time() {
        let provider = HaversineMatrix::new(1.3, 45.0);
        // 45 miles at 45 mph = 60 minutes
        assert_eq!(provider.miles_to_minutes(45.0), 60);
        // Very short hops still cost a minute
        assert_eq!(provider.miles_to_minutes(0.05), 1);
        assert_eq!(provider.miles_to_minutes(0.0), 0);
    }

    #[test]
    fn test_fill_missing_keeps_exact_cells() {
        let provider = HaversineMatrix::default();
        let locations = vec![Coordinate::new(36.1, -115.1), Coordinate::new(36.2, -115.2)];
        let mut matrix = DistanceMatrix::zeroed(2);
        matrix.miles[0][1] = 12.5;
        matrix.minutes[0][1] = 17;

        let filled = provider.fill_missing(&mut matrix, &locations);

        assert_eq!(filled, 1);
        assert_eq!(matrix.miles(0, 1), 12.5);
        assert_eq!(matrix.minutes(0, 1), 17);
        assert!(matrix.miles(1, 0) > 0.0);
    }

    #[test]
    fn test_fill_missing_keeps_exact_short_legs() {
        let provider = HaversineMatrix::default();
        let locations = vec![Coordinate::new(36.1, -115.1), Coordinate::new(36.2, -115.2)];
        let mut matrix = DistanceMatrix::zeroed(2);
        // A routed hop short enough that its minutes round to zero.
        matrix.miles[0][1] = 0.2;
        matrix.miles[1][0] = 0.2;

        let filled = provider.fill_missing(&mut matrix, &locations);

        assert_eq!(filled, 2);
        assert_eq!(matrix.miles(0, 1), 0.2);
        assert_eq!(matrix.miles(1, 0), 0.2);
        assert_eq!(matrix.minutes(0, 1), 1);
        assert_eq!(matrix.minutes(1, 0), 1);
    }
}
