//! Polyline representation for route geometries.
//!
//! Geometries arrive from the routing service in the encoded polyline format
//! and are kept as decoded (lat, lng) points; re-encoding for the map layer
//! happens outside the planner.

use serde::{Deserialize, Serialize};

use crate::error::FetchError;

/// Coordinate precision of OSRM `geometries=polyline`.
pub const OSRM_PRECISION: u32 = 5;

/// A polyline representing a route geometry as decoded coordinates.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Polyline {
    points: Vec<(f64, f64)>,
}

impl Polyline {
    /// Each point is a (latitude, longitude) tuple.
    pub fn new(points: Vec<(f64, f64)>) -> Self {
        Self { points }
    }

    /// Decodes an encoded polyline string at the given decimal precision.
    pub fn decode(encoded: &str, precision: u32) -> Result<Self, FetchError> {
        let factor = 10_f64.powi(precision as i32);
        let bytes = encoded.as_bytes();
        let mut cursor = 0;
        let mut lat = 0i64;
        let mut lng = 0i64;
        let mut points = Vec::new();

        while cursor < bytes.len() {
            lat += next_delta(bytes, &mut cursor)?;
            lng += next_delta(bytes, &mut cursor)?;
            points.push((lat as f64 / factor, lng as f64 / factor));
        }

        Ok(Self { points })
    }

    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Appends another leg, skipping its first point when it repeats our last.
    pub fn extend(&mut self, other: Polyline) {
        let skip = match (self.points.last(), other.points.first()) {
            (Some(last), Some(first)) if last == first => 1,
            _ => 0,
        };
        self.points.extend(other.points.into_iter().skip(skip));
    }

    pub fn into_points(self) -> Vec<(f64, f64)> {
        self.points
    }
}

/// Reads one zig-zag encoded varint.
fn next_delta(bytes: &[u8], cursor: &mut usize) -> Result<i64, FetchError> {
    let mut shift = 0;
    let mut result = 0i64;
    loop {
        let Some(&byte) = bytes.get(*cursor) else {
            return Err(FetchError::Decode("truncated polyline".to_string()));
        };
        *cursor += 1;
        let chunk = byte as i64 - 63;
        if !(0..64).contains(&chunk) || shift > 60 {
            return Err(FetchError::Decode("invalid polyline character".to_string()));
        }
        result |= (chunk & 0x1f) << shift;
        shift += 5;
        if chunk < 0x20 {
            break;
        }
    }
    Ok(if result & 1 != 0 { !(result >> 1) } else { result >> 1 })
}
