//! Geographic clustering of stops into candidate days.
//!
//! Plain k-means over (lat, lng). Not geodesically exact, but the error is
//! negligible at the scale of one inspector's territory.

use serde::Serialize;

use crate::haversine::haversine_miles;
use crate::model::{Coordinate, StopArena};

/// A stop as seen by the clusterer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClusterPoint {
    pub index: usize,
    pub location: Coordinate,
    pub visit_minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cluster {
    pub centroid: Coordinate,
    pub members: Vec<ClusterPoint>,
}

impl Cluster {
    pub fn from_members(members: Vec<ClusterPoint>) -> Self {
        let centroid = mean_location(&members);
        Self { centroid, members }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn indices(&self) -> Vec<usize> {
        self.members.iter().map(|point| point.index).collect()
    }

    pub fn visit_minutes(&self) -> u32 {
        self.members.iter().map(|point| point.visit_minutes).sum()
    }

    pub fn recompute_centroid(&mut self) {
        if !self.members.is_empty() {
            self.centroid = mean_location(&self.members);
        }
    }

    /// Mean great-circle miles between distinct members; `None` below two
    /// members.
    pub fn average_pairwise_miles(&self) -> Option<f64> {
        let n = self.members.len();
        if n < 2 {
            return None;
        }
        let mut total = 0.0;
        for (i, a) in self.members.iter().enumerate() {
            for b in &self.members[i + 1..] {
                total += haversine_miles(a.location, b.location);
            }
        }
        Some(total / (n * (n - 1) / 2) as f64)
    }

    /// Mean miles from members to the centroid.
    pub fn spread_miles(&self) -> f64 {
        if self.members.is_empty() {
            return 0.0;
        }
        let total: f64 = self
            .members
            .iter()
            .map(|point| haversine_miles(point.location, self.centroid))
            .sum();
        total / self.members.len() as f64
    }
}

/// Clustering points for the given stops; unknown indices are skipped.
pub fn points_for(stops: &StopArena, indices: &[usize]) -> Vec<ClusterPoint> {
    indices
        .iter()
        .filter_map(|&index| stops.get(index))
        .map(|stop| ClusterPoint {
            index: stop.index,
            location: stop.location,
            visit_minutes: stop.visit_minutes,
        })
        .collect()
}

/// Clusters needed to keep `stop_count` stops at `capacity` per cluster.
pub fn target_cluster_count(stop_count: usize, capacity: usize) -> usize {
    if stop_count == 0 {
        return 0;
    }
    stop_count.div_ceil(capacity.max(1))
}

/// Inflates `k` by tightness: `max(k, floor(k * (0.5 + tightness)))`.
pub fn tightened_count(k: usize, tightness: f64) -> usize {
    let inflated = (k as f64 * (0.5 + tightness.clamp(0.0, 1.0))).floor() as usize;
    k.max(inflated)
}

/// Partitions `points` into at most `tightened_count(k, tightness)` clusters.
/// Empty clusters are dropped.
pub fn cluster(points: &[ClusterPoint], k: usize, max_iterations: usize, tightness: f64) -> Vec<Cluster> {
    if points.is_empty() || k == 0 {
        return Vec::new();
    }
    let k = tightened_count(k, tightness).min(points.len());
    if k == 1 {
        return vec![Cluster::from_members(points.to_vec())];
    }

    let mut centers = seed_centers(points, k);
    let mut assignments = vec![usize::MAX; points.len()];

    for _ in 0..max_iterations.max(1) {
        let mut changed = false;
        for (i, point) in points.iter().enumerate() {
            let nearest = nearest_center(point.location, &centers);
            if assignments[i] != nearest {
                assignments[i] = nearest;
                changed = true;
            }
        }

        if !changed {
            break;
        }

        let mut sums = vec![(0.0, 0.0); k];
        let mut counts = vec![0usize; k];
        for (point, &cluster) in points.iter().zip(&assignments) {
            sums[cluster].0 += point.location.lat;
            sums[cluster].1 += point.location.lng;
            counts[cluster] += 1;
        }
        for j in 0..k {
            if counts[j] > 0 {
                centers[j] = Coordinate::new(sums[j].0 / counts[j] as f64, sums[j].1 / counts[j] as f64);
            }
        }
    }

    let mut groups: Vec<Vec<ClusterPoint>> = vec![Vec::new(); k];
    for (point, &cluster) in points.iter().zip(&assignments) {
        groups[cluster].push(*point);
    }
    groups
        .into_iter()
        .filter(|members| !members.is_empty())
        .map(Cluster::from_members)
        .collect()
}

/// Farthest-point seeding from the first point; deterministic.
fn seed_centers(points: &[ClusterPoint], k: usize) -> Vec<Coordinate> {
    let mut centers = Vec::with_capacity(k);
    centers.push(points[0].location);

    while centers.len() < k {
        let mut best_idx = 0;
        let mut best_dist = -1.0;
        for (i, point) in points.iter().enumerate() {
            let min_dist = centers
                .iter()
                .map(|center| squared_degrees(point.location, *center))
                .fold(f64::INFINITY, f64::min);
            if min_dist > best_dist {
                best_dist = min_dist;
                best_idx = i;
            }
        }
        centers.push(points[best_idx].location);
    }

    centers
}

fn nearest_center(location: Coordinate, centers: &[Coordinate]) -> usize {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (j, center) in centers.iter().enumerate() {
        let dist = squared_degrees(location, *center);
        if dist < best_dist {
            best_dist = dist;
            best = j;
        }
    }
    best
}

fn squared_degrees(a: Coordinate, b: Coordinate) -> f64 {
    (a.lat - b.lat).powi(2) + (a.lng - b.lng).powi(2)
}

fn mean_location(points: &[ClusterPoint]) -> Coordinate {
    if points.is_empty() {
        return Coordinate::new(0.0, 0.0);
    }
    let n = points.len() as f64;
    let (lat, lng) = points
        .iter()
        .fold((0.0, 0.0), |(lat, lng), point| (lat + point.location.lat, lng + point.location.lng));
    Coordinate::new(lat / n, lng / n)
}
