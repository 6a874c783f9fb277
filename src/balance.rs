//! Evening out cluster sizes and merging small neighbouring clusters.

use std::cmp::Ordering;

use tracing::debug;

use crate::cluster::Cluster;
use crate::haversine::haversine_miles;
use crate::model::Coordinate;
use crate::settings::Constraints;
use crate::solver::SolveOptions;

/// Moves members out of clusters larger than `capacity` into nearby clusters
/// with room. `weight` (0..=1) scales both how much of the excess is moved
/// and how far a member may travel to its new centroid.
pub fn balance(mut clusters: Vec<Cluster>, capacity: usize, home: Coordinate, weight: f64) -> Vec<Cluster> {
    let weight = weight.clamp(0.0, 1.0);
    if weight == 0.0 || clusters.len() < 2 || capacity == 0 {
        return clusters;
    }

    let mut order: Vec<usize> = (0..clusters.len()).collect();
    order.sort_by(|&a, &b| clusters[b].len().cmp(&clusters[a].len()));

    for source in order {
        let excess = clusters[source].len().saturating_sub(capacity);
        let mut budget = (excess as f64 * weight).round() as usize;
        if budget == 0 {
            continue;
        }
        let spread = clusters[source].spread_miles();
        let reach = spread * weight;

        while budget > 0 {
            let Some((member, target)) = cheapest_relocation(&clusters, source, capacity, reach) else {
                break;
            };
            let point = clusters[source].members.remove(member);
            clusters[target].members.push(point);
            clusters[source].recompute_centroid();
            clusters[target].recompute_centroid();
            budget -= 1;
        }
    }

    clusters.retain(|cluster| !cluster.is_empty());
    debug!(clusters = clusters.len(), "balanced clusters");
    sort_by_home_distance(clusters, home)
}

/// Finds the member of `source` whose move to another non-full cluster adds
/// the least distance, within `reach` miles of extra travel.
fn cheapest_relocation(clusters: &[Cluster], source: usize, capacity: usize, reach: f64) -> Option<(usize, usize)> {
    let own_centroid = clusters[source].centroid;
    let mut best: Option<(usize, usize, f64)> = None;

    for (member_idx, point) in clusters[source].members.iter().enumerate() {
        let own = haversine_miles(point.location, own_centroid);
        for (target, cluster) in clusters.iter().enumerate() {
            if target == source || cluster.len() >= capacity {
                continue;
            }
            let cost = haversine_miles(point.location, cluster.centroid) - own;
            if cost > reach {
                continue;
            }
            if best.is_none_or(|(_, _, best_cost)| cost < best_cost) {
                best = Some((member_idx, target, cost));
            }
        }
    }

    best.map(|(member, target, _)| (member, target))
}

/// Greedily merges the closest admissible pair of clusters until none is
/// left, then orders clusters nearest-home first.
pub fn merge(
    mut clusters: Vec<Cluster>,
    capacity: usize,
    constraints: &Constraints,
    home: Coordinate,
    options: &SolveOptions,
) -> Vec<Cluster> {
    loop {
        let mut best: Option<(usize, usize, f64)> = None;
        for a in 0..clusters.len() {
            for b in a + 1..clusters.len() {
                let Some(gap) = mergeable(&clusters[a], &clusters[b], capacity, constraints, options) else {
                    continue;
                };
                if best.is_none_or(|(_, _, best_gap)| gap < best_gap) {
                    best = Some((a, b, gap));
                }
            }
        }

        let Some((a, b, gap)) = best else {
            break;
        };
        let absorbed = clusters.remove(b);
        debug!(sizes = ?(clusters[a].len(), absorbed.len()), gap_miles = gap, "merging adjacent clusters");
        clusters[a] = merged(&clusters[a], absorbed);
    }

    sort_by_home_distance(clusters, home)
}

/// Centroid gap in miles when `a` and `b` may be merged.
fn mergeable(a: &Cluster, b: &Cluster, capacity: usize, constraints: &Constraints, options: &SolveOptions) -> Option<f64> {
    let combined = a.len() + b.len();
    if combined > capacity {
        return None;
    }

    // A singleton has no pairwise distance, so there is no adjacency evidence.
    let spread = (a.average_pairwise_miles()? + b.average_pairwise_miles()?) / 2.0;
    let gap = haversine_miles(a.centroid, b.centroid);
    if gap > options.adjacency_factor * spread {
        return None;
    }

    if let Some(limit) = constraints.minute_limit() {
        let estimate = (a.visit_minutes() + b.visit_minutes()) as f64 + options.travel_minutes_per_stop * combined as f64;
        if estimate > limit {
            return None;
        }
    }

    Some(gap)
}

fn merged(a: &Cluster, b: Cluster) -> Cluster {
    let (wa, wb) = (a.len() as f64, b.len() as f64);
    let total = wa + wb;
    let centroid = Coordinate::new(
        (a.centroid.lat * wa + b.centroid.lat * wb) / total,
        (a.centroid.lng * wa + b.centroid.lng * wb) / total,
    );
    let mut members = a.members.clone();
    members.extend(b.members);
    Cluster { centroid, members }
}

fn sort_by_home_distance(mut clusters: Vec<Cluster>, home: Coordinate) -> Vec<Cluster> {
    clusters.sort_by(|a, b| {
        haversine_miles(home, a.centroid)
            .partial_cmp(&haversine_miles(home, b.centroid))
            .unwrap_or(Ordering::Equal)
    });
    clusters
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::ClusterPoint;

    const HOME: Coordinate = Coordinate::new(36.0, -115.0);

    fn cluster_at(first_index: usize, lat: f64, lng: f64, size: usize, step: f64) -> Cluster {
        Cluster::from_members(
            (0..size)
                .map(|i| ClusterPoint {
                    index: first_index + i,
                    location: Coordinate::new(lat + i as f64 * step, lng),
                    visit_minutes: 30,
                })
                .collect(),
        )
    }

    fn open_constraints() -> Constraints {
        Constraints {
            use_hours_constraint: false,
            ..Constraints::default()
        }
    }

    #[test]
    fn zero_weight_leaves_clusters_alone() {
        let clusters = vec![cluster_at(1, 36.1, -115.1, 6, 0.01), cluster_at(7, 36.2, -115.1, 1, 0.01)];
        let balanced = balance(clusters.clone(), 4, HOME, 0.0);
        assert_eq!(balanced, clusters);
    }

    #[test]
    fn full_weight_moves_excess_to_neighbour() {
        // Members march north toward the small cluster, so the far end moves.
        let clusters = vec![cluster_at(1, 36.10, -115.1, 6, 0.01), cluster_at(7, 36.17, -115.1, 2, 0.01)];
        let balanced = balance(clusters, 4, HOME, 1.0);

        let mut sizes: Vec<usize> = balanced.iter().map(Cluster::len).collect();
        sizes.sort();
        assert_eq!(sizes, vec![4, 4]);
        let total: usize = balanced.iter().map(Cluster::len).sum();
        assert_eq!(total, 8);
    }

    #[test]
    fn distant_clusters_are_not_raided() {
        let clusters = vec![cluster_at(1, 36.10, -115.1, 6, 0.01), cluster_at(7, 38.0, -117.0, 1, 0.01)];
        let balanced = balance(clusters, 4, HOME, 1.0);
        let sizes: Vec<usize> = balanced.iter().map(Cluster::len).collect();
        assert_eq!(sizes, vec![6, 1]);
    }

    #[test]
    fn merges_adjacent_small_clusters() {
        let clusters = vec![cluster_at(1, 36.100, -115.1, 2, 0.02), cluster_at(3, 36.130, -115.1, 2, 0.02)];
        let merged = merge(clusters, 6, &open_constraints(), HOME, &SolveOptions::default());
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].len(), 4);
        assert!((merged[0].centroid.lat - 36.125).abs() < 1e-9);
    }

    #[test]
    fn does_not_merge_past_capacity() {
        let clusters = vec![cluster_at(1, 36.100, -115.1, 4, 0.02), cluster_at(5, 36.130, -115.1, 4, 0.02)];
        let merged = merge(clusters, 6, &open_constraints(), HOME, &SolveOptions::default());
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn singletons_are_never_merged() {
        let clusters = vec![cluster_at(1, 36.100, -115.1, 1, 0.0), cluster_at(2, 36.101, -115.1, 1, 0.0)];
        let merged = merge(clusters, 6, &open_constraints(), HOME, &SolveOptions::default());
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn hours_estimate_blocks_merge() {
        let constraints = Constraints {
            use_hours_constraint: true,
            max_hours_per_day: 2.0,
            ..Constraints::default()
        };
        // 4 stops * (30 visit + 15 travel) = 180 minutes > 120.
        let clusters = vec![cluster_at(1, 36.100, -115.1, 2, 0.02), cluster_at(3, 36.130, -115.1, 2, 0.02)];
        let merged = merge(clusters, 6, &constraints, HOME, &SolveOptions::default());
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn output_is_sorted_by_distance_from_home() {
        let clusters = vec![cluster_at(1, 37.0, -115.0, 3, 0.01), cluster_at(4, 36.1, -115.0, 3, 0.01)];
        let sorted = merge(clusters, 3, &open_constraints(), HOME, &SolveOptions::default());
        assert_eq!(sorted[0].members[0].index, 4);
    }
}
