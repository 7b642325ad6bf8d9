//! Connected-component clustering of locations under a haversine threshold.
//!
//! Two locations are linked when their great-circle distance is within the
//! threshold; a cluster is a connected component of that graph, so isolated
//! locations form singleton clusters. Neighbour search goes through an
//! R-tree over unit-sphere positions and every candidate pair is confirmed
//! with the haversine distance before it is merged.

use crate::error::GeoClusterError;
use crate::geo::{chord_length, haversine_radians, km_to_radians, unit_vector, DEFAULT_THRESHOLD_KM};
use crate::types::{LocId, LocationRecord};
use rstar::primitives::GeomWithData;
use rstar::RTree;
use std::collections::HashMap;
use tracing::debug;

type IndexedPoint = GeomWithData<[f64; 3], usize>;

/// How final cluster labels are numbered. Both orders give dense labels
/// starting at 0 and describe the same partition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LabelOrder {
    /// Label 0 goes to the cluster of the first input row, then in order of
    /// each cluster's first row.
    #[default]
    Discovery,
    /// Clusters sorted by the smallest `LocId` they contain, so labels do
    /// not depend on input row order.
    MinLocId,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterOptions {
    pub threshold_km: f64,
    pub label_order: LabelOrder,
}

impl Default for ClusterOptions {
    fn default() -> Self {
        Self {
            threshold_km: DEFAULT_THRESHOLD_KM,
            label_order: LabelOrder::Discovery,
        }
    }
}

impl ClusterOptions {
    pub fn new(threshold_km: f64, label_order: LabelOrder) -> Result<Self, GeoClusterError> {
        if !threshold_km.is_finite() || threshold_km <= 0.0 {
            return Err(GeoClusterError::InvalidOption(format!(
                "distance threshold must be a positive number of kilometres, got {}",
                threshold_km
            )));
        }
        Ok(Self {
            threshold_km,
            label_order,
        })
    }

    pub fn threshold_radians(&self) -> f64 {
        km_to_radians(self.threshold_km)
    }
}

/// Cluster label per input row, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Clustering {
    pub labels: Vec<usize>,
    pub cluster_count: usize,
}

impl Clustering {
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Row indices grouped by label; entry `k` holds the rows of cluster `k`.
    /// Labels at or above `cluster_count` are skipped.
    pub fn members(&self) -> Vec<Vec<usize>> {
        let mut groups = vec![Vec::new(); self.cluster_count];
        for (row, &label) in self.labels.iter().enumerate() {
            if let Some(group) = groups.get_mut(label) {
                group.push(row);
            }
        }
        groups
    }

    pub fn sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.cluster_count];
        for &label in &self.labels {
            if let Some(size) = sizes.get_mut(label) {
                *size += 1;
            }
        }
        sizes
    }
}

struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl UnionFind {
    fn new(size: usize) -> Self {
        Self {
            parent: (0..size).collect(),
            rank: vec![0; size],
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            // Path halving
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, x: usize, y: usize) -> bool {
        let (px, py) = (self.find(x), self.find(y));
        if px == py {
            return false;
        }
        match self.rank[px].cmp(&self.rank[py]) {
            std::cmp::Ordering::Less => self.parent[px] = py,
            std::cmp::Ordering::Greater => self.parent[py] = px,
            std::cmp::Ordering::Equal => {
                self.parent[py] = px;
                self.rank[px] += 1;
            }
        }
        true
    }
}

/// Partition `locations` into clusters of mutually reachable points.
///
/// Returns an empty `Clustering` for empty input.
pub fn assign_clusters(locations: &[LocationRecord], options: &ClusterOptions) -> Clustering {
    if locations.is_empty() {
        return Clustering::default();
    }

    let points: Vec<IndexedPoint> = locations
        .iter()
        .enumerate()
        .map(|(row, loc)| GeomWithData::new(unit_vector(loc.latitude, loc.longitude), row))
        .collect();
    let tree = RTree::bulk_load(points.clone());

    let eps = options.threshold_radians();
    // Widened slightly; the haversine check below is authoritative.
    let search_radius = chord_length(eps) * (1.0 + 1e-9) + 1e-12;
    let max_squared = search_radius * search_radius;

    let mut uf = UnionFind::new(locations.len());
    let mut links = 0usize;
    for point in &points {
        let a = &locations[point.data];
        for neighbour in tree.locate_within_distance(*point.geom(), max_squared) {
            if neighbour.data <= point.data {
                continue;
            }
            let b = &locations[neighbour.data];
            if haversine_radians(a.latitude, a.longitude, b.latitude, b.longitude) <= eps
                && uf.union(point.data, neighbour.data)
            {
                links += 1;
            }
        }
    }

    let roots: Vec<usize> = (0..locations.len()).map(|row| uf.find(row)).collect();
    let clustering = relabel(&roots, locations, options.label_order);
    debug!(
        points = locations.len(),
        merges = links,
        clusters = clustering.cluster_count,
        threshold_km = options.threshold_km,
        "assigned clusters"
    );
    clustering
}

fn relabel(roots: &[usize], locations: &[LocationRecord], order: LabelOrder) -> Clustering {
    // Roots in order of first appearance.
    let mut discovery: HashMap<usize, usize> = HashMap::new();
    let mut first_seen: Vec<usize> = Vec::new();
    for &root in roots {
        discovery.entry(root).or_insert_with(|| {
            first_seen.push(root);
            first_seen.len() - 1
        });
    }

    let label_of: HashMap<usize, usize> = match order {
        LabelOrder::Discovery => discovery,
        LabelOrder::MinLocId => {
            let mut min_id: HashMap<usize, LocId> = HashMap::new();
            for (row, &root) in roots.iter().enumerate() {
                let id = locations[row].loc_id;
                min_id
                    .entry(root)
                    .and_modify(|m| *m = (*m).min(id))
                    .or_insert(id);
            }
            let mut keyed: Vec<(LocId, usize, usize)> = first_seen
                .iter()
                .enumerate()
                .map(|(first, root)| (min_id[root], first, *root))
                .collect();
            keyed.sort();
            keyed
                .into_iter()
                .enumerate()
                .map(|(label, (_, _, root))| (root, label))
                .collect()
        }
    };

    Clustering {
        labels: roots.iter().map(|root| label_of[root]).collect(),
        cluster_count: first_seen.len(),
    }
}
