//! Spatial weights graphs
//!
//! Neighbor relations over a feature collection, built with one of four
//! strategies:
//!
//! - **Queen contiguity**: polygons sharing at least one boundary vertex
//! - **Rook contiguity**: polygons sharing at least one boundary edge
//! - **KNN**: the k nearest features by centroid distance
//! - **Distance band**: features within a fixed centroid distance
//!
//! A [`WeightsGraph`] is index-aligned with its source collection: entry `i`
//! lists the neighbors of feature `i` as `(neighbor index, weight)` pairs,
//! sorted by neighbor index. There are no self-loops. Contiguity graphs are
//! symmetric with binary weights; KNN graphs may be asymmetric. Isolated
//! features keep an empty neighbor list rather than being dropped, and the
//! autocorrelation statistics flag them instead of failing.

mod contiguity;
mod distance;
pub mod kdtree;

pub use contiguity::{queen_weights, rook_weights};
pub use distance::{distance_band_weights, knn_weights};

use std::collections::HashMap;

use terrastat_core::{FeatureCollection, Result};

/// Neighbor construction strategy
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WeightsMethod {
    /// Polygons sharing at least one boundary vertex are neighbors
    Queen,
    /// Polygons sharing at least one boundary edge are neighbors
    Rook,
    /// The k nearest features by centroid distance are neighbors
    Knn { k: usize },
    /// Features within `threshold` centroid distance are neighbors
    DistanceBand { threshold: f64 },
}

/// Build a spatial weights graph for a feature collection.
///
/// Contiguity methods require a polygon collection; KNN and distance band
/// accept points or polygons (polygons are reduced to their centroids for
/// the distance computation, the geometries themselves are untouched).
pub fn build_weights(
    collection: &FeatureCollection,
    method: WeightsMethod,
) -> Result<WeightsGraph> {
    match method {
        WeightsMethod::Queen => queen_weights(collection),
        WeightsMethod::Rook => rook_weights(collection),
        WeightsMethod::Knn { k } => knn_weights(collection, k),
        WeightsMethod::DistanceBand { threshold } => distance_band_weights(collection, threshold),
    }
}

/// Spatial weights graph, index-aligned with its source collection.
#[derive(Debug, Clone)]
pub struct WeightsGraph {
    /// `neighbors[i]` holds `(neighbor index, weight)` pairs, sorted by index.
    neighbors: Vec<Vec<(usize, f64)>>,
}

impl WeightsGraph {
    /// Build from raw adjacency lists. Lists are sorted by neighbor index;
    /// self-loops are discarded.
    pub(crate) fn from_neighbors(mut neighbors: Vec<Vec<(usize, f64)>>) -> Self {
        for (i, row) in neighbors.iter_mut().enumerate() {
            row.retain(|&(j, _)| j != i);
            row.sort_by_key(|&(j, _)| j);
        }
        Self { neighbors }
    }

    /// Number of features in the graph.
    pub fn n(&self) -> usize {
        self.neighbors.len()
    }

    /// Neighbors of feature `i` as `(neighbor index, weight)` pairs.
    pub fn neighbors(&self, i: usize) -> &[(usize, f64)] {
        &self.neighbors[i]
    }

    /// Number of neighbors of feature `i`.
    pub fn cardinality(&self, i: usize) -> usize {
        self.neighbors[i].len()
    }

    /// Total number of directed links.
    pub fn link_count(&self) -> usize {
        self.neighbors.iter().map(Vec::len).sum()
    }

    /// Whether any feature has no neighbors.
    pub fn has_isolates(&self) -> bool {
        self.neighbors.iter().any(Vec::is_empty)
    }

    /// Indices of features with no neighbors.
    pub fn isolates(&self) -> Vec<usize> {
        self.neighbors
            .iter()
            .enumerate()
            .filter(|(_, row)| row.is_empty())
            .map(|(i, _)| i)
            .collect()
    }

    /// Whether `w_ij` equals `w_ji` for every pair.
    pub fn is_symmetric(&self) -> bool {
        let edges = self.edge_map();
        edges
            .iter()
            .all(|(&(i, j), &w)| edges.get(&(j, i)).is_some_and(|&v| v == w))
    }

    /// S0 = sum of all weights.
    pub fn s0(&self) -> f64 {
        self.neighbors
            .iter()
            .flat_map(|row| row.iter().map(|&(_, w)| w))
            .sum()
    }

    /// S1 = ½ Σij (w_ij + w_ji)², the first Cliff–Ord sum.
    pub fn s1(&self) -> f64 {
        let edges = self.edge_map();
        let mut s = 0.0;
        for (&(i, j), &w_ij) in &edges {
            let w_ji = edges.get(&(j, i)).copied().unwrap_or(0.0);
            s += (w_ij + w_ji) * (w_ij + w_ji);
        }
        0.5 * s
    }

    /// S2 = Σi (row_sum_i + col_sum_i)², the second Cliff–Ord sum.
    pub fn s2(&self) -> f64 {
        let n = self.n();
        let mut row_sums = vec![0.0; n];
        let mut col_sums = vec![0.0; n];
        for (i, row) in self.neighbors.iter().enumerate() {
            for &(j, w) in row {
                row_sums[i] += w;
                col_sums[j] += w;
            }
        }
        row_sums
            .iter()
            .zip(&col_sums)
            .map(|(r, c)| (r + c) * (r + c))
            .sum()
    }

    /// Row-standardized copy: each feature's weights rescaled to sum to 1.
    /// Isolated features keep their empty list.
    pub fn row_standardized(&self) -> WeightsGraph {
        let neighbors = self
            .neighbors
            .iter()
            .map(|row| {
                let total: f64 = row.iter().map(|&(_, w)| w).sum();
                if total > 0.0 {
                    row.iter().map(|&(j, w)| (j, w / total)).collect()
                } else {
                    Vec::new()
                }
            })
            .collect();
        WeightsGraph { neighbors }
    }

    fn edge_map(&self) -> HashMap<(usize, usize), f64> {
        self.neighbors
            .iter()
            .enumerate()
            .flat_map(|(i, row)| row.iter().map(move |&(j, w)| ((i, j), w)))
            .collect()
    }
}
