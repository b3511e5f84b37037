//! KNN and distance-band weights over feature centroids
//!
//! Both methods measure centroid-to-centroid Euclidean distance. Point
//! features are their own centroid; polygon features are reduced to their
//! centroid for the distance computation only; the geometries in the source
//! collection are untouched.

use geo::Centroid;
use terrastat_core::{Error, FeatureCollection, Result};

use super::kdtree::KdTree;
use super::WeightsGraph;

/// K-nearest-neighbor weights.
///
/// Every feature gets exactly `k` neighbors with weight 1.0, distance ties
/// broken by collection order. Requires at least `k + 1` features. The
/// resulting graph is generally asymmetric (nearest-neighbor relations do
/// not commute) and is left that way.
pub fn knn_weights(collection: &FeatureCollection, k: usize) -> Result<WeightsGraph> {
    if k == 0 {
        return Err(Error::InvalidParameter {
            name: "k",
            value: k.to_string(),
            reason: "must be at least 1".to_string(),
        });
    }

    let sites = centroid_sites(collection)?;
    let n = sites.len();
    if n < k + 1 {
        return Err(Error::InvalidParameter {
            name: "k",
            value: k.to_string(),
            reason: format!("needs at least {} features, got {n}", k + 1),
        });
    }

    let neighbors = (0..n)
        .map(|i| {
            let (xi, yi) = sites[i];
            let mut dists: Vec<(f64, usize)> = (0..n)
                .filter(|&j| j != i)
                .map(|j| {
                    let (xj, yj) = sites[j];
                    let (dx, dy) = (xi - xj, yi - yj);
                    (dx * dx + dy * dy, j)
                })
                .collect();
            // Ties resolve to the earlier feature.
            dists.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
            dists.truncate(k);
            dists.into_iter().map(|(_, j)| (j, 1.0)).collect()
        })
        .collect();

    Ok(WeightsGraph::from_neighbors(neighbors))
}

/// Distance-band weights: features within `threshold` (inclusive) of each
/// other are neighbors with weight 1.0.
///
/// Features beyond the threshold of everything become isolates; they stay in
/// the graph with an empty neighbor list.
pub fn distance_band_weights(
    collection: &FeatureCollection,
    threshold: f64,
) -> Result<WeightsGraph> {
    if !threshold.is_finite() || threshold <= 0.0 {
        return Err(Error::InvalidParameter {
            name: "threshold",
            value: threshold.to_string(),
            reason: "must be a positive finite distance".to_string(),
        });
    }

    let sites = centroid_sites(collection)?;
    let tree = KdTree::build(&sites);

    let neighbors = sites
        .iter()
        .enumerate()
        .map(|(i, &(x, y))| {
            tree.within_radius(x, y, threshold)
                .into_iter()
                .filter(|&j| j != i)
                .map(|j| (j, 1.0))
                .collect()
        })
        .collect();

    Ok(WeightsGraph::from_neighbors(neighbors))
}

/// Centroid coordinates for every feature, in collection order.
fn centroid_sites(collection: &FeatureCollection) -> Result<Vec<(f64, f64)>> {
    // Also enforces a consistent, supported geometry class.
    collection.geometry_kind()?;

    collection
        .iter()
        .enumerate()
        .map(|(i, feature)| {
            let geom = feature
                .geometry
                .as_ref()
                .ok_or(Error::MissingGeometry(i))?;
            let centroid = geom.centroid().ok_or_else(|| {
                Error::DegenerateInput(format!("feature {i} has an empty geometry"))
            })?;
            Ok((centroid.x(), centroid.y()))
        })
        .collect()
}
