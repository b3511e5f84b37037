//! Queen and rook contiguity over polygon boundaries
//!
//! Adjacency is detected by exact coordinate identity: polygons are neighbors
//! when their rings share a vertex (queen) or a full edge (rook). Coordinates
//! that differ by any amount, however small, do not match; snapping noisy
//! boundaries is a data-preparation step, not a weights-builder concern. This
//! keeps the relation exactly symmetric.

use std::collections::{HashMap, HashSet};

use geo_types::{Geometry, LineString};
use terrastat_core::vector::geometry_type_name;
use terrastat_core::{Error, Feature, FeatureCollection, GeometryKind, Result};

use super::WeightsGraph;

/// Coordinate identity key. Signed zeros are collapsed so (0.0, -0.0)
/// matches (0.0, 0.0).
type VertexKey = (u64, u64);

/// Undirected edge between two vertices, stored with ordered endpoints.
type EdgeKey = (VertexKey, VertexKey);

#[derive(Clone, Copy)]
enum ContiguityMode {
    Queen,
    Rook,
}

impl ContiguityMode {
    fn label(&self) -> &'static str {
        match self {
            ContiguityMode::Queen => "queen contiguity",
            ContiguityMode::Rook => "rook contiguity",
        }
    }
}

/// Queen contiguity: polygons sharing at least one boundary vertex.
///
/// Fails with [`Error::UnsupportedGeometry`] on point collections.
pub fn queen_weights(collection: &FeatureCollection) -> Result<WeightsGraph> {
    contiguity_weights(collection, ContiguityMode::Queen)
}

/// Rook contiguity: polygons sharing at least one boundary edge.
///
/// Fails with [`Error::UnsupportedGeometry`] on point collections.
pub fn rook_weights(collection: &FeatureCollection) -> Result<WeightsGraph> {
    contiguity_weights(collection, ContiguityMode::Rook)
}

fn contiguity_weights(
    collection: &FeatureCollection,
    mode: ContiguityMode,
) -> Result<WeightsGraph> {
    let kind = collection.geometry_kind()?;
    if kind != GeometryKind::Polygon {
        return Err(Error::UnsupportedGeometry {
            method: mode.label(),
            geometry: kind.name(),
        });
    }

    let n = collection.len();
    let mut adjacency: Vec<HashSet<usize>> = vec![HashSet::new(); n];

    match mode {
        ContiguityMode::Queen => {
            let mut buckets: HashMap<VertexKey, Vec<usize>> = HashMap::new();
            for (i, feature) in collection.iter().enumerate() {
                let mut seen: HashSet<VertexKey> = HashSet::new();
                for ring in rings(feature, i, mode)? {
                    for coord in ring.coords() {
                        let key = vertex_key(coord.x, coord.y);
                        if seen.insert(key) {
                            buckets.entry(key).or_default().push(i);
                        }
                    }
                }
            }
            mark_shared(buckets.values(), &mut adjacency);
        }
        ContiguityMode::Rook => {
            let mut buckets: HashMap<EdgeKey, Vec<usize>> = HashMap::new();
            for (i, feature) in collection.iter().enumerate() {
                let mut seen: HashSet<EdgeKey> = HashSet::new();
                for ring in rings(feature, i, mode)? {
                    let coords: Vec<VertexKey> =
                        ring.coords().map(|c| vertex_key(c.x, c.y)).collect();
                    for pair in coords.windows(2) {
                        if pair[0] == pair[1] {
                            continue; // zero-length segment
                        }
                        let key = if pair[0] < pair[1] {
                            (pair[0], pair[1])
                        } else {
                            (pair[1], pair[0])
                        };
                        if seen.insert(key) {
                            buckets.entry(key).or_default().push(i);
                        }
                    }
                }
            }
            mark_shared(buckets.values(), &mut adjacency);
        }
    }

    let neighbors = adjacency
        .into_iter()
        .map(|set| set.into_iter().map(|j| (j, 1.0)).collect())
        .collect();
    Ok(WeightsGraph::from_neighbors(neighbors))
}

/// Mark every pair of features appearing in the same bucket as neighbors.
fn mark_shared<'a>(
    buckets: impl Iterator<Item = &'a Vec<usize>>,
    adjacency: &mut [HashSet<usize>],
) {
    for members in buckets {
        for (pos, &a) in members.iter().enumerate() {
            for &b in &members[pos + 1..] {
                adjacency[a].insert(b);
                adjacency[b].insert(a);
            }
        }
    }
}

fn vertex_key(x: f64, y: f64) -> VertexKey {
    let x = if x == 0.0 { 0.0 } else { x };
    let y = if y == 0.0 { 0.0 } else { y };
    (x.to_bits(), y.to_bits())
}

/// All boundary rings of a polygonal feature (exterior and holes).
fn rings(feature: &Feature, index: usize, mode: ContiguityMode) -> Result<Vec<&LineString<f64>>> {
    let geom = feature
        .geometry
        .as_ref()
        .ok_or(Error::MissingGeometry(index))?;
    match geom {
        Geometry::Polygon(p) => Ok(std::iter::once(p.exterior())
            .chain(p.interiors().iter())
            .collect()),
        Geometry::MultiPolygon(mp) => Ok(mp
            .0
            .iter()
            .flat_map(|p| std::iter::once(p.exterior()).chain(p.interiors().iter()))
            .collect()),
        other => Err(Error::UnsupportedGeometry {
            method: mode.label(),
            geometry: geometry_type_name(other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::{point, polygon};

    /// Unit square with lower-left corner at (x0, y0).
    fn square(x0: f64, y0: f64) -> Feature {
        Feature::new(Geometry::Polygon(polygon![
            (x: x0, y: y0),
            (x: x0 + 1.0, y: y0),
            (x: x0 + 1.0, y: y0 + 1.0),
            (x: x0, y: y0 + 1.0),
        ]))
    }

    /// 2x2 grid of unit squares: indices 0=(0,0) 1=(1,0) 2=(0,1) 3=(1,1).
    fn grid_2x2() -> FeatureCollection {
        let mut fc = FeatureCollection::new();
        fc.push(square(0.0, 0.0));
        fc.push(square(1.0, 0.0));
        fc.push(square(0.0, 1.0));
        fc.push(square(1.0, 1.0));
        fc
    }

    #[test]
    fn test_queen_2x2_three_neighbors_each() {
        let w = queen_weights(&grid_2x2()).unwrap();
        for i in 0..4 {
            assert_eq!(
                w.cardinality(i),
                3,
                "queen: cell {} should neighbor the other 3",
                i
            );
        }
    }

    #[test]
    fn test_rook_2x2_two_neighbors_each() {
        let w = rook_weights(&grid_2x2()).unwrap();
        for i in 0..4 {
            assert_eq!(
                w.cardinality(i),
                2,
                "rook: cell {} should neighbor only edge-sharers",
                i
            );
        }
        // Diagonal pairs share only the center vertex.
        assert!(!w.neighbors(0).iter().any(|&(j, _)| j == 3));
        assert!(!w.neighbors(1).iter().any(|&(j, _)| j == 2));
    }

    #[test]
    fn test_contiguity_symmetric() {
        for w in [
            queen_weights(&grid_2x2()).unwrap(),
            rook_weights(&grid_2x2()).unwrap(),
        ] {
            assert!(w.is_symmetric());
        }
    }

    #[test]
    fn test_corner_touch_queen_only() {
        // Two squares meeting at the single point (1, 1).
        let mut fc = FeatureCollection::new();
        fc.push(square(0.0, 0.0));
        fc.push(square(1.0, 1.0));

        let queen = queen_weights(&fc).unwrap();
        assert_eq!(queen.cardinality(0), 1);

        let rook = rook_weights(&fc).unwrap();
        assert_eq!(rook.cardinality(0), 0, "corner touch is not an edge");
        assert!(rook.has_isolates());
    }

    #[test]
    fn test_disjoint_polygons_isolated() {
        let mut fc = FeatureCollection::new();
        fc.push(square(0.0, 0.0));
        fc.push(square(5.0, 5.0));
        let w = queen_weights(&fc).unwrap();
        assert_eq!(w.n(), 2);
        assert_eq!(w.isolates(), vec![0, 1]);
    }

    #[test]
    fn test_points_rejected() {
        let mut fc = FeatureCollection::new();
        fc.push(Feature::new(Geometry::Point(point! { x: 0.0, y: 0.0 })));
        fc.push(Feature::new(Geometry::Point(point! { x: 1.0, y: 0.0 })));

        assert!(matches!(
            queen_weights(&fc),
            Err(Error::UnsupportedGeometry { .. })
        ));
        assert!(matches!(
            rook_weights(&fc),
            Err(Error::UnsupportedGeometry { .. })
        ));
    }

    #[test]
    fn test_shared_weights_are_binary() {
        let w = queen_weights(&grid_2x2()).unwrap();
        for i in 0..4 {
            for &(_, weight) in w.neighbors(i) {
                assert_eq!(weight, 1.0);
            }
        }
    }

    #[test]
    fn test_multipolygon_parts_contribute() {
        // Feature 0 is a multipolygon whose second part touches feature 1.
        let part_a = polygon![
            (x: 0.0, y: 0.0),
            (x: 1.0, y: 0.0),
            (x: 1.0, y: 1.0),
            (x: 0.0, y: 1.0),
        ];
        let part_b = polygon![
            (x: 10.0, y: 0.0),
            (x: 11.0, y: 0.0),
            (x: 11.0, y: 1.0),
            (x: 10.0, y: 1.0),
        ];
        let mut fc = FeatureCollection::new();
        fc.push(Feature::new(Geometry::MultiPolygon(
            vec![part_a, part_b].into(),
        )));
        fc.push(square(11.0, 0.0));

        let w = rook_weights(&fc).unwrap();
        assert_eq!(w.cardinality(0), 1);
        assert_eq!(w.cardinality(1), 1);
    }
}
