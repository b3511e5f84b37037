//! Vector data structures: features, attribute values, feature collections
//!
//! A [`Feature`] pairs a 2D geometry with a map of named attribute values.
//! [`FeatureCollection`] is the unit every analysis operates on: algorithms
//! read attribute columns and geometries from it, and write per-feature
//! results back as new columns. Collections are cheap to clone; analyses that
//! mutate attributes are expected to work on a clone, never on the caller's
//! collection.

use geo_types::Geometry;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{Error, Result};

/// Attribute value types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl AttributeValue {
    /// Numeric view of the value. `Bool` coerces to 0/1 so that dummy
    /// columns can feed back into numeric analyses.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttributeValue::Int(v) => Some(*v as f64),
            AttributeValue::Float(v) => Some(*v),
            AttributeValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    /// Categorical view of the value. `Null` has no category.
    pub fn as_category(&self) -> Option<String> {
        match self {
            AttributeValue::String(s) => Some(s.clone()),
            AttributeValue::Int(v) => Some(v.to_string()),
            AttributeValue::Float(v) => Some(v.to_string()),
            AttributeValue::Bool(b) => Some(b.to_string()),
            AttributeValue::Null => None,
        }
    }
}

/// Geometry class of a collection, for algorithms that care about the
/// point/polygon distinction (contiguity weights, centroid substitution).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryKind {
    Point,
    Polygon,
}

impl GeometryKind {
    pub fn name(&self) -> &'static str {
        match self {
            GeometryKind::Point => "Point",
            GeometryKind::Polygon => "Polygon",
        }
    }
}

/// Human-readable name of a geometry variant, for error messages.
pub fn geometry_type_name(geom: &Geometry<f64>) -> &'static str {
    match geom {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}

fn kind_of(geom: &Geometry<f64>) -> Option<GeometryKind> {
    match geom {
        Geometry::Point(_) => Some(GeometryKind::Point),
        Geometry::Polygon(_) | Geometry::MultiPolygon(_) => Some(GeometryKind::Polygon),
        _ => None,
    }
}

/// A geographic feature with geometry and attributes
#[derive(Debug, Clone)]
pub struct Feature {
    /// Feature geometry
    pub geometry: Option<Geometry<f64>>,
    /// Feature attributes
    pub properties: HashMap<String, AttributeValue>,
    /// Optional feature ID
    pub id: Option<String>,
}

impl Feature {
    /// Create a new feature with geometry
    pub fn new(geometry: Geometry<f64>) -> Self {
        Self {
            geometry: Some(geometry),
            properties: HashMap::new(),
            id: None,
        }
    }

    /// Create a feature with no geometry
    pub fn empty() -> Self {
        Self {
            geometry: None,
            properties: HashMap::new(),
            id: None,
        }
    }

    /// Set an attribute
    pub fn set_property(&mut self, key: impl Into<String>, value: AttributeValue) {
        self.properties.insert(key.into(), value);
    }

    /// Get an attribute
    pub fn get_property(&self, key: &str) -> Option<&AttributeValue> {
        self.properties.get(key)
    }
}

/// Ordered collection of features
#[derive(Debug, Clone, Default)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new() -> Self {
        Self {
            features: Vec::new(),
        }
    }

    pub fn push(&mut self, feature: Feature) {
        self.features.push(feature);
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Feature> {
        self.features.iter()
    }

    /// All field names appearing in any feature, sorted.
    pub fn field_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .features
            .iter()
            .flat_map(|f| f.properties.keys().cloned())
            .collect();
        names.sort();
        names.dedup();
        names
    }

    /// Extract a numeric column, one value per feature in collection order.
    ///
    /// Fails with [`Error::UnknownField`] if any feature lacks the field and
    /// [`Error::NonNumericField`] if a value cannot be read as a number.
    pub fn numeric_column(&self, field: &str) -> Result<Vec<f64>> {
        self.features
            .iter()
            .enumerate()
            .map(|(index, feature)| {
                let value = feature
                    .get_property(field)
                    .ok_or_else(|| Error::UnknownField(field.to_string()))?;
                value.as_f64().ok_or_else(|| Error::NonNumericField {
                    field: field.to_string(),
                    index,
                })
            })
            .collect()
    }

    /// Extract a categorical column, one label per feature in collection order.
    ///
    /// Numeric and boolean values are rendered as their string form; a `Null`
    /// value fails because it has no category.
    pub fn string_column(&self, field: &str) -> Result<Vec<String>> {
        self.features
            .iter()
            .enumerate()
            .map(|(index, feature)| {
                let value = feature
                    .get_property(field)
                    .ok_or_else(|| Error::UnknownField(field.to_string()))?;
                value.as_category().ok_or_else(|| {
                    Error::DegenerateInput(format!(
                        "feature {index} has a null value in field '{field}'"
                    ))
                })
            })
            .collect()
    }

    /// Append a column of attribute values, one per feature.
    ///
    /// Fails with [`Error::InvalidParameter`] if the field already exists on
    /// any feature, and [`Error::DimensionMismatch`] on a length mismatch.
    pub fn add_column(&mut self, name: &str, values: Vec<AttributeValue>) -> Result<()> {
        if values.len() != self.features.len() {
            return Err(Error::DimensionMismatch {
                expected: self.features.len(),
                actual: values.len(),
            });
        }
        if self.features.iter().any(|f| f.properties.contains_key(name)) {
            return Err(Error::InvalidParameter {
                name: "field",
                value: name.to_string(),
                reason: "field already exists".to_string(),
            });
        }
        for (feature, value) in self.features.iter_mut().zip(values) {
            feature.properties.insert(name.to_string(), value);
        }
        Ok(())
    }

    /// Append a numeric column. NaN values are stored as `Null` so they
    /// survive serialization to formats without a NaN representation.
    pub fn add_numeric_column(&mut self, name: &str, values: &[f64]) -> Result<()> {
        let values = values
            .iter()
            .map(|&v| {
                if v.is_nan() {
                    AttributeValue::Null
                } else {
                    AttributeValue::Float(v)
                }
            })
            .collect();
        self.add_column(name, values)
    }

    /// Geometry class of the collection.
    ///
    /// All features must carry a geometry of the same class (all points, or
    /// all polygons/multipolygons).
    pub fn geometry_kind(&self) -> Result<GeometryKind> {
        let mut kind: Option<GeometryKind> = None;
        for (index, feature) in self.features.iter().enumerate() {
            let geom = feature
                .geometry
                .as_ref()
                .ok_or(Error::MissingGeometry(index))?;
            let this = kind_of(geom).ok_or_else(|| Error::UnsupportedGeometry {
                method: "spatial analysis",
                geometry: geometry_type_name(geom),
            })?;
            match kind {
                None => kind = Some(this),
                Some(k) if k != this => {
                    return Err(Error::MixedGeometry(k.name(), this.name()));
                }
                Some(_) => {}
            }
        }
        kind.ok_or(Error::InsufficientData {
            needed: 1,
            actual: 0,
            what: "features",
        })
    }
}

impl IntoIterator for FeatureCollection {
    type Item = Feature;
    type IntoIter = std::vec::IntoIter<Feature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::{point, polygon};

    fn point_feature(x: f64, y: f64, value: f64) -> Feature {
        let mut f = Feature::new(Geometry::Point(point! { x: x, y: y }));
        f.set_property("value", AttributeValue::Float(value));
        f
    }

    #[test]
    fn test_numeric_column_order() {
        let mut fc = FeatureCollection::new();
        fc.push(point_feature(0.0, 0.0, 1.0));
        fc.push(point_feature(1.0, 0.0, 2.0));
        fc.push(point_feature(2.0, 0.0, 3.0));

        let col = fc.numeric_column("value").unwrap();
        assert_eq!(col, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_numeric_column_unknown_field() {
        let mut fc = FeatureCollection::new();
        fc.push(point_feature(0.0, 0.0, 1.0));
        assert!(matches!(
            fc.numeric_column("missing"),
            Err(Error::UnknownField(_))
        ));
    }

    #[test]
    fn test_numeric_column_non_numeric() {
        let mut fc = FeatureCollection::new();
        let mut f = point_feature(0.0, 0.0, 1.0);
        f.set_property("name", AttributeValue::String("a".into()));
        fc.push(f);
        assert!(matches!(
            fc.numeric_column("name"),
            Err(Error::NonNumericField { .. })
        ));
    }

    #[test]
    fn test_bool_coerces_to_numeric() {
        let mut fc = FeatureCollection::new();
        let mut f = point_feature(0.0, 0.0, 1.0);
        f.set_property("flag", AttributeValue::Bool(true));
        fc.push(f);
        assert_eq!(fc.numeric_column("flag").unwrap(), vec![1.0]);
    }

    #[test]
    fn test_string_column_renders_numbers() {
        let mut fc = FeatureCollection::new();
        let mut f = point_feature(0.0, 0.0, 1.0);
        f.set_property("zone", AttributeValue::Int(7));
        fc.push(f);
        assert_eq!(fc.string_column("zone").unwrap(), vec!["7".to_string()]);
    }

    #[test]
    fn test_add_column_rejects_existing() {
        let mut fc = FeatureCollection::new();
        fc.push(point_feature(0.0, 0.0, 1.0));
        let err = fc.add_column("value", vec![AttributeValue::Int(1)]);
        assert!(matches!(err, Err(Error::InvalidParameter { .. })));
    }

    #[test]
    fn test_add_column_length_mismatch() {
        let mut fc = FeatureCollection::new();
        fc.push(point_feature(0.0, 0.0, 1.0));
        fc.push(point_feature(1.0, 0.0, 2.0));
        let err = fc.add_column("x", vec![AttributeValue::Int(1)]);
        assert!(matches!(err, Err(Error::DimensionMismatch { .. })));
    }

    #[test]
    fn test_add_numeric_column_nan_to_null() {
        let mut fc = FeatureCollection::new();
        fc.push(point_feature(0.0, 0.0, 1.0));
        fc.push(point_feature(1.0, 0.0, 2.0));
        fc.add_numeric_column("r", &[0.5, f64::NAN]).unwrap();
        assert_eq!(
            fc.features[1].get_property("r"),
            Some(&AttributeValue::Null)
        );
    }

    #[test]
    fn test_geometry_kind_points() {
        let mut fc = FeatureCollection::new();
        fc.push(point_feature(0.0, 0.0, 1.0));
        fc.push(point_feature(1.0, 0.0, 2.0));
        assert_eq!(fc.geometry_kind().unwrap(), GeometryKind::Point);
    }

    #[test]
    fn test_geometry_kind_mixed() {
        let mut fc = FeatureCollection::new();
        fc.push(point_feature(0.0, 0.0, 1.0));
        let poly = polygon![
            (x: 0.0, y: 0.0),
            (x: 1.0, y: 0.0),
            (x: 1.0, y: 1.0),
            (x: 0.0, y: 1.0),
        ];
        fc.push(Feature::new(Geometry::Polygon(poly)));
        assert!(matches!(
            fc.geometry_kind(),
            Err(Error::MixedGeometry(_, _))
        ));
    }

    #[test]
    fn test_geometry_kind_missing_geometry() {
        let mut fc = FeatureCollection::new();
        fc.push(Feature::empty());
        assert!(matches!(fc.geometry_kind(), Err(Error::MissingGeometry(0))));
    }

    #[test]
    fn test_field_names_sorted() {
        let mut fc = FeatureCollection::new();
        let mut f = point_feature(0.0, 0.0, 1.0);
        f.set_property("alpha", AttributeValue::Int(1));
        fc.push(f);
        assert_eq!(fc.field_names(), vec!["alpha", "value"]);
    }
}
