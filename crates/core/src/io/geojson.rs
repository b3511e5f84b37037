//! Native GeoJSON reading/writing
//!
//! Hand-rolled mapping between GeoJSON documents and [`FeatureCollection`],
//! built on `serde_json` values. Supports Point, Polygon and MultiPolygon
//! geometries and scalar properties, the subset the analysis algorithms
//! consume. Features may carry a null geometry (attribute-only analyses
//! accept them).
//!
//! NaN attribute values are written as JSON `null`; nulls read back as
//! [`AttributeValue::Null`].

use geo_types::{Geometry, LineString, MultiPolygon, Point, Polygon};
use serde_json::{json, Map, Number, Value};
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::vector::{AttributeValue, Feature, FeatureCollection};

/// Read a GeoJSON FeatureCollection from a file
pub fn read_geojson<P: AsRef<Path>>(path: P) -> Result<FeatureCollection> {
    let text = fs::read_to_string(path.as_ref())?;
    parse_geojson(&text)
}

/// Parse a GeoJSON FeatureCollection from a string
pub fn parse_geojson(text: &str) -> Result<FeatureCollection> {
    let root: Value =
        serde_json::from_str(text).map_err(|e| Error::GeoJson(format!("parse error: {e}")))?;

    let obj = root
        .as_object()
        .ok_or_else(|| Error::GeoJson("document root is not an object".into()))?;

    match obj.get("type").and_then(Value::as_str) {
        Some("FeatureCollection") => {}
        other => {
            return Err(Error::GeoJson(format!(
                "expected FeatureCollection, got {other:?}"
            )))
        }
    }

    let features = obj
        .get("features")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::GeoJson("missing 'features' array".into()))?;

    let mut collection = FeatureCollection::new();
    for (index, value) in features.iter().enumerate() {
        collection.push(decode_feature(value, index)?);
    }
    Ok(collection)
}

/// Write a FeatureCollection to a GeoJSON file
pub fn write_geojson<P: AsRef<Path>>(path: P, collection: &FeatureCollection) -> Result<()> {
    fs::write(path.as_ref(), write_geojson_string(collection))?;
    Ok(())
}

/// Serialize a FeatureCollection to a GeoJSON string
pub fn write_geojson_string(collection: &FeatureCollection) -> String {
    let features: Vec<Value> = collection.iter().map(encode_feature).collect();
    let doc = json!({
        "type": "FeatureCollection",
        "features": features,
    });
    // json! never produces invalid documents, so this cannot fail
    serde_json::to_string_pretty(&doc).unwrap_or_default()
}

// ─── Decoding ───────────────────────────────────────────────────────────

fn decode_feature(value: &Value, index: usize) -> Result<Feature> {
    let obj = value
        .as_object()
        .ok_or_else(|| Error::GeoJson(format!("feature {index} is not an object")))?;

    let mut feature = match obj.get("geometry") {
        None | Some(Value::Null) => Feature::empty(),
        Some(geom) => Feature::new(decode_geometry(geom, index)?),
    };

    feature.id = match obj.get("id") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };

    if let Some(props) = obj.get("properties").and_then(Value::as_object) {
        for (key, value) in props {
            feature.set_property(key.clone(), decode_attribute(key, value, index)?);
        }
    }

    Ok(feature)
}

fn decode_attribute(key: &str, value: &Value, index: usize) -> Result<AttributeValue> {
    match value {
        Value::Null => Ok(AttributeValue::Null),
        Value::Bool(b) => Ok(AttributeValue::Bool(*b)),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(AttributeValue::Int(i))
            } else {
                Ok(AttributeValue::Float(n.as_f64().unwrap_or(f64::NAN)))
            }
        }
        Value::String(s) => Ok(AttributeValue::String(s.clone())),
        _ => Err(Error::GeoJson(format!(
            "feature {index}: property '{key}' is not a scalar"
        ))),
    }
}

fn decode_geometry(value: &Value, index: usize) -> Result<Geometry<f64>> {
    let obj = value
        .as_object()
        .ok_or_else(|| Error::GeoJson(format!("feature {index}: geometry is not an object")))?;
    let gtype = obj
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::GeoJson(format!("feature {index}: geometry has no type")))?;
    let coords = obj
        .get("coordinates")
        .ok_or_else(|| Error::GeoJson(format!("feature {index}: geometry has no coordinates")))?;

    match gtype {
        "Point" => {
            let (x, y) = decode_position(coords, index)?;
            Ok(Geometry::Point(Point::new(x, y)))
        }
        "Polygon" => Ok(Geometry::Polygon(decode_polygon(coords, index)?)),
        "MultiPolygon" => {
            let parts = coords
                .as_array()
                .ok_or_else(|| malformed(index, "MultiPolygon"))?;
            let polygons = parts
                .iter()
                .map(|p| decode_polygon(p, index))
                .collect::<Result<Vec<_>>>()?;
            Ok(Geometry::MultiPolygon(MultiPolygon(polygons)))
        }
        other => Err(Error::GeoJson(format!(
            "feature {index}: unsupported geometry type '{other}'"
        ))),
    }
}

fn decode_polygon(coords: &Value, index: usize) -> Result<Polygon<f64>> {
    let rings = coords
        .as_array()
        .ok_or_else(|| malformed(index, "Polygon"))?;
    if rings.is_empty() {
        return Err(malformed(index, "Polygon"));
    }
    let mut decoded = rings
        .iter()
        .map(|r| decode_ring(r, index))
        .collect::<Result<Vec<_>>>()?;
    let exterior = decoded.remove(0);
    Ok(Polygon::new(exterior, decoded))
}

fn decode_ring(value: &Value, index: usize) -> Result<LineString<f64>> {
    let positions = value.as_array().ok_or_else(|| malformed(index, "ring"))?;
    let coords = positions
        .iter()
        .map(|p| decode_position(p, index))
        .collect::<Result<Vec<_>>>()?;
    Ok(LineString::from(coords))
}

fn decode_position(value: &Value, index: usize) -> Result<(f64, f64)> {
    let pair = value
        .as_array()
        .ok_or_else(|| malformed(index, "position"))?;
    if pair.len() < 2 {
        return Err(malformed(index, "position"));
    }
    let x = pair[0].as_f64().ok_or_else(|| malformed(index, "position"))?;
    let y = pair[1].as_f64().ok_or_else(|| malformed(index, "position"))?;
    Ok((x, y))
}

fn malformed(index: usize, what: &str) -> Error {
    Error::GeoJson(format!("feature {index}: malformed {what} coordinates"))
}

// ─── Encoding ───────────────────────────────────────────────────────────

fn encode_feature(feature: &Feature) -> Value {
    let mut obj = Map::new();
    obj.insert("type".into(), Value::String("Feature".into()));
    if let Some(id) = &feature.id {
        obj.insert("id".into(), Value::String(id.clone()));
    }
    obj.insert(
        "geometry".into(),
        feature
            .geometry
            .as_ref()
            .map(encode_geometry)
            .unwrap_or(Value::Null),
    );

    let mut props = Map::new();
    let mut keys: Vec<&String> = feature.properties.keys().collect();
    keys.sort();
    for key in keys {
        props.insert(key.clone(), encode_attribute(&feature.properties[key]));
    }
    obj.insert("properties".into(), Value::Object(props));
    Value::Object(obj)
}

fn encode_attribute(value: &AttributeValue) -> Value {
    match value {
        AttributeValue::Null => Value::Null,
        AttributeValue::Bool(b) => Value::Bool(*b),
        AttributeValue::Int(i) => Value::Number((*i).into()),
        AttributeValue::Float(f) => Number::from_f64(*f).map(Value::Number).unwrap_or(Value::Null),
        AttributeValue::String(s) => Value::String(s.clone()),
    }
}

fn encode_geometry(geom: &Geometry<f64>) -> Value {
    match geom {
        Geometry::Point(p) => json!({
            "type": "Point",
            "coordinates": [p.x(), p.y()],
        }),
        Geometry::Polygon(p) => json!({
            "type": "Polygon",
            "coordinates": encode_polygon(p),
        }),
        Geometry::MultiPolygon(mp) => json!({
            "type": "MultiPolygon",
            "coordinates": mp.0.iter().map(encode_polygon).collect::<Vec<_>>(),
        }),
        // Other variants never come out of the reader; represent them by
        // their convex outline is not worth it; emit a null geometry.
        _ => Value::Null,
    }
}

fn encode_polygon(polygon: &Polygon<f64>) -> Vec<Vec<[f64; 2]>> {
    std::iter::once(polygon.exterior())
        .chain(polygon.interiors().iter())
        .map(|ring| ring.coords().map(|c| [c.x, c.y]).collect())
        .collect()
}
