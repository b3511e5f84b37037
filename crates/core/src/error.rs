//! Error types for TerraStat

use thiserror::Error;

/// Main error type for TerraStat operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{method} does not support {geometry} geometries")]
    UnsupportedGeometry {
        method: &'static str,
        geometry: &'static str,
    },

    #[error("Mixed geometry types in collection: {0} and {1}")]
    MixedGeometry(&'static str, &'static str),

    #[error("Feature {0} has no geometry")]
    MissingGeometry(usize),

    #[error("Dimension mismatch: expected {expected} values, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Insufficient data: need at least {needed} {what}, got {actual}")]
    InsufficientData {
        needed: usize,
        actual: usize,
        what: &'static str,
    },

    #[error("Degenerate input: {0}")]
    DegenerateInput(String),

    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Field {field} of feature {index} is not numeric")]
    NonNumericField { field: String, index: usize },

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("GeoJSON error: {0}")]
    GeoJson(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for TerraStat operations
pub type Result<T> = std::result::Result<T, Error>;
