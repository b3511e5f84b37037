//! I/O operations for reading and writing vector data

mod geojson;

pub use geojson::{parse_geojson, read_geojson, write_geojson, write_geojson_string};
