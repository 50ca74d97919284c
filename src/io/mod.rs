//! File formats at the edge of the pipeline.
//!
//! - `csv` - tabular inputs (samples, observations, adjacency lists) and outputs
//! - `geojson` - district boundaries

mod csv;
mod geojson;

pub use csv::{read_csv, read_csv_string, write_csv};
pub use geojson::{read_districts_geojson, read_districts_geojson_bytes};
