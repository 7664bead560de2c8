//! I/O for reading and writing rasters
//!
//! Only a native GeoTIFF path is provided; the zoning pipeline itself never
//! touches the filesystem.

mod native;

pub use native::{read_index_raster, write_label_raster};
