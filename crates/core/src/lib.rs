//! # AgroZone Core
//!
//! Core types and I/O for the AgroZone management-zone toolkit.
//!
//! This crate provides:
//! - `Raster<T>`: Generic georeferenced raster grid
//! - `GeoTransform`: Affine transformation for georeferencing
//! - `Crs`: Coordinate reference system identifier handling
//! - `IndexStack`: Insertion-ordered stack of spectral index arrays
//! - Native GeoTIFF I/O for single-band float rasters

pub mod crs;
pub mod error;
pub mod io;
pub mod raster;
pub mod stack;

pub use crs::Crs;
pub use error::{Error, Result};
pub use raster::{GeoTransform, Raster, RasterElement};
pub use stack::IndexStack;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::crs::Crs;
    pub use crate::error::{Error, Result};
    pub use crate::raster::{GeoTransform, Raster, RasterElement};
    pub use crate::stack::IndexStack;
}
