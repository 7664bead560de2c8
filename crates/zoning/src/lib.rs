//! # AgroZone Zoning
//!
//! Management-zone delineation for precision agriculture.
//!
//! The pipeline partitions a field, given as a stack of spectral index
//! rasters plus a boundary polygon, into a small number of spectrally
//! homogeneous zones, places spatially dispersed sampling points inside each
//! zone, and reports geometric and per-index statistics.
//!
//! Stages, in order:
//! 1. Valid-pixel mask (inside the field and all indices finite)
//! 2. Feature matrix (impute, standardize, optional PCA)
//! 3. Cluster-count selection (silhouette with Calinski-Harabasz tie-break)
//! 4. K-means clustering and label-raster reconstruction
//! 5. Raster-to-polygon dissolve per label
//! 6. Minimum-size filter with consecutive zone ids
//! 7. Farthest-point sampling inside each zone
//! 8. Per-zone statistics
//!
//! The whole run is deterministic for a given seed. The pipeline performs no
//! I/O; rendering results to files is the caller's concern.
//!
//! ```no_run
//! use agrozone_core::{Crs, GeoTransform, IndexStack};
//! use agrozone_zoning::{ZoningConfig, ZoningInput, ZoningPipeline};
//! use geo_types::{polygon, Geometry};
//! use ndarray::array;
//!
//! let mut indices = IndexStack::new();
//! indices.insert("NDVI", array![[0.1, 0.2], [0.8, 0.9]])?;
//!
//! let input = ZoningInput {
//!     indices,
//!     field: Geometry::Polygon(polygon![
//!         (x: 0.0, y: 0.0), (x: 2.0, y: 0.0), (x: 2.0, y: 2.0), (x: 0.0, y: 2.0),
//!     ]),
//!     transform: GeoTransform::new(0.0, 2.0, 1.0, -1.0),
//!     crs: Crs::from_epsg(32719),
//! };
//!
//! let result = ZoningPipeline::new(ZoningConfig::default())?.run(input)?;
//! println!("{} zones, {} samples", result.zones.len(), result.samples.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod cancel;
pub mod cluster;
pub mod config;
pub mod error;
pub mod features;
pub mod mask;
mod maybe_rayon;
pub mod pipeline;
pub mod polygonize;
pub mod sample;
pub mod stats;
pub mod zones;

pub use cancel::CancelToken;
pub use cluster::ClusterMetrics;
pub use config::ZoningConfig;
pub use error::{Result, ZoningError};
pub use pipeline::{run, ZoningInput, ZoningPipeline, ZoningResult};
pub use sample::SamplePoint;
pub use stats::ZoneStats;
pub use zones::Zone;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::cancel::CancelToken;
    pub use crate::cluster::ClusterMetrics;
    pub use crate::config::ZoningConfig;
    pub use crate::error::{Result, ZoningError};
    pub use crate::pipeline::{run, ZoningInput, ZoningPipeline, ZoningResult};
    pub use crate::sample::SamplePoint;
    pub use crate::stats::ZoneStats;
    pub use crate::zones::Zone;
    pub use agrozone_core::prelude::*;
}
