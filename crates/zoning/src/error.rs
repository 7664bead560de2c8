//! Error types for the zoning pipeline
//!
//! Every failure mode of the pipeline is a tagged variant; callers dispatch
//! on kind. No partial results accompany an error.

use thiserror::Error;

/// Main error type for zoning runs
#[derive(Error, Debug)]
pub enum ZoningError {
    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    #[error("no valid pixels: {inside_polygon} inside the field polygon, {with_data} with finite data, 0 in both")]
    NoValidPixels {
        inside_polygon: usize,
        with_data: usize,
    },

    #[error("degenerate feature matrix: {0}")]
    DegenerateFeature(String),

    #[error("forced cluster count {requested} outside admissible range [2, {max_admissible}]")]
    InvalidClusterCount {
        requested: usize,
        max_admissible: usize,
    },

    #[error("insufficient samples for clustering: {available} valid pixels, at least 3 required")]
    InsufficientSamples { available: usize },

    #[error("clustering failure: {0}")]
    ClusteringFailure(String),

    #[error("polygonizer produced no zone records")]
    NoZones,

    #[error("all {dropped} zones fell below the minimum size of {min_zone_size_ha} ha")]
    AllZonesFiltered {
        dropped: usize,
        min_zone_size_ha: f64,
    },

    #[error("no sampling points were generated in any zone")]
    NoSamples,

    #[error("run cancelled")]
    Cancelled,
}

impl From<agrozone_core::Error> for ZoningError {
    fn from(e: agrozone_core::Error) -> Self {
        ZoningError::InvalidInput {
            message: e.to_string(),
        }
    }
}

/// Result type alias for zoning operations
pub type Result<T> = std::result::Result<T, ZoningError>;
