//! Pipeline orchestration
//!
//! Linear stage sequence over the component modules:
//! mask → features → cluster-count selection → clustering → polygonization →
//! size filter → statistics → sampling → result assembly. Any failure aborts
//! the run with a typed error and no partial output; the cancellation token
//! is polled between stages.

use crate::cancel::CancelToken;
use crate::cluster::{self, select, ClusterMetrics};
use crate::config::ZoningConfig;
use crate::error::{Result, ZoningError};
use crate::features::{self, FeatureParams};
use crate::sample::{self, SamplePoint};
use crate::stats::{self, ZoneStats};
use crate::zones::{self, Zone};
use crate::{mask, polygonize};
use agrozone_core::{Crs, GeoTransform, IndexStack};
use geo::Area;
use geo_types::Geometry;
use ndarray::Array2;
use tracing::info;

/// Everything one zoning run consumes.
#[derive(Debug, Clone)]
pub struct ZoningInput {
    /// Ordered stack of spectral index arrays
    pub indices: IndexStack,
    /// Field boundary in the same CRS as the georeferencing
    pub field: Geometry<f64>,
    /// Affine pixel-to-world mapping
    pub transform: GeoTransform,
    /// CRS identifier, stored and forwarded unchanged
    pub crs: Crs,
}

/// Everything one zoning run produces.
#[derive(Debug, Clone)]
pub struct ZoningResult {
    /// Zones ordered by `zone_id`
    pub zones: Vec<Zone>,
    /// Samples ordered by `zone_id`, selection order within a zone
    pub samples: Vec<SamplePoint>,
    /// Quality metrics of the pre-filter clustering
    pub metrics: ClusterMetrics,
    /// Per-zone spectral statistics, ordered like `zones`
    pub stats: Vec<ZoneStats>,
    /// Cluster assignment raster; −1 outside the valid mask, original
    /// (pre-filter) labels elsewhere
    pub assignment: Array2<i32>,
    /// CRS identifier forwarded from the input
    pub crs: Crs,
}

/// The zoning pipeline, configured once and reusable across runs.
///
/// Runs share nothing: every invocation owns its intermediate arrays, so
/// concurrent runs on disjoint inputs cannot observe each other.
#[derive(Debug, Clone)]
pub struct ZoningPipeline {
    config: ZoningConfig,
}

impl ZoningPipeline {
    /// Validate the configuration and build a pipeline.
    pub fn new(config: ZoningConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ZoningConfig {
        &self.config
    }

    /// Run the full pipeline.
    pub fn run(&self, input: ZoningInput) -> Result<ZoningResult> {
        self.run_with_cancel(input, &CancelToken::new())
    }

    /// Run the full pipeline, polling `cancel` at component boundaries.
    pub fn run_with_cancel(
        &self,
        input: ZoningInput,
        cancel: &CancelToken,
    ) -> Result<ZoningResult> {
        let cfg = &self.config;
        validate_input(&input)?;
        let shape = input.indices.shape().expect("validated non-empty stack");
        info!(
            rows = shape.0,
            cols = shape.1,
            indices = input.indices.len(),
            crs = %input.crs,
            "zoning run started"
        );

        cancel.check()?;
        let valid_mask = mask::build_valid_mask(&input.field, &input.transform, shape, &input.indices)?;

        cancel.check()?;
        let feature_params = FeatureParams {
            use_pca: cfg.use_pca,
            pca_variance: cfg.pca_variance,
        };
        let feature_matrix = features::prepare_features(&input.indices, &valid_mask, feature_params)?;
        info!(
            samples = feature_matrix.nrows(),
            dims = feature_matrix.ncols(),
            "feature matrix prepared"
        );

        cancel.check()?;
        let k = select::select_cluster_count(
            &feature_matrix,
            &select::SelectParams {
                max_k: cfg.max_zones,
                force_k: cfg.force_k,
                seed: cfg.seed,
            },
        )?;

        cancel.check()?;
        let (assignment, metrics) = cluster::cluster_image(&feature_matrix, &valid_mask, k, cfg.seed)?;

        cancel.check()?;
        let initial_zones = polygonize::zone_polygons(&assignment, &input.transform)?;

        cancel.check()?;
        let zones = zones::filter_zones(initial_zones, cfg.min_zone_size_ha)?;

        cancel.check()?;
        let stats = stats::zone_statistics(&zones, &assignment, &input.indices);

        cancel.check()?;
        let samples = sample::sample_zones(
            &zones,
            &assignment,
            &input.indices,
            &input.transform,
            cfg.points_per_zone,
            cfg.seed,
        )?;

        info!(
            zones = zones.len(),
            samples = samples.len(),
            "zoning run finished"
        );

        Ok(ZoningResult {
            zones,
            samples,
            metrics,
            stats,
            assignment,
            crs: input.crs,
        })
    }
}

/// Run the pipeline once with the given configuration.
pub fn run(
    indices: IndexStack,
    field: Geometry<f64>,
    transform: GeoTransform,
    crs: Crs,
    config: ZoningConfig,
) -> Result<ZoningResult> {
    ZoningPipeline::new(config)?.run(ZoningInput {
        indices,
        field,
        transform,
        crs,
    })
}

fn validate_input(input: &ZoningInput) -> Result<()> {
    if input.indices.is_empty() {
        return Err(ZoningError::InvalidInput {
            message: "index stack is empty".into(),
        });
    }
    // IndexStack enforces a common non-degenerate shape on insert; reject a
    // stack that somehow reports none anyway.
    let (rows, cols) = input.indices.shape().ok_or_else(|| ZoningError::InvalidInput {
        message: "index stack has no shape".into(),
    })?;
    if rows == 0 || cols == 0 {
        return Err(ZoningError::InvalidInput {
            message: format!("non-positive raster dimensions {rows}x{cols}"),
        });
    }

    if input.crs.is_empty() {
        return Err(ZoningError::InvalidInput {
            message: "crs identifier is missing".into(),
        });
    }

    match &input.field {
        Geometry::Polygon(p) => {
            if p.exterior().0.len() < 4 || p.unsigned_area() <= 0.0 {
                return Err(ZoningError::InvalidInput {
                    message: "field polygon is empty or degenerate".into(),
                });
            }
        }
        Geometry::MultiPolygon(mp) => {
            if mp.0.is_empty() || mp.unsigned_area() <= 0.0 {
                return Err(ZoningError::InvalidInput {
                    message: "field multipolygon is empty or degenerate".into(),
                });
            }
        }
        _ => {
            return Err(ZoningError::InvalidInput {
                message: "field geometry must be a polygon or multipolygon".into(),
            });
        }
    }

    if input.transform.pixel_area() <= 0.0 {
        return Err(ZoningError::InvalidInput {
            message: "geotransform is degenerate (zero pixel area)".into(),
        });
    }

    Ok(())
}
