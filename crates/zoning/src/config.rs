//! Pipeline configuration

use crate::error::{Result, ZoningError};
use serde::{Deserialize, Serialize};

/// Configuration for a zoning run.
///
/// All fields have serde defaults so a partial JSON document (or none at all)
/// yields a usable configuration. `validate()` enforces the admissible ranges
/// before a run starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ZoningConfig {
    /// Random seed threading through cluster initialization and sampling.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Zones smaller than this (hectares) are dropped after polygonization.
    #[serde(default = "default_min_zone_size_ha")]
    pub min_zone_size_ha: f64,

    /// Largest cluster count evaluated during automatic selection.
    #[serde(default = "default_max_zones")]
    pub max_zones: usize,

    /// Skip selection and cluster with exactly this count.
    #[serde(default)]
    pub force_k: Option<usize>,

    /// Minimum sampling points placed per zone.
    #[serde(default = "default_points_per_zone")]
    pub points_per_zone: usize,

    /// Reduce feature dimensionality with PCA before clustering.
    #[serde(default)]
    pub use_pca: bool,

    /// Cumulative explained-variance ratio retained when PCA is enabled.
    #[serde(default = "default_pca_variance")]
    pub pca_variance: f64,
}

fn default_seed() -> u64 {
    42
}

fn default_min_zone_size_ha() -> f64 {
    0.5
}

fn default_max_zones() -> usize {
    10
}

fn default_points_per_zone() -> usize {
    5
}

fn default_pca_variance() -> f64 {
    0.95
}

impl Default for ZoningConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            min_zone_size_ha: default_min_zone_size_ha(),
            max_zones: default_max_zones(),
            force_k: None,
            points_per_zone: default_points_per_zone(),
            use_pca: false,
            pca_variance: default_pca_variance(),
        }
    }
}

impl ZoningConfig {
    /// Check every parameter against its admissible range.
    pub fn validate(&self) -> Result<()> {
        if !(self.min_zone_size_ha >= 0.0) {
            return Err(ZoningError::InvalidInput {
                message: format!("min_zone_size_ha must be >= 0, got {}", self.min_zone_size_ha),
            });
        }
        if self.max_zones < 2 {
            return Err(ZoningError::InvalidInput {
                message: format!("max_zones must be >= 2, got {}", self.max_zones),
            });
        }
        if let Some(k) = self.force_k {
            if k < 2 {
                return Err(ZoningError::InvalidInput {
                    message: format!("force_k must be >= 2, got {k}"),
                });
            }
        }
        if self.points_per_zone < 1 {
            return Err(ZoningError::InvalidInput {
                message: "points_per_zone must be >= 1".into(),
            });
        }
        if !(self.pca_variance > 0.0 && self.pca_variance <= 1.0) {
            return Err(ZoningError::InvalidInput {
                message: format!("pca_variance must lie in (0, 1], got {}", self.pca_variance),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let cfg = ZoningConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.seed, 42);
        assert_eq!(cfg.max_zones, 10);
        assert_eq!(cfg.points_per_zone, 5);
        assert!(!cfg.use_pca);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let cfg: ZoningConfig = serde_json::from_str(r#"{"max_zones": 4, "use_pca": true}"#).unwrap();
        assert_eq!(cfg.max_zones, 4);
        assert!(cfg.use_pca);
        assert_eq!(cfg.seed, 42);
        assert!((cfg.pca_variance - 0.95).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_ranges_rejected() {
        let mut cfg = ZoningConfig {
            max_zones: 1,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());

        cfg.max_zones = 5;
        cfg.force_k = Some(1);
        assert!(cfg.validate().is_err());

        cfg.force_k = None;
        cfg.pca_variance = 0.0;
        assert!(cfg.validate().is_err());

        cfg.pca_variance = 0.95;
        cfg.min_zone_size_ha = f64::NAN;
        assert!(cfg.validate().is_err());
    }
}
