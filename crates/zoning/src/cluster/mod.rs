//! Clustering: k-means fit, quality scores, count selection, label raster
//!
//! `cluster_image` is the pipeline-facing entry: it fits k-means with the
//! chosen count, scatters labels back onto the raster grid by the same scan
//! order that built the feature matrix, and records quality metrics.

pub mod kmeans;
pub mod quality;
pub mod select;

pub use kmeans::{KmeansFit, KmeansParams};
pub use select::{select_cluster_count, SelectParams};

use crate::error::{Result, ZoningError};
use chrono::{SecondsFormat, Utc};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

/// Quality metrics of the final clustering
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterMetrics {
    /// Number of clusters fitted (pre-filter)
    pub n_clusters: usize,
    /// Mean silhouette coefficient
    pub silhouette: f64,
    /// Calinski-Harabasz variance-ratio score
    pub calinski_harabasz: f64,
    /// Sum of squared distances to assigned centroids
    pub inertia: f64,
    /// Pixels per label
    pub cluster_sizes: BTreeMap<i32, usize>,
    /// ISO-8601 UTC timestamp taken at clustering completion
    pub timestamp: String,
}

/// Fit k-means with `k` clusters and rebuild the label raster.
///
/// Returns the `(H, W)` assignment (−1 outside the mask) and the metrics
/// computed on the final labels.
pub fn cluster_image(
    features: &Array2<f64>,
    mask: &Array2<bool>,
    k: usize,
    seed: u64,
) -> Result<(Array2<i32>, ClusterMetrics)> {
    let fit = kmeans::fit(features, &KmeansParams::new(k, seed))?;

    let mut sizes: BTreeMap<i32, usize> = BTreeMap::new();
    for &label in &fit.labels {
        *sizes.entry(label as i32).or_insert(0) += 1;
    }
    if sizes.len() < 2 {
        return Err(ZoningError::ClusteringFailure(format!(
            "k-means with k={k} collapsed to {} non-empty cluster(s)",
            sizes.len()
        )));
    }

    let (rows, cols) = mask.dim();
    let mut assignment = Array2::from_elem((rows, cols), -1i32);
    let mut i = 0usize;
    for r in 0..rows {
        for c in 0..cols {
            if mask[[r, c]] {
                assignment[[r, c]] = fit.labels[i] as i32;
                i += 1;
            }
        }
    }
    debug_assert_eq!(i, fit.labels.len());

    let metrics = ClusterMetrics {
        n_clusters: k,
        silhouette: quality::silhouette_score(features, &fit.labels),
        calinski_harabasz: quality::calinski_harabasz_score(features, &fit.labels),
        inertia: fit.inertia,
        cluster_sizes: sizes,
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
    };
    info!(
        k,
        iterations = fit.iterations,
        silhouette = metrics.silhouette,
        calinski_harabasz = metrics.calinski_harabasz,
        inertia = metrics.inertia,
        "clustering complete"
    );

    Ok((assignment, metrics))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_label_raster_scatter() {
        // 4x1 grid, two obvious clusters, full mask.
        let features = array![[-1.0], [-0.9], [0.9], [1.0]];
        let mask = array![[true], [true], [true], [true]];

        let (assignment, metrics) = cluster_image(&features, &mask, 2, 42).unwrap();

        assert_eq!(assignment.dim(), (4, 1));
        assert_eq!(assignment[[0, 0]], assignment[[1, 0]]);
        assert_eq!(assignment[[2, 0]], assignment[[3, 0]]);
        assert_ne!(assignment[[0, 0]], assignment[[2, 0]]);

        assert_eq!(metrics.n_clusters, 2);
        assert_eq!(metrics.cluster_sizes.values().sum::<usize>(), 4);
        assert_eq!(metrics.cluster_sizes.len(), 2);
    }

    #[test]
    fn test_masked_pixels_stay_negative() {
        let features = array![[-1.0], [1.0], [1.1]];
        let mask = array![[true], [false], [true], [true]];

        let (assignment, _) = cluster_image(&features, &mask, 2, 42).unwrap();
        assert_eq!(assignment[[1, 0]], -1);
        assert!(assignment[[0, 0]] >= 0);
        assert!(assignment[[2, 0]] >= 0);
        assert!(assignment[[3, 0]] >= 0);
    }

    #[test]
    fn test_metrics_json_schema() {
        let features = array![[-1.0], [-0.9], [0.9], [1.0]];
        let mask = array![[true], [true], [true], [true]];
        let (_, metrics) = cluster_image(&features, &mask, 2, 42).unwrap();

        let json = serde_json::to_value(&metrics).unwrap();
        assert!(json["n_clusters"].is_u64());
        assert!(json["silhouette"].is_f64());
        assert!(json["calinski_harabasz"].is_f64());
        assert!(json["inertia"].is_f64());
        assert!(json["cluster_sizes"].is_object());
        assert_eq!(json["cluster_sizes"]["0"].as_u64(), Some(2));
        assert!(json["timestamp"].as_str().unwrap().ends_with('Z'));
    }
}
