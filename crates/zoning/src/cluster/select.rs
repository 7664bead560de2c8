//! Cluster-count selection
//!
//! Evaluates candidate counts by silhouette, with Calinski-Harabasz and then
//! the smaller count as tie-breakers, or validates a forced count against the
//! admissible range.

use crate::cluster::{kmeans, quality};
use crate::error::{Result, ZoningError};
use ndarray::Array2;
use tracing::{debug, info};

/// Parameters for cluster-count selection
#[derive(Debug, Clone)]
pub struct SelectParams {
    /// Largest candidate count to evaluate
    pub max_k: usize,
    /// Skip evaluation and use exactly this count
    pub force_k: Option<usize>,
    /// Seed for the candidate fits
    pub seed: u64,
}

/// Scores recorded for one candidate count
#[derive(Debug, Clone)]
pub struct CandidateScore {
    pub k: usize,
    pub silhouette: f64,
    pub calinski_harabasz: f64,
    pub inertia: f64,
}

/// Choose the cluster count for `features` (shape `(n, d)`).
pub fn select_cluster_count(features: &Array2<f64>, params: &SelectParams) -> Result<usize> {
    let n = features.nrows();
    let upper = params.max_k.min(n.saturating_sub(1));

    if let Some(forced) = params.force_k {
        if forced < 2 || forced > upper {
            return Err(ZoningError::InvalidClusterCount {
                requested: forced,
                max_admissible: upper,
            });
        }
        info!(k = forced, "using forced cluster count");
        return Ok(forced);
    }

    if n < 3 {
        return Err(ZoningError::InsufficientSamples { available: n });
    }

    let mut best: Option<CandidateScore> = None;

    for k in 2..=upper {
        let fit = kmeans::fit(features, &kmeans::KmeansParams::new(k, params.seed))?;

        let mut non_empty = vec![false; k];
        for &l in &fit.labels {
            non_empty[l] = true;
        }
        if non_empty.iter().filter(|&&v| v).count() < 2 {
            debug!(k, "candidate skipped: fewer than 2 non-empty clusters");
            continue;
        }

        let score = CandidateScore {
            k,
            silhouette: quality::silhouette_score(features, &fit.labels),
            calinski_harabasz: quality::calinski_harabasz_score(features, &fit.labels),
            inertia: fit.inertia,
        };
        info!(
            k,
            silhouette = score.silhouette,
            calinski_harabasz = score.calinski_harabasz,
            inertia = score.inertia,
            "candidate evaluated"
        );

        best = match best {
            None => Some(score),
            Some(current) if beats(&score, &current) => Some(score),
            Some(current) => Some(current),
        };
    }

    match best {
        Some(score) => {
            info!(k = score.k, silhouette = score.silhouette, "selected cluster count");
            Ok(score.k)
        }
        None => Err(ZoningError::ClusteringFailure(format!(
            "no candidate in [2, {upper}] produced two or more non-empty clusters"
        ))),
    }
}

/// Candidate ordering: silhouette, then Calinski-Harabasz, then smaller k.
fn beats(challenger: &CandidateScore, incumbent: &CandidateScore) -> bool {
    if challenger.silhouette != incumbent.silhouette {
        return challenger.silhouette > incumbent.silhouette;
    }
    if challenger.calinski_harabasz != incumbent.calinski_harabasz {
        return challenger.calinski_harabasz > incumbent.calinski_harabasz;
    }
    challenger.k < incumbent.k
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn three_blobs() -> Array2<f64> {
        let mut data = Vec::new();
        for &center in &[0.0, 10.0, 20.0] {
            for off in 0..4 {
                data.push(center + off as f64 * 0.05);
                data.push(center - off as f64 * 0.05);
            }
        }
        Array2::from_shape_vec((12, 2), data).unwrap()
    }

    #[test]
    fn test_finds_three_blobs() {
        let features = three_blobs();
        let params = SelectParams {
            max_k: 6,
            force_k: None,
            seed: 42,
        };
        let k = select_cluster_count(&features, &params).unwrap();
        assert_eq!(k, 3);
    }

    #[test]
    fn test_force_k_passthrough() {
        let features = three_blobs();
        let params = SelectParams {
            max_k: 6,
            force_k: Some(4),
            seed: 42,
        };
        assert_eq!(select_cluster_count(&features, &params).unwrap(), 4);
    }

    #[test]
    fn test_force_k_above_n_minus_one() {
        let features = Array2::from_shape_vec((3, 1), vec![0.0, 0.5, 1.0]).unwrap();
        let params = SelectParams {
            max_k: 10,
            force_k: Some(5),
            seed: 42,
        };
        let err = select_cluster_count(&features, &params).unwrap_err();
        assert!(matches!(
            err,
            ZoningError::InvalidClusterCount {
                requested: 5,
                max_admissible: 2
            }
        ));
    }

    #[test]
    fn test_too_few_samples() {
        let features = Array2::from_shape_vec((2, 1), vec![0.0, 1.0]).unwrap();
        let params = SelectParams {
            max_k: 10,
            force_k: None,
            seed: 42,
        };
        let err = select_cluster_count(&features, &params).unwrap_err();
        assert!(matches!(
            err,
            ZoningError::InsufficientSamples { available: 2 }
        ));
    }

    #[test]
    fn test_tie_break_prefers_smaller_k() {
        let a = CandidateScore {
            k: 2,
            silhouette: 0.5,
            calinski_harabasz: 10.0,
            inertia: 1.0,
        };
        let b = CandidateScore {
            k: 3,
            silhouette: 0.5,
            calinski_harabasz: 10.0,
            inertia: 0.5,
        };
        assert!(!beats(&b, &a));
        assert!(beats(&a, &b));
    }
}
