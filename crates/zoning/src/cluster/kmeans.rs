//! K-means clustering over the feature matrix
//!
//! K-means++ seeding followed by Lloyd iterations with Euclidean distance.
//! Deterministic for a given seed: the only randomness is drawn from a
//! `StdRng` seeded by the caller, and every tie breaks toward the lower
//! sample index.

use crate::error::{Result, ZoningError};
use crate::maybe_rayon::*;
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Parameters for one k-means fit
#[derive(Debug, Clone)]
pub struct KmeansParams {
    /// Number of clusters
    pub k: usize,
    /// Maximum Lloyd iterations
    pub max_iterations: usize,
    /// Stop when no centroid moves farther than this between iterations
    pub tolerance: f64,
    /// Seed for centroid initialization
    pub seed: u64,
}

impl KmeansParams {
    pub fn new(k: usize, seed: u64) -> Self {
        Self {
            k,
            max_iterations: 300,
            tolerance: 1e-4,
            seed,
        }
    }
}

/// Result of a k-means fit
#[derive(Debug, Clone)]
pub struct KmeansFit {
    /// Cluster label per sample, in feature-row order
    pub labels: Vec<usize>,
    /// Final centroids, shape (k, d)
    pub centroids: Array2<f64>,
    /// Sum of squared distances of samples to their assigned centroid
    pub inertia: f64,
    /// Lloyd iterations executed
    pub iterations: usize,
}

/// Fit k-means on `features` (shape `(n, d)`).
pub fn fit(features: &Array2<f64>, params: &KmeansParams) -> Result<KmeansFit> {
    let (n, d) = features.dim();
    if params.k < 2 {
        return Err(ZoningError::ClusteringFailure(format!(
            "k-means requires k >= 2, got {}",
            params.k
        )));
    }
    if n < params.k {
        return Err(ZoningError::ClusteringFailure(format!(
            "{n} samples cannot form {} clusters",
            params.k
        )));
    }

    let mut rng = StdRng::seed_from_u64(params.seed);
    let mut centroids = plus_plus_init(features, params.k, &mut rng);
    let mut labels = vec![0usize; n];
    let mut iterations = 0usize;

    for iter in 0..params.max_iterations {
        iterations = iter + 1;
        assign(features, &centroids, &mut labels);

        let mut sums = Array2::<f64>::zeros((params.k, d));
        let mut counts = vec![0usize; params.k];
        for (i, &label) in labels.iter().enumerate() {
            counts[label] += 1;
            for j in 0..d {
                sums[[label, j]] += features[[i, j]];
            }
        }

        let mut new_centroids = centroids.clone();
        for c in 0..params.k {
            if counts[c] > 0 {
                for j in 0..d {
                    new_centroids[[c, j]] = sums[[c, j]] / counts[c] as f64;
                }
            }
        }

        // Reseed emptied clusters with the samples farthest from their
        // assigned centroid so the final fit keeps k non-empty clusters.
        let empty: Vec<usize> = (0..params.k).filter(|&c| counts[c] == 0).collect();
        for (c, row) in reseed_rows(features, &labels, &centroids, &empty) {
            for j in 0..d {
                new_centroids[[c, j]] = features[[row, j]];
            }
        }

        let mut max_shift: f64 = 0.0;
        for c in 0..params.k {
            let mut dist2 = 0.0;
            for j in 0..d {
                let diff = new_centroids[[c, j]] - centroids[[c, j]];
                dist2 += diff * diff;
            }
            max_shift = max_shift.max(dist2.sqrt());
        }

        centroids = new_centroids;

        if max_shift < params.tolerance && empty.is_empty() {
            break;
        }
    }

    // Final assignment against the final centroids.
    assign(features, &centroids, &mut labels);

    let mut inertia = 0.0;
    for (i, &label) in labels.iter().enumerate() {
        inertia += squared_distance(features, i, &centroids, label);
    }

    Ok(KmeansFit {
        labels,
        centroids,
        inertia,
        iterations,
    })
}

/// K-means++ initialization: first centroid uniform, the rest sampled
/// proportionally to squared distance from the nearest chosen centroid.
fn plus_plus_init(features: &Array2<f64>, k: usize, rng: &mut StdRng) -> Array2<f64> {
    let (n, d) = features.dim();
    let mut centroids = Array2::zeros((k, d));

    let first = rng.gen_range(0..n);
    for j in 0..d {
        centroids[[0, j]] = features[[first, j]];
    }

    let mut min_dist2 = vec![f64::INFINITY; n];

    for c in 1..k {
        for i in 0..n {
            let dist2 = squared_distance(features, i, &centroids, c - 1);
            if dist2 < min_dist2[i] {
                min_dist2[i] = dist2;
            }
        }

        let total: f64 = min_dist2.iter().sum();
        let chosen = if total > 0.0 {
            let mut target = rng.gen::<f64>() * total;
            let mut pick = n - 1;
            for (i, &w) in min_dist2.iter().enumerate() {
                target -= w;
                if target <= 0.0 {
                    pick = i;
                    break;
                }
            }
            pick
        } else {
            // All remaining points coincide with a centroid.
            rng.gen_range(0..n)
        };

        for j in 0..d {
            centroids[[c, j]] = features[[chosen, j]];
        }
    }

    centroids
}

/// Assign every sample to its nearest centroid (ties to the lower index).
fn assign(features: &Array2<f64>, centroids: &Array2<f64>, labels: &mut Vec<usize>) {
    let k = centroids.nrows();
    labels.par_iter_mut().enumerate().for_each(|(i, label)| {
        let mut best_dist = f64::INFINITY;
        let mut best_c = 0usize;
        for c in 0..k {
            let dist2 = squared_distance(features, i, centroids, c);
            if dist2 < best_dist {
                best_dist = dist2;
                best_c = c;
            }
        }
        *label = best_c;
    });
}

/// For each empty cluster, pick the not-yet-claimed sample farthest from its
/// assigned centroid to become the cluster's new seed.
fn reseed_rows(
    features: &Array2<f64>,
    labels: &[usize],
    centroids: &Array2<f64>,
    empty: &[usize],
) -> Vec<(usize, usize)> {
    let n = features.nrows();
    let mut claimed = vec![false; n];
    let mut seeds = Vec::with_capacity(empty.len());

    for &c in empty {
        let mut best_row = 0usize;
        let mut best_dist = -1.0;
        for i in 0..n {
            if claimed[i] {
                continue;
            }
            let dist2 = squared_distance(features, i, centroids, labels[i]);
            if dist2 > best_dist {
                best_dist = dist2;
                best_row = i;
            }
        }
        claimed[best_row] = true;
        seeds.push((c, best_row));
    }

    seeds
}

#[inline]
fn squared_distance(features: &Array2<f64>, row: usize, centroids: &Array2<f64>, c: usize) -> f64 {
    let d = features.ncols();
    let mut acc = 0.0;
    for j in 0..d {
        let diff = features[[row, j]] - centroids[[c, j]];
        acc += diff * diff;
    }
    acc
}
