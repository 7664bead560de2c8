//! Cluster quality scores: silhouette, Calinski-Harabasz, inertia
//!
//! All scores use Euclidean distance in feature space. The silhouette is the
//! mean over samples; a sample alone in its cluster scores 0.

use crate::maybe_rayon::*;
use ndarray::Array2;

/// Mean silhouette coefficient over all samples.
///
/// For sample i with mean intra-cluster distance `a` and smallest mean
/// distance to another cluster `b`, the coefficient is `(b - a) / max(a, b)`.
pub fn silhouette_score(features: &Array2<f64>, labels: &[usize]) -> f64 {
    let n = features.nrows();
    if n == 0 {
        return 0.0;
    }
    let k = labels.iter().copied().max().map_or(0, |m| m + 1);
    let mut counts = vec![0usize; k];
    for &l in labels {
        counts[l] += 1;
    }

    let total: f64 = (0..n)
        .into_par_iter()
        .map(|i| {
            if counts[labels[i]] <= 1 {
                return 0.0;
            }

            // Sum of distances from i to every cluster.
            let mut sums = vec![0.0f64; k];
            for j in 0..n {
                if j == i {
                    continue;
                }
                sums[labels[j]] += distance(features, i, j);
            }

            let own = labels[i];
            let a = sums[own] / (counts[own] - 1) as f64;
            let mut b = f64::INFINITY;
            for c in 0..k {
                if c != own && counts[c] > 0 {
                    b = b.min(sums[c] / counts[c] as f64);
                }
            }

            let denom = a.max(b);
            if denom > 0.0 {
                (b - a) / denom
            } else {
                0.0
            }
        })
        .sum();

    total / n as f64
}

/// Calinski-Harabasz variance-ratio score.
///
/// Ratio of between-cluster to within-cluster dispersion, scaled by the
/// degrees of freedom. Returns 1.0 when the within-cluster dispersion is 0.
pub fn calinski_harabasz_score(features: &Array2<f64>, labels: &[usize]) -> f64 {
    let (n, d) = features.dim();
    let k = labels.iter().copied().max().map_or(0, |m| m + 1);
    if n == 0 || k < 2 {
        return 0.0;
    }

    let mut overall = vec![0.0f64; d];
    for i in 0..n {
        for j in 0..d {
            overall[j] += features[[i, j]];
        }
    }
    for v in &mut overall {
        *v /= n as f64;
    }

    let mut means = vec![vec![0.0f64; d]; k];
    let mut counts = vec![0usize; k];
    for i in 0..n {
        let l = labels[i];
        counts[l] += 1;
        for j in 0..d {
            means[l][j] += features[[i, j]];
        }
    }
    for c in 0..k {
        if counts[c] > 0 {
            for j in 0..d {
                means[c][j] /= counts[c] as f64;
            }
        }
    }

    let mut between = 0.0;
    for c in 0..k {
        if counts[c] == 0 {
            continue;
        }
        let mut dist2 = 0.0;
        for j in 0..d {
            let diff = means[c][j] - overall[j];
            dist2 += diff * diff;
        }
        between += counts[c] as f64 * dist2;
    }

    let mut within = 0.0;
    for i in 0..n {
        let l = labels[i];
        for j in 0..d {
            let diff = features[[i, j]] - means[l][j];
            within += diff * diff;
        }
    }

    if within == 0.0 {
        return 1.0;
    }

    between * (n - k) as f64 / (within * (k - 1) as f64)
}

#[inline]
fn distance(features: &Array2<f64>, a: usize, b: usize) -> f64 {
    let d = features.ncols();
    let mut acc = 0.0;
    for j in 0..d {
        let diff = features[[a, j]] - features[[b, j]];
        acc += diff * diff;
    }
    acc.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    fn separated() -> (Array2<f64>, Vec<usize>) {
        let features = array![[0.0], [0.1], [10.0], [10.1]];
        (features, vec![0, 0, 1, 1])
    }

    #[test]
    fn test_silhouette_well_separated() {
        let (features, labels) = separated();
        let s = silhouette_score(&features, &labels);
        assert!(s > 0.9, "expected near-perfect silhouette, got {s}");
    }

    #[test]
    fn test_silhouette_single_member_cluster_is_zero() {
        let features = array![[0.0], [10.0], [10.1]];
        let labels = vec![0, 1, 1];
        let s = silhouette_score(&features, &labels);
        // Sample 0 contributes 0; the others are near 1.
        assert!(s > 0.6 && s < 0.7, "got {s}");
    }

    #[test]
    fn test_silhouette_range() {
        let features = array![[0.0], [1.0], [2.0], [3.0]];
        let labels = vec![0, 1, 0, 1]; // deliberately interleaved
        let s = silhouette_score(&features, &labels);
        assert!((-1.0..=1.0).contains(&s));
        assert!(s < 0.5);
    }

    #[test]
    fn test_calinski_harabasz_separated_beats_interleaved() {
        let (features, good_labels) = separated();
        let bad_labels = vec![0, 1, 0, 1];
        let good = calinski_harabasz_score(&features, &good_labels);
        let bad = calinski_harabasz_score(&features, &bad_labels);
        assert!(good > bad);
        assert!(good > 0.0);
    }

    #[test]
    fn test_calinski_harabasz_zero_within() {
        let features = array![[0.0], [0.0], [5.0], [5.0]];
        let labels = vec![0, 0, 1, 1];
        assert_relative_eq!(calinski_harabasz_score(&features, &labels), 1.0);
    }
}
