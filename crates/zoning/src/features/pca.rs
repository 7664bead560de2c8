//! Principal component reduction of the standardized feature matrix
//!
//! Builds the covariance matrix, extracts eigenpairs via cyclic Jacobi
//! rotations, and projects onto the shortest component prefix whose
//! cumulative explained-variance ratio reaches the requested threshold.

use crate::error::{Result, ZoningError};
use ndarray::Array2;

/// Project `matrix` onto its leading principal components.
///
/// `variance_ratio` must lie in (0, 1]; the output keeps at least one
/// component and never more than the input dimensionality.
pub fn reduce(matrix: &Array2<f64>, variance_ratio: f64) -> Result<Array2<f64>> {
    let (n, d) = matrix.dim();
    if n < 2 {
        return Err(ZoningError::DegenerateFeature(
            "PCA requires at least 2 samples".into(),
        ));
    }

    let cov = covariance(matrix);
    let (eigenvalues, eigenvectors) = jacobi_eigen(&cov);

    // Order components by descending eigenvalue.
    let mut order: Vec<usize> = (0..d).collect();
    order.sort_by(|&a, &b| {
        eigenvalues[b]
            .partial_cmp(&eigenvalues[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let total: f64 = eigenvalues.iter().map(|&ev| ev.max(0.0)).sum();
    if total <= 0.0 {
        return Err(ZoningError::DegenerateFeature(
            "feature covariance has no positive variance".into(),
        ));
    }

    let mut keep = 0usize;
    let mut cumulative = 0.0;
    for &idx in &order {
        keep += 1;
        cumulative += eigenvalues[idx].max(0.0) / total;
        if cumulative >= variance_ratio {
            break;
        }
    }

    let mut projected = Array2::zeros((n, keep));
    for (out_j, &idx) in order.iter().take(keep).enumerate() {
        for i in 0..n {
            let mut acc = 0.0;
            for j in 0..d {
                acc += matrix[[i, j]] * eigenvectors[[j, idx]];
            }
            projected[[i, out_j]] = acc;
        }
    }

    Ok(projected)
}

/// Sample covariance of the (already centered) columns.
fn covariance(matrix: &Array2<f64>) -> Array2<f64> {
    let (n, d) = matrix.dim();
    let mut cov = Array2::zeros((d, d));

    for i in 0..d {
        for j in i..d {
            let mut acc = 0.0;
            for row in 0..n {
                acc += matrix[[row, i]] * matrix[[row, j]];
            }
            let v = acc / (n - 1) as f64;
            cov[[i, j]] = v;
            cov[[j, i]] = v;
        }
    }

    cov
}

/// Jacobi eigenvalue algorithm for symmetric matrices.
///
/// Returns `(eigenvalues, eigenvectors)` with eigenvectors as columns.
fn jacobi_eigen(matrix: &Array2<f64>) -> (Vec<f64>, Array2<f64>) {
    let d = matrix.nrows();
    let max_iter = 100 * d * d;
    let eps = 1e-12;

    let mut a = matrix.clone();
    let mut v: Array2<f64> = Array2::eye(d);

    for _ in 0..max_iter {
        // Largest off-diagonal element
        let mut max_val = 0.0;
        let mut p = 0;
        let mut q = 1.min(d.saturating_sub(1));
        for i in 0..d {
            for j in (i + 1)..d {
                if a[[i, j]].abs() > max_val {
                    max_val = a[[i, j]].abs();
                    p = i;
                    q = j;
                }
            }
        }

        if max_val < eps {
            break;
        }

        let theta = if (a[[p, p]] - a[[q, q]]).abs() < eps {
            std::f64::consts::FRAC_PI_4
        } else {
            0.5 * (2.0 * a[[p, q]] / (a[[p, p]] - a[[q, q]])).atan()
        };

        let cos_t = theta.cos();
        let sin_t = theta.sin();

        let mut new_a = a.clone();
        for i in 0..d {
            if i != p && i != q {
                new_a[[i, p]] = cos_t * a[[i, p]] + sin_t * a[[i, q]];
                new_a[[p, i]] = new_a[[i, p]];
                new_a[[i, q]] = -sin_t * a[[i, p]] + cos_t * a[[i, q]];
                new_a[[q, i]] = new_a[[i, q]];
            }
        }
        new_a[[p, p]] =
            cos_t * cos_t * a[[p, p]] + 2.0 * sin_t * cos_t * a[[p, q]] + sin_t * sin_t * a[[q, q]];
        new_a[[q, q]] =
            sin_t * sin_t * a[[p, p]] - 2.0 * sin_t * cos_t * a[[p, q]] + cos_t * cos_t * a[[q, q]];
        new_a[[p, q]] = 0.0;
        new_a[[q, p]] = 0.0;
        a = new_a;

        for i in 0..d {
            let vip = v[[i, p]];
            let viq = v[[i, q]];
            v[[i, p]] = cos_t * vip + sin_t * viq;
            v[[i, q]] = -sin_t * vip + cos_t * viq;
        }
    }

    let eigenvalues: Vec<f64> = (0..d).map(|i| a[[i, i]]).collect();
    (eigenvalues, v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_jacobi_diagonal() {
        let m = Array2::from_shape_vec((2, 2), vec![3.0, 0.0, 0.0, 1.0]).unwrap();
        let (evals, _) = jacobi_eigen(&m);
        let mut sorted = evals.clone();
        sorted.sort_by(|a, b| b.partial_cmp(a).unwrap());
        assert_relative_eq!(sorted[0], 3.0, epsilon = 1e-10);
        assert_relative_eq!(sorted[1], 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_jacobi_symmetric() {
        let m = Array2::from_shape_vec((2, 2), vec![2.0, 1.0, 1.0, 2.0]).unwrap();
        let (evals, _) = jacobi_eigen(&m);
        let mut sorted = evals.clone();
        sorted.sort_by(|a, b| b.partial_cmp(a).unwrap());
        assert_relative_eq!(sorted[0], 3.0, epsilon = 1e-10);
        assert_relative_eq!(sorted[1], 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_reduce_keeps_all_when_ratio_is_one() {
        // Two independent standardized-ish columns.
        let m = Array2::from_shape_vec(
            (4, 2),
            vec![-1.0, 1.0, 1.0, -1.0, -1.0, -1.0, 1.0, 1.0],
        )
        .unwrap();
        let out = reduce(&m, 1.0).unwrap();
        assert_eq!(out.dim(), (4, 2));
    }

    #[test]
    fn test_reduce_correlated_to_one_component() {
        let col: Vec<f64> = vec![-1.5, -0.5, 0.5, 1.5];
        let mut data = Vec::new();
        for &v in &col {
            data.push(v);
            data.push(2.0 * v);
        }
        let m = Array2::from_shape_vec((4, 2), data).unwrap();
        let out = reduce(&m, 0.95).unwrap();
        assert_eq!(out.ncols(), 1);
    }
}
