//! Feature matrix preparation
//!
//! Flattens the masked pixels of the index stack into an `(N, D)` matrix in
//! row-major pixel scan order, imputes stray non-finite entries with column
//! medians, standardizes columns, and optionally reduces dimensionality with
//! PCA. The scan order established here is authoritative: clustering labels
//! are scattered back to pixels by the same scan.

pub mod pca;

use crate::error::{Result, ZoningError};
use agrozone_core::IndexStack;
use ndarray::Array2;
use tracing::{debug, warn};

/// Feature preparation options.
#[derive(Debug, Clone, Copy)]
pub struct FeatureParams {
    pub use_pca: bool,
    /// Cumulative explained-variance ratio to retain when PCA is enabled.
    pub pca_variance: f64,
}

impl Default for FeatureParams {
    fn default() -> Self {
        Self {
            use_pca: false,
            pca_variance: 0.95,
        }
    }
}

/// Build the standardized (and optionally PCA-reduced) feature matrix.
pub fn prepare_features(
    indices: &IndexStack,
    mask: &Array2<bool>,
    params: FeatureParams,
) -> Result<Array2<f64>> {
    let n = mask.iter().filter(|&&v| v).count();
    if n < 2 {
        return Err(ZoningError::DegenerateFeature(format!(
            "{n} valid pixels, at least 2 required"
        )));
    }

    let mut matrix = extract_masked(indices, mask, n);
    impute_columns(&mut matrix)?;
    standardize_columns(&mut matrix)?;

    if params.use_pca {
        let reduced = pca::reduce(&matrix, params.pca_variance)?;
        debug!(
            from = matrix.ncols(),
            to = reduced.ncols(),
            "PCA reduced feature dimensionality"
        );
        return Ok(reduced);
    }

    Ok(matrix)
}

/// Stack indices in insertion order and keep rows where the mask is true,
/// scanning row-major over the raster.
fn extract_masked(indices: &IndexStack, mask: &Array2<bool>, n: usize) -> Array2<f64> {
    let (rows, cols) = mask.dim();
    let d = indices.len();
    let mut matrix = Array2::zeros((n, d));

    for (j, (_, array)) in indices.iter().enumerate() {
        let mut i = 0usize;
        for r in 0..rows {
            for c in 0..cols {
                if mask[[r, c]] {
                    matrix[[i, j]] = array[[r, c]];
                    i += 1;
                }
            }
        }
    }

    matrix
}

/// Replace non-finite entries with the column median of the finite entries.
fn impute_columns(matrix: &mut Array2<f64>) -> Result<()> {
    let (n, d) = matrix.dim();

    for j in 0..d {
        let mut finite: Vec<f64> = (0..n)
            .map(|i| matrix[[i, j]])
            .filter(|v| v.is_finite())
            .collect();

        if finite.len() == n {
            continue;
        }
        if finite.is_empty() {
            return Err(ZoningError::DegenerateFeature(format!(
                "feature column {j} has no finite values"
            )));
        }

        finite.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let mid = finite.len() / 2;
        let median = if finite.len() % 2 == 0 {
            (finite[mid - 1] + finite[mid]) / 2.0
        } else {
            finite[mid]
        };

        let mut imputed = 0usize;
        for i in 0..n {
            if !matrix[[i, j]].is_finite() {
                matrix[[i, j]] = median;
                imputed += 1;
            }
        }
        warn!(column = j, imputed, median, "imputed non-finite feature values");
    }

    Ok(())
}

/// Center each column on its mean and scale by the sample standard deviation.
///
/// Zero-variance columns are set to exactly zero and retained so column
/// positions keep matching index positions.
fn standardize_columns(matrix: &mut Array2<f64>) -> Result<()> {
    let (n, d) = matrix.dim();
    let mut zero_variance = 0usize;

    for j in 0..d {
        let mean = (0..n).map(|i| matrix[[i, j]]).sum::<f64>() / n as f64;
        let var = (0..n)
            .map(|i| {
                let dev = matrix[[i, j]] - mean;
                dev * dev
            })
            .sum::<f64>()
            / (n - 1) as f64;
        let std = var.sqrt();

        if std > 0.0 && std.is_finite() {
            for i in 0..n {
                matrix[[i, j]] = (matrix[[i, j]] - mean) / std;
            }
        } else {
            for i in 0..n {
                matrix[[i, j]] = 0.0;
            }
            zero_variance += 1;
            warn!(column = j, "zero-variance feature column zeroed");
        }
    }

    if zero_variance == d {
        return Err(ZoningError::DegenerateFeature(
            "every feature column has zero variance".into(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    fn two_index_stack() -> IndexStack {
        let mut stack = IndexStack::new();
        stack
            .insert("NDVI", array![[0.1, 0.2], [0.3, 0.4]])
            .unwrap();
        stack
            .insert("NDRE", array![[-0.1, -0.2], [-0.3, -0.4]])
            .unwrap();
        stack
    }

    #[test]
    fn test_scan_order_and_standardization() {
        let stack = two_index_stack();
        let mask = array![[true, true], [true, true]];

        let features = prepare_features(&stack, &mask, FeatureParams::default()).unwrap();
        assert_eq!(features.dim(), (4, 2));

        // Columns are standardized: zero mean, unit sample variance.
        for j in 0..2 {
            let mean = (0..4).map(|i| features[[i, j]]).sum::<f64>() / 4.0;
            let var = (0..4)
                .map(|i| (features[[i, j]] - mean).powi(2))
                .sum::<f64>()
                / 3.0;
            assert_relative_eq!(mean, 0.0, epsilon = 1e-12);
            assert_relative_eq!(var, 1.0, epsilon = 1e-12);
        }

        // NDVI ascends in scan order, so the standardized column must too.
        assert!(features[[0, 0]] < features[[1, 0]]);
        assert!(features[[2, 0]] < features[[3, 0]]);
    }

    #[test]
    fn test_mask_restricts_rows() {
        let stack = two_index_stack();
        let mask = array![[true, false], [false, true]];

        let features = prepare_features(&stack, &mask, FeatureParams::default()).unwrap();
        assert_eq!(features.nrows(), 2);
    }

    #[test]
    fn test_single_pixel_degenerate() {
        let stack = two_index_stack();
        let mask = array![[true, false], [false, false]];

        let err = prepare_features(&stack, &mask, FeatureParams::default()).unwrap_err();
        assert!(matches!(err, ZoningError::DegenerateFeature(_)));
    }

    #[test]
    fn test_constant_column_zeroed() {
        let mut stack = IndexStack::new();
        stack
            .insert("NDVI", array![[0.5, 0.5], [0.5, 0.5]])
            .unwrap();
        stack
            .insert("NDRE", array![[0.1, 0.2], [0.3, 0.4]])
            .unwrap();
        let mask = array![[true, true], [true, true]];

        let features = prepare_features(&stack, &mask, FeatureParams::default()).unwrap();
        for i in 0..4 {
            assert_eq!(features[[i, 0]], 0.0);
        }
        assert!(features[[3, 1]] > 0.0);
    }

    #[test]
    fn test_all_constant_degenerate() {
        let mut stack = IndexStack::new();
        stack.insert("NDVI", array![[1.0, 1.0], [1.0, 1.0]]).unwrap();
        let mask = array![[true, true], [true, true]];

        let err = prepare_features(&stack, &mask, FeatureParams::default()).unwrap_err();
        assert!(matches!(err, ZoningError::DegenerateFeature(_)));
    }

    #[test]
    fn test_pca_reduces_correlated_columns() {
        // Ten pixels, three perfectly correlated indices: one component
        // carries all the variance.
        let base: Vec<f64> = (0..10).map(|v| v as f64 / 10.0).collect();
        let a = Array2::from_shape_vec((2, 5), base.clone()).unwrap();
        let b = a.mapv(|v| 2.0 * v + 1.0);
        let c = a.mapv(|v| -v);

        let mut stack = IndexStack::new();
        stack.insert("NDVI", a).unwrap();
        stack.insert("NDRE", b).unwrap();
        stack.insert("NDWI", c).unwrap();
        let mask = Array2::from_elem((2, 5), true);

        let params = FeatureParams {
            use_pca: true,
            pca_variance: 0.95,
        };
        let features = prepare_features(&stack, &mask, params).unwrap();
        assert_eq!(features.nrows(), 10);
        assert_eq!(features.ncols(), 1);
    }
}
