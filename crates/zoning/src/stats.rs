//! Per-zone spectral statistics
//!
//! Mean and population standard deviation of every index over the pixels
//! carrying the zone's original label, non-finite values ignored.

use crate::zones::Zone;
use agrozone_core::IndexStack;
use ndarray::Array2;

/// Spectral summary for one zone.
///
/// `mean_values` and `std_values` align with `IndexStack::names()`.
#[derive(Debug, Clone)]
pub struct ZoneStats {
    pub zone_id: usize,
    pub mean_values: Vec<f64>,
    pub std_values: Vec<f64>,
}

/// Compute per-index statistics for every zone.
///
/// A zone with no labeled pixels (which the size filter rules out) yields
/// NaN for both moments.
pub fn zone_statistics(
    zones: &[Zone],
    assignment: &Array2<i32>,
    indices: &IndexStack,
) -> Vec<ZoneStats> {
    let (rows, cols) = assignment.dim();

    zones
        .iter()
        .map(|zone| {
            let mut mean_values = Vec::with_capacity(indices.len());
            let mut std_values = Vec::with_capacity(indices.len());

            for (_, array) in indices.iter() {
                let mut sum = 0.0f64;
                let mut sum_sq = 0.0f64;
                let mut count = 0usize;
                for r in 0..rows {
                    for c in 0..cols {
                        if assignment[[r, c]] != zone.source_label {
                            continue;
                        }
                        let v = array[[r, c]];
                        if v.is_finite() {
                            sum += v;
                            sum_sq += v * v;
                            count += 1;
                        }
                    }
                }

                if count == 0 {
                    mean_values.push(f64::NAN);
                    std_values.push(f64::NAN);
                } else {
                    let mean = sum / count as f64;
                    let var = (sum_sq / count as f64 - mean * mean).max(0.0);
                    mean_values.push(mean);
                    std_values.push(var.sqrt());
                }
            }

            ZoneStats {
                zone_id: zone.zone_id,
                mean_values,
                std_values,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo_types::MultiPolygon;
    use ndarray::array;

    fn zone(zone_id: usize, label: i32) -> Zone {
        Zone {
            zone_id,
            source_label: label,
            geometry: MultiPolygon::new(vec![]),
            area_ha: 1.0,
            perimeter_m: 1.0,
            compactness: 1.0,
        }
    }

    #[test]
    fn test_mean_and_std_per_zone() {
        let assignment = array![[0, 0], [1, 1]];
        let mut stack = IndexStack::new();
        stack
            .insert("NDVI", array![[0.2, 0.4], [0.8, 0.8]])
            .unwrap();
        let zones = vec![zone(0, 0), zone(1, 1)];

        let stats = zone_statistics(&zones, &assignment, &stack);

        assert_eq!(stats.len(), 2);
        assert_relative_eq!(stats[0].mean_values[0], 0.3, epsilon = 1e-12);
        assert_relative_eq!(stats[0].std_values[0], 0.1, epsilon = 1e-12);
        assert_relative_eq!(stats[1].mean_values[0], 0.8, epsilon = 1e-12);
        assert_relative_eq!(stats[1].std_values[0], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_non_finite_ignored() {
        let assignment = array![[0, 0, 0]];
        let mut stack = IndexStack::new();
        stack.insert("NDVI", array![[0.5, f64::NAN, 0.7]]).unwrap();
        let zones = vec![zone(0, 0)];

        let stats = zone_statistics(&zones, &assignment, &stack);
        assert_relative_eq!(stats[0].mean_values[0], 0.6, epsilon = 1e-12);
    }

    #[test]
    fn test_empty_zone_yields_nan() {
        let assignment = array![[0, 0]];
        let mut stack = IndexStack::new();
        stack.insert("NDVI", array![[0.5, 0.7]]).unwrap();
        let zones = vec![zone(0, 9)];

        let stats = zone_statistics(&zones, &assignment, &stack);
        assert!(stats[0].mean_values[0].is_nan());
        assert!(stats[0].std_values[0].is_nan());
    }

    #[test]
    fn test_multiple_indices_keep_order() {
        let assignment = array![[0]];
        let mut stack = IndexStack::new();
        stack.insert("NDVI", array![[0.25]]).unwrap();
        stack.insert("NDRE", array![[0.75]]).unwrap();
        let zones = vec![zone(0, 0)];

        let stats = zone_statistics(&zones, &assignment, &stack);
        assert_eq!(stats[0].mean_values, vec![0.25, 0.75]);
    }
}
