//! Raster-to-polygon conversion
//!
//! Dissolves the labeled pixels of the cluster assignment into one
//! (multi)polygon per label. Pixels are grouped into row runs first, so the
//! boolean union works over one rectangle per run instead of one per pixel;
//! the result is the same set-theoretic union either way.

use crate::error::{Result, ZoningError};
use agrozone_core::GeoTransform;
use geo::BooleanOps;
use geo_types::{LineString, MultiPolygon, Polygon};
use ndarray::Array2;
use std::collections::BTreeMap;
use tracing::debug;

/// Dissolved geometry for every label, ascending by label.
pub fn zone_polygons(
    assignment: &Array2<i32>,
    transform: &GeoTransform,
) -> Result<Vec<(i32, MultiPolygon<f64>)>> {
    let mut rects: BTreeMap<i32, Vec<Polygon<f64>>> = BTreeMap::new();

    let (rows, cols) = assignment.dim();
    for r in 0..rows {
        let mut c = 0usize;
        while c < cols {
            let label = assignment[[r, c]];
            if label < 0 {
                c += 1;
                continue;
            }
            let start = c;
            while c < cols && assignment[[r, c]] == label {
                c += 1;
            }
            rects
                .entry(label)
                .or_default()
                .push(run_rectangle(transform, r, start, c));
        }
    }

    if rects.is_empty() {
        return Err(ZoningError::NoZones);
    }

    let zones: Vec<(i32, MultiPolygon<f64>)> = rects
        .into_iter()
        .map(|(label, polys)| {
            let merged = polys.into_iter().fold(MultiPolygon(Vec::new()), |acc, poly| {
                acc.union(&poly)
            });
            (label, merged)
        })
        .collect();

    debug!(zones = zones.len(), "zone polygons dissolved");
    Ok(zones)
}

/// World-coordinate rectangle covering pixels `[col_start, col_end)` of `row`.
fn run_rectangle(
    transform: &GeoTransform,
    row: usize,
    col_start: usize,
    col_end: usize,
) -> Polygon<f64> {
    let (x0, y0) = transform.apply(col_start as f64, row as f64);
    let (x1, y1) = transform.apply(col_end as f64, row as f64);
    let (x2, y2) = transform.apply(col_end as f64, row as f64 + 1.0);
    let (x3, y3) = transform.apply(col_start as f64, row as f64 + 1.0);

    Polygon::new(
        LineString::from(vec![(x0, y0), (x1, y1), (x2, y2), (x3, y3), (x0, y0)]),
        vec![],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo::Area;
    use ndarray::array;

    fn unit_transform(rows: usize) -> GeoTransform {
        GeoTransform::new(0.0, rows as f64, 1.0, -1.0)
    }

    #[test]
    fn test_single_label_square() {
        let assignment = array![[0, 0], [0, 0]];
        let zones = zone_polygons(&assignment, &unit_transform(2)).unwrap();

        assert_eq!(zones.len(), 1);
        assert_eq!(zones[0].0, 0);
        assert_relative_eq!(zones[0].1.unsigned_area(), 4.0, epsilon = 1e-9);
    }

    #[test]
    fn test_two_stripes() {
        let assignment = array![[0, 0, 1, 1], [0, 0, 1, 1]];
        let zones = zone_polygons(&assignment, &unit_transform(2)).unwrap();

        assert_eq!(zones.len(), 2);
        assert_eq!(zones[0].0, 0);
        assert_eq!(zones[1].0, 1);
        assert_relative_eq!(zones[0].1.unsigned_area(), 4.0, epsilon = 1e-9);
        assert_relative_eq!(zones[1].1.unsigned_area(), 4.0, epsilon = 1e-9);
    }

    #[test]
    fn test_disjoint_parts_form_multipolygon() {
        // Label 0 occupies two opposite corners.
        let assignment = array![[0, -1], [-1, 0]];
        let zones = zone_polygons(&assignment, &unit_transform(2)).unwrap();

        assert_eq!(zones.len(), 1);
        assert_eq!(zones[0].1 .0.len(), 2, "two disjoint parts expected");
        assert_relative_eq!(zones[0].1.unsigned_area(), 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_adjacent_rows_merge() {
        // One label across two rows should dissolve into a single part.
        let assignment = array![[0, 0], [0, -1]];
        let zones = zone_polygons(&assignment, &unit_transform(2)).unwrap();

        assert_eq!(zones[0].1 .0.len(), 1);
        assert_relative_eq!(zones[0].1.unsigned_area(), 3.0, epsilon = 1e-9);
    }

    #[test]
    fn test_no_labels_fails() {
        let assignment = array![[-1, -1], [-1, -1]];
        let err = zone_polygons(&assignment, &unit_transform(2)).unwrap_err();
        assert!(matches!(err, ZoningError::NoZones));
    }

    #[test]
    fn test_labels_ascending() {
        let assignment = array![[2, 1], [0, 1]];
        let zones = zone_polygons(&assignment, &unit_transform(2)).unwrap();
        let labels: Vec<i32> = zones.iter().map(|(l, _)| *l).collect();
        assert_eq!(labels, vec![0, 1, 2]);
    }
}
