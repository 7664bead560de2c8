//! Zone records, geometric attributes and the minimum-size filter
//!
//! Zones below `min_zone_size_ha` are dropped and the survivors get
//! consecutive ids in ascending original-label order. The cluster assignment
//! raster keeps its original labels; `source_label` on each zone is the
//! bridge between the two numbering schemes.

use crate::error::{Result, ZoningError};
use geo::{Area, Euclidean, Length};
use geo_types::MultiPolygon;
use tracing::info;

const M2_PER_HA: f64 = 10_000.0;

/// One management zone surviving the size filter.
#[derive(Debug, Clone)]
pub struct Zone {
    /// Consecutive id assigned after filtering (0-based)
    pub zone_id: usize,
    /// Label this zone carried in the cluster assignment raster
    pub source_label: i32,
    /// Dissolved zone geometry in world coordinates
    pub geometry: MultiPolygon<f64>,
    /// Area in hectares
    pub area_ha: f64,
    /// Total perimeter in world units (exterior and interior rings)
    pub perimeter_m: f64,
    /// Polsby-Popper compactness, 1 for a circle
    pub compactness: f64,
}

/// Attach geometric attributes, drop undersized zones, renumber survivors.
pub fn filter_zones(
    initial: Vec<(i32, MultiPolygon<f64>)>,
    min_zone_size_ha: f64,
) -> Result<Vec<Zone>> {
    let initial_count = initial.len();
    let mut zones = Vec::new();

    for (label, geometry) in initial {
        let area_m2 = geometry.unsigned_area();
        let area_ha = area_m2 / M2_PER_HA;
        let perimeter_m = perimeter(&geometry);
        let compactness = if perimeter_m > 0.0 {
            4.0 * std::f64::consts::PI * area_m2 / (perimeter_m * perimeter_m)
        } else {
            0.0
        };

        if area_ha < min_zone_size_ha {
            continue;
        }

        zones.push(Zone {
            zone_id: zones.len(),
            source_label: label,
            geometry,
            area_ha,
            perimeter_m,
            compactness,
        });
    }

    info!(
        before = initial_count,
        after = zones.len(),
        min_zone_size_ha,
        "zones filtered by minimum size"
    );

    if zones.is_empty() {
        return Err(ZoningError::AllZonesFiltered {
            dropped: initial_count,
            min_zone_size_ha,
        });
    }

    Ok(zones)
}

/// Total ring length of a multipolygon, interiors included.
fn perimeter(geometry: &MultiPolygon<f64>) -> f64 {
    geometry
        .0
        .iter()
        .map(|p| {
            let ext = p.exterior().length::<Euclidean>();
            let int: f64 = p.interiors().iter().map(|r| r.length::<Euclidean>()).sum();
            ext + int
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo_types::{polygon, Polygon};

    fn square(origin: f64, size: f64) -> Polygon<f64> {
        polygon![
            (x: origin, y: origin),
            (x: origin + size, y: origin),
            (x: origin + size, y: origin + size),
            (x: origin, y: origin + size),
        ]
    }

    #[test]
    fn test_attributes_of_square() {
        let initial = vec![(0, MultiPolygon::new(vec![square(0.0, 100.0)]))];
        let zones = filter_zones(initial, 0.0).unwrap();

        let zone = &zones[0];
        assert_eq!(zone.zone_id, 0);
        assert_eq!(zone.source_label, 0);
        assert_relative_eq!(zone.area_ha, 1.0, epsilon = 1e-9);
        assert_relative_eq!(zone.perimeter_m, 400.0, epsilon = 1e-9);
        // Polsby-Popper of a square: pi/4
        assert_relative_eq!(
            zone.compactness,
            std::f64::consts::PI / 4.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_small_zones_dropped_and_renumbered() {
        let initial = vec![
            (0, MultiPolygon::new(vec![square(0.0, 1.0)])), // 0.0001 ha
            (3, MultiPolygon::new(vec![square(10.0, 100.0)])), // 1 ha
            (7, MultiPolygon::new(vec![square(200.0, 100.0)])), // 1 ha
        ];
        let zones = filter_zones(initial, 0.5).unwrap();

        assert_eq!(zones.len(), 2);
        assert_eq!(zones[0].zone_id, 0);
        assert_eq!(zones[0].source_label, 3);
        assert_eq!(zones[1].zone_id, 1);
        assert_eq!(zones[1].source_label, 7);
    }

    #[test]
    fn test_all_filtered() {
        let initial = vec![(0, MultiPolygon::new(vec![square(0.0, 1.0)]))];
        let err = filter_zones(initial, 10.0).unwrap_err();
        assert!(matches!(
            err,
            ZoningError::AllZonesFiltered { dropped: 1, .. }
        ));
    }

    #[test]
    fn test_zero_threshold_keeps_all() {
        let initial = vec![
            (0, MultiPolygon::new(vec![square(0.0, 1.0)])),
            (1, MultiPolygon::new(vec![square(5.0, 1.0)])),
        ];
        let zones = filter_zones(initial, 0.0).unwrap();
        assert_eq!(zones.len(), 2);
    }
}
