//! Spatially-dispersed sampling points within zones
//!
//! Farthest-point (spatial inhibition) selection: after a random seed pixel,
//! each pick maximizes the minimum world-coordinate distance to the points
//! already chosen, approximating even coverage of the zone. The per-zone RNG
//! is derived from `(seed, zone_id)`, so zones sample independently of each
//! other and of processing order.

use crate::error::{Result, ZoningError};
use crate::zones::Zone;
use agrozone_core::{GeoTransform, IndexStack};
use geo_types::Point;
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

/// One sampling point inside a zone.
#[derive(Debug, Clone)]
pub struct SamplePoint {
    /// Pixel-center world coordinates
    pub point: Point<f64>,
    /// Id of the owning zone (post-filter numbering)
    pub zone_id: usize,
    /// Index values at the hosting pixel, aligned with `IndexStack::names()`
    pub values: Vec<f64>,
}

/// Place sampling points in every zone.
///
/// Output is ordered by `zone_id` ascending, selection order within a zone.
pub fn sample_zones(
    zones: &[Zone],
    assignment: &Array2<i32>,
    indices: &IndexStack,
    transform: &GeoTransform,
    points_per_zone: usize,
    seed: u64,
) -> Result<Vec<SamplePoint>> {
    let mut samples = Vec::new();

    for zone in zones {
        let pixels = zone_pixels(assignment, zone.source_label);
        if pixels.is_empty() {
            continue;
        }

        let coords: Vec<(f64, f64)> = pixels
            .iter()
            .map(|&(r, c)| transform.pixel_center(c, r))
            .collect();

        let n_target = points_per_zone.max((pixels.len() as f64).sqrt().floor() as usize);

        let selected: Vec<usize> = if n_target >= pixels.len() {
            (0..pixels.len()).collect()
        } else {
            let mut rng = StdRng::seed_from_u64(zone_rng_seed(seed, zone.zone_id));
            farthest_point_selection(&coords, n_target, &mut rng)
        };

        for idx in selected {
            let (r, c) = pixels[idx];
            let (x, y) = coords[idx];
            let values = indices.iter().map(|(_, array)| array[[r, c]]).collect();
            samples.push(SamplePoint {
                point: Point::new(x, y),
                zone_id: zone.zone_id,
                values,
            });
        }
    }

    if samples.is_empty() {
        return Err(ZoningError::NoSamples);
    }

    info!(samples = samples.len(), zones = zones.len(), "sampling points placed");
    Ok(samples)
}

/// Pixels carrying `label`, in row-major scan order.
fn zone_pixels(assignment: &Array2<i32>, label: i32) -> Vec<(usize, usize)> {
    let (rows, cols) = assignment.dim();
    let mut pixels = Vec::new();
    for r in 0..rows {
        for c in 0..cols {
            if assignment[[r, c]] == label {
                pixels.push((r, c));
            }
        }
    }
    pixels
}

/// Greedy max-min selection of `n_target` candidates.
///
/// Ties on the maximal minimum distance resolve to the lower scan-order
/// index, which keeps the selection reproducible.
fn farthest_point_selection(
    coords: &[(f64, f64)],
    n_target: usize,
    rng: &mut StdRng,
) -> Vec<usize> {
    let n = coords.len();
    let mut selected = Vec::with_capacity(n_target);
    let mut min_dist = vec![f64::INFINITY; n];

    let first = rng.gen_range(0..n);
    selected.push(first);
    min_dist[first] = f64::NEG_INFINITY;

    while selected.len() < n_target {
        let &last = selected.last().expect("at least the seed is selected");
        let (lx, ly) = coords[last];

        let mut best = None;
        let mut best_dist = f64::NEG_INFINITY;
        for i in 0..n {
            if min_dist[i] == f64::NEG_INFINITY {
                continue;
            }
            let (x, y) = coords[i];
            let d = ((x - lx).powi(2) + (y - ly).powi(2)).sqrt();
            if d < min_dist[i] {
                min_dist[i] = d;
            }
            if min_dist[i] > best_dist {
                best_dist = min_dist[i];
                best = Some(i);
            }
        }

        match best {
            Some(i) => {
                selected.push(i);
                min_dist[i] = f64::NEG_INFINITY;
            }
            None => break,
        }
    }

    selected
}

/// Deterministic per-zone RNG seed derived from the run seed and zone id.
fn zone_rng_seed(seed: u64, zone_id: usize) -> u64 {
    seed ^ (zone_id as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}
