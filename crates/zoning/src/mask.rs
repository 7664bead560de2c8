//! Valid-pixel mask construction
//!
//! A pixel participates in zoning iff its center lies inside the field
//! polygon (boundary inclusive) and every spectral index holds a finite value
//! there. Pixel-center containment keeps the mask and the later
//! polygonization in agreement about which pixels belong to the field,
//! independent of how rough the polygon boundary is.

use crate::error::{Result, ZoningError};
use agrozone_core::{GeoTransform, IndexStack};
use geo::{BoundingRect, Intersects};
use geo_types::{Geometry, Point};
use ndarray::Array2;
use tracing::{debug, warn};

/// Rasterize the field polygon and AND it with all-indices-finite.
///
/// Fails with `NoValidPixels` when the intersection is empty.
pub fn build_valid_mask(
    field: &Geometry<f64>,
    transform: &GeoTransform,
    shape: (usize, usize),
    indices: &IndexStack,
) -> Result<Array2<bool>> {
    let (rows, cols) = shape;

    let polygon_mask = rasterize_field(field, transform, shape);
    let finite_mask = finite_data_mask(indices, shape);

    let mut mask = Array2::from_elem((rows, cols), false);
    let mut n_valid = 0usize;
    for r in 0..rows {
        for c in 0..cols {
            let v = polygon_mask[[r, c]] && finite_mask[[r, c]];
            mask[[r, c]] = v;
            n_valid += v as usize;
        }
    }

    let n_poly = polygon_mask.iter().filter(|&&v| v).count();
    let n_data = finite_mask.iter().filter(|&&v| v).count();
    debug!(
        inside_polygon = n_poly,
        with_data = n_data,
        valid = n_valid,
        "valid mask built"
    );

    if n_valid == 0 {
        return Err(ZoningError::NoValidPixels {
            inside_polygon: n_poly,
            with_data: n_data,
        });
    }
    if n_valid < n_poly {
        warn!(
            dropped = n_poly - n_valid,
            "pixels inside the field discarded for non-finite index values"
        );
    }

    Ok(mask)
}

/// Pixel-center containment mask for the field polygon, boundary inclusive.
fn rasterize_field(
    field: &Geometry<f64>,
    transform: &GeoTransform,
    (rows, cols): (usize, usize),
) -> Array2<bool> {
    let mut mask = Array2::from_elem((rows, cols), false);

    // Pixels whose center falls outside the field bbox can be skipped
    // without a full containment test.
    let bbox = field.bounding_rect();

    for r in 0..rows {
        for c in 0..cols {
            let (x, y) = transform.pixel_center(c, r);
            if let Some(rect) = &bbox {
                if x < rect.min().x || x > rect.max().x || y < rect.min().y || y > rect.max().y {
                    continue;
                }
            }
            let center = Point::new(x, y);
            let inside = match field {
                Geometry::Polygon(p) => p.intersects(&center),
                Geometry::MultiPolygon(mp) => mp.intersects(&center),
                other => other.intersects(&center),
            };
            mask[[r, c]] = inside;
        }
    }

    mask
}

/// True where every index array is finite.
fn finite_data_mask(indices: &IndexStack, (rows, cols): (usize, usize)) -> Array2<bool> {
    let mut mask = Array2::from_elem((rows, cols), true);
    for (name, array) in indices.iter() {
        let mut nan_count = 0usize;
        for r in 0..rows {
            for c in 0..cols {
                if !array[[r, c]].is_finite() {
                    mask[[r, c]] = false;
                    nan_count += 1;
                }
            }
        }
        if nan_count > 0 {
            warn!(index = name, nan_count, "non-finite values detected");
        }
    }
    mask
}
