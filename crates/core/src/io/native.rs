//! GeoTIFF access for collaborators
//!
//! The zoning pipeline itself performs no I/O. These helpers cover the two
//! raster surfaces the command line needs: reading a single-band spectral
//! index into a `Raster<f64>` and writing the cluster-label raster back out.
//! Georeferencing travels through the ModelPixelScale and ModelTiepoint
//! tags; rotated transforms and full GeoKey directories need a real GDAL
//! stack and are out of reach of this reader.

use crate::error::{Error, Result};
use crate::raster::{GeoTransform, Raster};
use std::fs::File;
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::colortype::Gray32Float;
use tiff::encoder::TiffEncoder;
use tiff::tags::Tag;

/// GeoTIFF ModelPixelScaleTag
const TAG_PIXEL_SCALE: Tag = Tag::ModelPixelScaleTag;
/// GeoTIFF ModelTiepointTag
const TAG_TIEPOINT: Tag = Tag::ModelTiepointTag;

/// Read a single-band GeoTIFF into an `f64` index raster.
///
/// Every integer or float sample format that widens losslessly to f64 is
/// accepted. Missing samples stay NaN, which the mask builder treats as
/// missing data.
pub fn read_index_raster<P: AsRef<Path>>(path: P) -> Result<Raster<f64>> {
    let file = File::open(path.as_ref())?;
    let mut decoder =
        Decoder::new(file).map_err(|e| Error::Other(format!("TIFF decode error: {e}")))?;

    let (width, height) = decoder
        .dimensions()
        .map_err(|e| Error::Other(format!("cannot read TIFF dimensions: {e}")))?;
    let (rows, cols) = (height as usize, width as usize);

    let image = decoder
        .read_image()
        .map_err(|e| Error::Other(format!("cannot read TIFF samples: {e}")))?;
    let samples = widen_samples(image)?;

    if samples.len() != rows * cols {
        return Err(Error::InvalidDimensions {
            width: cols,
            height: rows,
        });
    }

    let mut raster = Raster::from_vec(samples, rows, cols)?;
    raster.set_nodata(Some(f64::NAN));
    if let Some(transform) = read_geo_tags(&mut decoder) {
        raster.set_transform(transform);
    }
    Ok(raster)
}

/// Convert whatever sample type the band holds into f64.
fn widen_samples(image: DecodingResult) -> Result<Vec<f64>> {
    fn widen<T: Into<f64>>(buf: Vec<T>) -> Vec<f64> {
        buf.into_iter().map(Into::into).collect()
    }

    Ok(match image {
        DecodingResult::F64(buf) => buf,
        DecodingResult::F32(buf) => widen(buf),
        DecodingResult::U8(buf) => widen(buf),
        DecodingResult::U16(buf) => widen(buf),
        DecodingResult::U32(buf) => widen(buf),
        DecodingResult::I8(buf) => widen(buf),
        DecodingResult::I16(buf) => widen(buf),
        DecodingResult::I32(buf) => widen(buf),
        _ => {
            return Err(Error::UnsupportedDataType(
                "TIFF sample format has no lossless f64 widening".into(),
            ))
        }
    })
}

/// Recover the affine transform from the raster-to-model tags, if present.
///
/// A tiepoint pins pixel (I, J) onto world (X, Y); together with the pixel
/// scale that fixes a north-up transform.
fn read_geo_tags<R: std::io::Read + std::io::Seek>(
    decoder: &mut Decoder<R>,
) -> Option<GeoTransform> {
    let scale = decoder
        .get_tag_f64_vec(TAG_PIXEL_SCALE)
        .ok()?;
    let tiepoint = decoder.get_tag_f64_vec(TAG_TIEPOINT).ok()?;
    if scale.len() < 2 || tiepoint.len() < 6 {
        return None;
    }

    let (sx, sy) = (scale[0], scale[1]);
    let (i, j, x, y) = (tiepoint[0], tiepoint[1], tiepoint[3], tiepoint[4]);
    Some(GeoTransform::new(x - i * sx, y + j * sy, sx, -sy))
}

/// Write the cluster-label raster as a 32-bit float GeoTIFF.
///
/// Labels fit f32 exactly and −1 stays the outside-field marker, so GIS
/// viewers can style the output without a colormap sidecar.
pub fn write_label_raster<P: AsRef<Path>>(labels: &Raster<i32>, path: P) -> Result<()> {
    let file = File::create(path.as_ref())?;
    let mut encoder =
        TiffEncoder::new(file).map_err(|e| Error::Other(format!("TIFF encoder error: {e}")))?;

    let (rows, cols) = labels.shape();
    let samples: Vec<f32> = labels.data().iter().map(|&v| v as f32).collect();

    let mut image = encoder
        .new_image::<Gray32Float>(cols as u32, rows as u32)
        .map_err(|e| Error::Other(format!("cannot start TIFF image: {e}")))?;

    let gt = labels.transform();
    let scale = [gt.pixel_width, gt.pixel_height.abs(), 0.0];
    image
        .encoder()
        .write_tag(TAG_PIXEL_SCALE, &scale[..])
        .map_err(|e| Error::Other(format!("cannot write pixel scale tag: {e}")))?;
    let tiepoint = [0.0, 0.0, 0.0, gt.origin_x, gt.origin_y, 0.0];
    image
        .encoder()
        .write_tag(TAG_TIEPOINT, &tiepoint[..])
        .map_err(|e| Error::Other(format!("cannot write tiepoint tag: {e}")))?;

    image
        .write_data(&samples)
        .map_err(|e| Error::Other(format!("cannot write TIFF samples: {e}")))
}
