//! Water masking
//!
//! Derives a boolean water mask from an NDWI raster and applies masks to
//! rasters and whole scenes. Mask combination follows AND-validity: a pixel
//! survives masking only if it was valid before, the mask is valid there,
//! and the mask retains it.

use crate::indices::{check_dimensions, is_nodata_f64};
use burnsev_core::raster::Raster;
use burnsev_core::scene::Scene;
use burnsev_core::{Error, RasterElement, Result};
use ndarray::Array2;
use rayon::prelude::*;

/// NDWI threshold above which a pixel is considered open water
pub const WATER_NDWI_THRESHOLD: f64 = 0.3;

/// Nodata marker for mask rasters
pub const MASK_NODATA: u8 = 255;

/// Derive a water mask from an NDWI raster.
///
/// Mask is 1 where `ndwi > threshold`, 0 where the index is valid and at or
/// below it, and nodata where the index itself is invalid. An invalid index
/// pixel therefore never silently counts as land.
pub fn water_mask(ndwi: &Raster<f64>, threshold: f64) -> Result<Raster<u8>> {
    let (rows, cols) = ndwi.shape();
    let nodata = ndwi.nodata();

    let data: Vec<u8> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![MASK_NODATA; cols];
            for col in 0..cols {
                let v = unsafe { ndwi.get_unchecked(row, col) };
                if is_nodata_f64(v, nodata) {
                    continue;
                }
                row_data[col] = u8::from(v > threshold);
            }
            row_data
        })
        .collect();

    let mut output = ndwi.with_same_meta::<u8>(rows, cols);
    output.set_nodata(Some(MASK_NODATA));
    *output.data_mut() =
        Array2::from_shape_vec((rows, cols), data).map_err(|e| Error::Other(e.to_string()))?;
    Ok(output)
}

/// Apply a mask to a raster.
///
/// With `invert = false`, pixels where the mask is set are retained; with
/// `invert = true`, pixels where the mask is clear are retained. All other
/// pixels, and pixels where the mask itself is invalid, become NaN.
///
/// Removing water uses `invert = true` against the water mask: water pixels
/// (mask set) are dropped, land pixels survive.
///
/// Applying the same mask twice yields the same result as applying it once,
/// and the valid set never grows.
pub fn apply_mask(raster: &Raster<f64>, mask: &Raster<u8>, invert: bool) -> Result<Raster<f64>> {
    check_dimensions(raster, mask)?;

    let (rows, cols) = raster.shape();
    let nodata = raster.nodata();
    let mask_nodata = mask.nodata();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for col in 0..cols {
                let v = unsafe { raster.get_unchecked(row, col) };
                if is_nodata_f64(v, nodata) {
                    continue;
                }

                let m = unsafe { mask.get_unchecked(row, col) };
                if m.is_nodata(mask_nodata) {
                    continue;
                }

                let set = m != 0;
                if set != invert {
                    row_data[col] = v;
                }
            }
            row_data
        })
        .collect();

    crate::indices::build_output(raster, rows, cols, data)
}

/// Apply a mask to every band of a scene.
///
/// Used between the two pipeline phases: the water mask derived from the
/// unmasked NDWI is pushed down into the reflectance bands, so every index
/// recomputed afterwards is built strictly from masked inputs.
pub fn mask_scene(scene: &Scene, mask: &Raster<u8>, invert: bool) -> Result<Scene> {
    scene.map_bands(|band| apply_mask(band, mask, invert))
}
