//! Change detection
//!
//! Pixel-wise differencing of index rasters between a pre-event and a
//! post-event acquisition. The burn-severity signal is dNBR; dNDVI and
//! dNDWI are companion diagnostics computed the same way.

use crate::indices::{self, build_output, check_dimensions, is_nodata_f64};
use burnsev_core::raster::Raster;
use burnsev_core::scene::Scene;
use burnsev_core::Result;
use rayon::prelude::*;

/// Compute `pre - post`, pixel-wise.
///
/// A pixel invalid in either input is invalid in the output; valid pixels
/// never mix with invalid ones. Positive values mean the index dropped
/// after the event.
pub fn difference(pre: &Raster<f64>, post: &Raster<f64>) -> Result<Raster<f64>> {
    check_dimensions(pre, post)?;

    let (rows, cols) = pre.shape();
    let nodata_pre = pre.nodata();
    let nodata_post = post.nodata();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for col in 0..cols {
                let a = unsafe { pre.get_unchecked(row, col) };
                let b = unsafe { post.get_unchecked(row, col) };
                if is_nodata_f64(a, nodata_pre) || is_nodata_f64(b, nodata_post) {
                    continue;
                }
                row_data[col] = a - b;
            }
            row_data
        })
        .collect();

    build_output(pre, rows, cols, data)
}

/// Delta Normalized Burn Ratio: `NBR(pre) - NBR(post)`
pub fn dnbr(pre: &Scene, post: &Scene) -> Result<Raster<f64>> {
    difference(&indices::nbr(pre)?, &indices::nbr(post)?)
}

/// Delta NDVI: `NDVI(pre) - NDVI(post)`
pub fn dndvi(pre: &Scene, post: &Scene) -> Result<Raster<f64>> {
    difference(&indices::ndvi(pre)?, &indices::ndvi(post)?)
}

/// Delta NDWI: `NDWI(pre) - NDWI(post)`
pub fn dndwi(pre: &Scene, post: &Scene) -> Result<Raster<f64>> {
    difference(&indices::ndwi(pre)?, &indices::ndwi(post)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use burnsev_core::scene::Band;
    use burnsev_core::GeoTransform;

    fn make_band(rows: usize, cols: usize, value: f64) -> Raster<f64> {
        let mut r = Raster::filled(rows, cols, value);
        r.set_transform(GeoTransform::new(0.0, rows as f64, 1.0, -1.0));
        r
    }

    #[test]
    fn test_difference_basic() {
        let pre = make_band(4, 4, 0.7);
        let post = make_band(4, 4, 0.2);

        let diff = difference(&pre, &post).unwrap();
        assert!((diff.get(1, 1).unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_difference_nodata_propagates() {
        let mut pre = make_band(4, 4, 0.7);
        pre.set(0, 0, f64::NAN).unwrap();
        let mut post = make_band(4, 4, 0.2);
        post.set(3, 3, f64::NAN).unwrap();

        let diff = difference(&pre, &post).unwrap();
        assert!(diff.get(0, 0).unwrap().is_nan());
        assert!(diff.get(3, 3).unwrap().is_nan());
        assert!(!diff.get(1, 1).unwrap().is_nan());
    }

    #[test]
    fn test_difference_dimension_mismatch() {
        let pre = make_band(4, 4, 0.7);
        let post = make_band(4, 5, 0.2);
        assert!(difference(&pre, &post).is_err());
    }

    #[test]
    fn test_dnbr_positive_for_burn() {
        // Pre: healthy vegetation, high NBR. Post: burned, low NBR.
        let pre = Scene::new()
            .with_band(Band::Nir, make_band(3, 3, 0.5))
            .unwrap()
            .with_band(Band::Swir2, make_band(3, 3, 0.1))
            .unwrap();
        let post = Scene::new()
            .with_band(Band::Nir, make_band(3, 3, 0.15))
            .unwrap()
            .with_band(Band::Swir2, make_band(3, 3, 0.4))
            .unwrap();

        let delta = dnbr(&pre, &post).unwrap();
        let v = delta.get(1, 1).unwrap();

        // NBR(pre) = 0.4/0.6, NBR(post) = -0.25/0.55
        let expected = 0.4 / 0.6 - (-0.25 / 0.55);
        assert!((v - expected).abs() < 1e-12);
        assert!(v > 0.0);
    }

    #[test]
    fn test_dndvi_missing_band() {
        let pre = Scene::new()
            .with_band(Band::Nir, make_band(3, 3, 0.5))
            .unwrap();
        let post = pre.clone();

        assert!(dndvi(&pre, &post).is_err());
    }
}
