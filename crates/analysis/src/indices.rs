//! Spectral indices
//!
//! Normalized-difference indices computed from scene band pairs. All
//! functions are pure: they read bands through the scene accessor and
//! return a fresh single-band raster with NaN nodata.

use burnsev_core::raster::Raster;
use burnsev_core::scene::{Band, Scene};
use burnsev_core::{Error, Result};
use ndarray::Array2;
use rayon::prelude::*;

/// Compute the normalized difference between two bands:
///
/// `(band_a - band_b) / (band_a + band_b)`
///
/// Result is in the range [-1, 1]. A pixel is invalid (NaN) in the output
/// when either input is invalid or the denominator vanishes; it is never
/// reported as zero in that case.
pub fn normalized_difference(band_a: &Raster<f64>, band_b: &Raster<f64>) -> Result<Raster<f64>> {
    check_dimensions(band_a, band_b)?;

    let (rows, cols) = band_a.shape();
    let nodata_a = band_a.nodata();
    let nodata_b = band_b.nodata();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for col in 0..cols {
                let a = unsafe { band_a.get_unchecked(row, col) };
                let b = unsafe { band_b.get_unchecked(row, col) };

                if is_nodata_f64(a, nodata_a) || is_nodata_f64(b, nodata_b) {
                    continue;
                }

                let sum = a + b;
                if sum.abs() < 1e-10 {
                    continue; // Undefined, stays NaN
                }

                row_data[col] = (a - b) / sum;
            }
            row_data
        })
        .collect();

    build_output(band_a, rows, cols, data)
}

/// Normalized Difference Water Index
///
/// `NDWI = (Green - SWIR1) / (Green + SWIR1)`
///
/// Positive values indicate water bodies; values above ~0.3 are open water.
pub fn ndwi(scene: &Scene) -> Result<Raster<f64>> {
    normalized_difference(scene.band(Band::Green)?, scene.band(Band::Swir1)?)
}

/// Normalized Difference Vegetation Index
///
/// `NDVI = (NIR - Red) / (NIR + Red)`
pub fn ndvi(scene: &Scene) -> Result<Raster<f64>> {
    normalized_difference(scene.band(Band::Nir)?, scene.band(Band::Red)?)
}

/// Normalized Burn Ratio
///
/// `NBR = (NIR - SWIR2) / (NIR + SWIR2)`
///
/// Sensitive to fire-induced change in vegetation and soil; the pre/post
/// difference (dNBR) is the primary burn-severity signal.
pub fn nbr(scene: &Scene) -> Result<Raster<f64>> {
    normalized_difference(scene.band(Band::Nir)?, scene.band(Band::Swir2)?)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub(crate) fn is_nodata_f64(value: f64, nodata: Option<f64>) -> bool {
    if value.is_nan() {
        return true;
    }
    match nodata {
        Some(nd) => (value - nd).abs() < f64::EPSILON,
        None => false,
    }
}

pub(crate) fn check_dimensions<T, U>(a: &Raster<T>, b: &Raster<U>) -> Result<()>
where
    T: burnsev_core::RasterElement,
    U: burnsev_core::RasterElement,
{
    if a.shape() != b.shape() {
        return Err(Error::SizeMismatch {
            er: a.rows(),
            ec: a.cols(),
            ar: b.rows(),
            ac: b.cols(),
        });
    }
    Ok(())
}

pub(crate) fn build_output(
    template: &Raster<f64>,
    rows: usize,
    cols: usize,
    data: Vec<f64>,
) -> Result<Raster<f64>> {
    let mut output = template.with_same_meta::<f64>(rows, cols);
    output.set_nodata(Some(f64::NAN));
    *output.data_mut() =
        Array2::from_shape_vec((rows, cols), data).map_err(|e| Error::Other(e.to_string()))?;
    Ok(output)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use burnsev_core::GeoTransform;

    fn make_band(rows: usize, cols: usize, value: f64) -> Raster<f64> {
        let mut r = Raster::filled(rows, cols, value);
        r.set_transform(GeoTransform::new(0.0, rows as f64, 1.0, -1.0));
        r
    }

    fn make_scene(red: f64, green: f64, nir: f64, swir1: f64, swir2: f64) -> Scene {
        Scene::new()
            .with_band(Band::Red, make_band(5, 5, red))
            .unwrap()
            .with_band(Band::Green, make_band(5, 5, green))
            .unwrap()
            .with_band(Band::Nir, make_band(5, 5, nir))
            .unwrap()
            .with_band(Band::Swir1, make_band(5, 5, swir1))
            .unwrap()
            .with_band(Band::Swir2, make_band(5, 5, swir2))
            .unwrap()
    }

    #[test]
    fn test_normalized_difference_basic() {
        let a = make_band(5, 5, 0.8);
        let b = make_band(5, 5, 0.2);

        let result = normalized_difference(&a, &b).unwrap();
        let val = result.get(2, 2).unwrap();

        // (0.8 - 0.2) / (0.8 + 0.2) = 0.6
        assert!((val - 0.6).abs() < 1e-10, "Expected 0.6, got {}", val);
    }

    #[test]
    fn test_normalized_difference_range() {
        let mut a = make_band(10, 10, 0.0);
        let mut b = make_band(10, 10, 0.0);
        for row in 0..10 {
            for col in 0..10 {
                a.set(row, col, 0.1 + (row * 10 + col) as f64 * 0.005).unwrap();
                b.set(row, col, 0.6 - (row * 10 + col) as f64 * 0.004).unwrap();
            }
        }

        let result = normalized_difference(&a, &b).unwrap();

        for row in 0..10 {
            for col in 0..10 {
                let val = result.get(row, col).unwrap();
                if !val.is_nan() {
                    assert!(
                        (-1.0..=1.0).contains(&val),
                        "out of range: {} at ({}, {})",
                        val,
                        row,
                        col
                    );
                }
            }
        }
    }

    #[test]
    fn test_zero_denominator_is_invalid_not_zero() {
        let a = make_band(3, 3, 0.0);
        let b = make_band(3, 3, 0.0);

        let result = normalized_difference(&a, &b).unwrap();
        assert!(result.get(1, 1).unwrap().is_nan());
    }

    #[test]
    fn test_nodata_propagates() {
        let mut a = make_band(5, 5, 0.5);
        a.set(2, 2, f64::NAN).unwrap();
        let b = make_band(5, 5, 0.1);

        let result = normalized_difference(&a, &b).unwrap();
        assert!(result.get(2, 2).unwrap().is_nan());
        assert!(!result.get(0, 0).unwrap().is_nan());
    }

    #[test]
    fn test_dimension_mismatch() {
        let a = make_band(5, 5, 1.0);
        let b = make_band(5, 10, 1.0);

        assert!(normalized_difference(&a, &b).is_err());
    }

    #[test]
    fn test_named_indices_band_pairs() {
        let scene = make_scene(0.1, 0.2, 0.5, 0.3, 0.25);

        let ndwi_val = ndwi(&scene).unwrap().get(2, 2).unwrap();
        assert!((ndwi_val - (0.2 - 0.3) / (0.2 + 0.3)).abs() < 1e-10);

        let ndvi_val = ndvi(&scene).unwrap().get(2, 2).unwrap();
        assert!((ndvi_val - (0.5 - 0.1) / (0.5 + 0.1)).abs() < 1e-10);

        let nbr_val = nbr(&scene).unwrap().get(2, 2).unwrap();
        assert!((nbr_val - (0.5 - 0.25) / (0.5 + 0.25)).abs() < 1e-10);
    }

    #[test]
    fn test_missing_band_is_fatal() {
        let scene = Scene::new()
            .with_band(Band::Green, make_band(5, 5, 0.2))
            .unwrap();

        match ndwi(&scene) {
            Err(Error::BandNotFound(name)) => assert_eq!(name, "swir1"),
            other => panic!("expected BandNotFound, got {:?}", other.map(|_| ())),
        }
    }
}
