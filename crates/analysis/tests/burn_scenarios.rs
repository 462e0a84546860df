//! End-to-end assessment scenarios over synthetic scenes.
//!
//! A 40x40 grid of 30 m pixels (1.2 km on a side) with a ~1 km² square AOI
//! placed so that exactly 33x33 = 1089 pixel centers fall inside it.

use approx::assert_relative_eq;
use burnsev_analysis::prelude::*;
use geo_types::{Coord, LineString, Polygon};

const ROWS: usize = 40;
const COLS: usize = 40;
const CELL: f64 = 30.0;

fn band(value: f64) -> Raster<f64> {
    let mut r = Raster::filled(ROWS, COLS, value);
    r.set_transform(GeoTransform::new(0.0, ROWS as f64 * CELL, CELL, -CELL));
    r.set_crs(Some(Crs::from_epsg(32611)));
    r.set_nodata(Some(f64::NAN));
    r
}

/// SWIR2 reflectance that yields a target NBR for a given NIR reflectance
fn swir2_for_nbr(nir: f64, nbr: f64) -> f64 {
    nir * (1.0 - nbr) / (1.0 + nbr)
}

fn scene(green: f64, swir1: f64, nir: f64, target_nbr: f64) -> Scene {
    Scene::new()
        .with_band(Band::Red, band(0.1))
        .unwrap()
        .with_band(Band::Green, band(green))
        .unwrap()
        .with_band(Band::Nir, band(nir))
        .unwrap()
        .with_band(Band::Swir1, band(swir1))
        .unwrap()
        .with_band(Band::Swir2, band(swir2_for_nbr(nir, target_nbr)))
        .unwrap()
}

/// Square AOI from (30, 30) to (1030, 1030); pixel centers land on
/// 15 + 30k, so 33 columns (45..1005) and 33 rows fall strictly inside.
fn aoi() -> Polygon<f64> {
    Polygon::new(
        LineString::from(vec![
            Coord { x: 30.0, y: 30.0 },
            Coord { x: 1030.0, y: 30.0 },
            Coord { x: 1030.0, y: 1030.0 },
            Coord { x: 30.0, y: 1030.0 },
            Coord { x: 30.0, y: 30.0 },
        ]),
        vec![],
    )
}

#[test]
fn low_dnbr_everywhere_is_all_unburned() {
    // Water-free, dNBR = 0.05 everywhere
    let pre = scene(0.1, 0.4, 0.5, 0.30);
    let post = scene(0.1, 0.4, 0.5, 0.25);

    let result = assess_burn_severity(&pre, &post, &aoi(), &BurnAnalysisParams::default())
        .unwrap();

    assert_eq!(result.histogram.count(1), 1089);
    assert_eq!(result.histogram.total(), 1089);
    assert_eq!(result.histogram.valid_pixels(), 1089);
    assert_eq!(result.burned_area.area_km2, 0.0);
    assert_eq!(result.burned_area.valid_pixels, 1089);
}

#[test]
fn moderate_high_dnbr_everywhere_fills_the_aoi() {
    // dNBR = 0.50 everywhere -> Moderate-High
    let pre = scene(0.1, 0.4, 0.5, 0.60);
    let post = scene(0.1, 0.4, 0.5, 0.10);

    let result = assess_burn_severity(&pre, &post, &aoi(), &BurnAnalysisParams::default())
        .unwrap();

    assert_eq!(result.histogram.count(4), 1089);
    assert_eq!(result.histogram.total(), 1089);

    // 1089 pixels of 900 m2 each
    let expected_km2 = 1089.0 * 900.0 / 1e6;
    assert_relative_eq!(result.burned_area.area_km2, expected_km2, epsilon = 1e-9);
}

#[test]
fn water_pixels_contribute_to_no_statistic() {
    // Left 20 columns are water in the pre-event scene (high NDWI); every
    // pixel has dNBR = 0.50, but water must not show up anywhere.
    let mut pre = scene(0.1, 0.4, 0.5, 0.60);
    let mut post = scene(0.1, 0.4, 0.5, 0.10);

    let mut wet = |s: &mut Scene| {
        let mut green = s.band(Band::Green).unwrap().clone();
        let mut swir1 = s.band(Band::Swir1).unwrap().clone();
        for row in 0..ROWS {
            for col in 0..20 {
                green.set(row, col, 0.5).unwrap();
                swir1.set(row, col, 0.1).unwrap();
            }
        }
        s.insert(Band::Green, green).unwrap();
        s.insert(Band::Swir1, swir1).unwrap();
    };
    wet(&mut pre);
    wet(&mut post);

    let result = assess_burn_severity(&pre, &post, &aoi(), &BurnAnalysisParams::default())
        .unwrap();

    // AOI columns 1..=33; of those, 1..=19 are water, 20..=33 are land
    let land = 33 * 14;
    assert_eq!(result.histogram.count(4), land);
    assert_eq!(result.histogram.total(), land);
    assert_eq!(result.histogram.valid_pixels(), land);

    let expected_km2 = land as f64 * 900.0 / 1e6;
    assert_relative_eq!(result.burned_area.area_km2, expected_km2, epsilon = 1e-9);

    // Water pixels are invalid in the dNBR raster itself
    assert!(result.dnbr.get(10, 5).unwrap().is_nan());
    assert!(!result.dnbr.get(10, 25).unwrap().is_nan());
}

#[test]
fn best_effort_matches_exact_on_uniform_data() {
    let pre = scene(0.1, 0.4, 0.5, 0.60);
    let post = scene(0.1, 0.4, 0.5, 0.10);

    let exact = assess_burn_severity(&pre, &post, &aoi(), &BurnAnalysisParams::default())
        .unwrap();

    let coarse_params = BurnAnalysisParams {
        aggregation: AggregationParams {
            pixel_ceiling: 200,
            ..Default::default()
        },
        ..Default::default()
    };
    let coarse = assess_burn_severity(&pre, &post, &aoi(), &coarse_params).unwrap();

    assert!(coarse.burned_area.coarsening > 1);
    let rel = (coarse.burned_area.area_km2 - exact.burned_area.area_km2).abs()
        / exact.burned_area.area_km2;
    assert!(rel < 0.15, "relative error {}", rel);
}
