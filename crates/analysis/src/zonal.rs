//! Zonal aggregation
//!
//! Area-weighted sums and per-class frequency counts of a class raster
//! restricted to an AOI polygon. Evaluation is sampled at a requested
//! ground resolution; when the sample count would exceed a pixel ceiling,
//! best-effort mode coarsens the sampling step deterministically instead
//! of failing.
//!
//! Counts and areas are associative reductions, so rows are accumulated in
//! parallel and merged.

use crate::severity::is_burned;
use burnsev_core::raster::{Raster, RasterElement};
use burnsev_core::{Error, Result};
use geo::algorithm::{Area, BoundingRect, Contains};
use geo_types::{Point, Polygon};
use rayon::prelude::*;
use std::collections::BTreeMap;

/// Default ceiling on the number of sampled pixels per aggregation call
pub const DEFAULT_PIXEL_CEILING: u64 = 10_000_000;

/// Meters per degree of latitude, and per degree of longitude at the
/// equator. Used for approximate pixel areas in geographic CRS.
const METERS_PER_DEG_LAT: f64 = 111_132.0;
const METERS_PER_DEG_LON: f64 = 111_320.0;

/// Aggregation configuration
#[derive(Debug, Clone, Copy)]
pub struct AggregationParams {
    /// Ground sample distance in meters per pixel edge
    pub scale: f64,
    /// Coarsen the sampling step instead of failing when over the ceiling
    pub best_effort: bool,
    /// Maximum number of samples evaluated per call
    pub pixel_ceiling: u64,
}

impl Default for AggregationParams {
    fn default() -> Self {
        Self {
            scale: 30.0,
            best_effort: true,
            pixel_ceiling: DEFAULT_PIXEL_CEILING,
        }
    }
}

/// Per-class frequency counts over an AOI.
///
/// Keys are present only for classes actually observed; the nodata class
/// never appears. An all-masked AOI yields an empty map with
/// `valid_pixels == 0`, which is distinguishable from a populated result
/// whose classes all happen to be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassHistogram {
    counts: BTreeMap<u8, u64>,
    valid_pixels: u64,
    coarsening: u64,
}

impl ClassHistogram {
    /// Counts per observed class, ordered by class code
    pub fn counts(&self) -> &BTreeMap<u8, u64> {
        &self.counts
    }

    /// Count for one class (0 when absent)
    pub fn count(&self, code: u8) -> u64 {
        self.counts.get(&code).copied().unwrap_or(0)
    }

    /// Total count over all observed classes
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Number of valid sampled pixels inside the AOI
    pub fn valid_pixels(&self) -> u64 {
        self.valid_pixels
    }

    /// Sampling step multiplier applied by best-effort coarsening (1 = none)
    pub fn coarsening(&self) -> u64 {
        self.coarsening
    }

    /// Whether the AOI contained no valid data at all
    pub fn is_all_masked(&self) -> bool {
        self.valid_pixels == 0
    }
}

/// Area-weighted sum over an AOI
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AreaSummary {
    /// Total area of matching pixels, in square kilometers
    pub area_km2: f64,
    /// Number of sampled pixels that matched the predicate
    pub matched_pixels: u64,
    /// Number of valid sampled pixels inside the AOI
    pub valid_pixels: u64,
    /// Sampling step multiplier applied by best-effort coarsening (1 = none)
    pub coarsening: u64,
}

impl AreaSummary {
    /// Whether the AOI contained no valid data at all
    pub fn is_all_masked(&self) -> bool {
        self.valid_pixels == 0
    }
}

/// The resolved sampling window: pixel bounds, step, and coarsening factor
#[derive(Debug, Clone, Copy)]
struct SamplePlan {
    row0: usize,
    row1: usize, // exclusive
    col0: usize,
    col1: usize, // exclusive
    step: usize,
    coarsening: u64,
}

impl SamplePlan {
    fn empty() -> Self {
        Self {
            row0: 0,
            row1: 0,
            col0: 0,
            col1: 0,
            step: 1,
            coarsening: 1,
        }
    }

    fn rows(&self) -> Vec<usize> {
        (self.row0..self.row1).step_by(self.step).collect()
    }

    fn cols(&self) -> impl Iterator<Item = usize> + '_ {
        (self.col0..self.col1).step_by(self.step)
    }
}

fn validate_aoi(aoi: &Polygon<f64>) -> Result<()> {
    if aoi.exterior().0.len() < 4 || aoi.unsigned_area() == 0.0 {
        return Err(Error::EmptyAoi);
    }
    Ok(())
}

fn is_geographic<T: RasterElement>(raster: &Raster<T>) -> bool {
    raster.crs().map(|c| c.is_geographic()).unwrap_or(false)
}

/// Native cell edge length in meters, approximated at the raster's
/// vertical midpoint for geographic CRS.
fn native_cell_meters<T: RasterElement>(raster: &Raster<T>) -> f64 {
    let (w, h) = raster.transform().cell_sizes();
    if is_geographic(raster) {
        let (_, min_y, _, max_y) = raster.bounds();
        let mid_lat = ((min_y + max_y) / 2.0).to_radians();
        let wx = w * METERS_PER_DEG_LON * mid_lat.cos();
        let hy = h * METERS_PER_DEG_LAT;
        ((wx * hy).abs()).sqrt()
    } else {
        ((w * h).abs()).sqrt()
    }
}

/// Area of one native pixel in square meters, at a given row
fn pixel_area_m2<T: RasterElement>(raster: &Raster<T>, row: usize) -> f64 {
    let (w, h) = raster.transform().cell_sizes();
    if is_geographic(raster) {
        let (_, y) = raster.pixel_to_geo(0, row);
        (w * METERS_PER_DEG_LON * y.to_radians().cos() * h * METERS_PER_DEG_LAT).abs()
    } else {
        (w * h).abs()
    }
}

/// Resolve the sampling window for an AOI over a raster.
///
/// Fails with [`Error::EmptyAoi`] for degenerate polygons and with
/// [`Error::PixelBudgetExceeded`] when the sample count is over the ceiling
/// and best-effort is off. Coarsening is a pure function of the window size
/// and the ceiling, so the same inputs always sample the same pixels.
fn plan_samples<T: RasterElement>(
    raster: &Raster<T>,
    aoi: &Polygon<f64>,
    params: &AggregationParams,
) -> Result<SamplePlan> {
    validate_aoi(aoi)?;

    let rect = aoi.bounding_rect().ok_or(Error::EmptyAoi)?;
    let (rmin_x, rmin_y, rmax_x, rmax_y) = raster.bounds();

    // AOI entirely outside the raster: nothing to sample
    if rect.max().x <= rmin_x
        || rect.min().x >= rmax_x
        || rect.max().y <= rmin_y
        || rect.min().y >= rmax_y
    {
        return Ok(SamplePlan::empty());
    }

    let (rows, cols) = raster.shape();

    // Window in pixel space, clamped to the grid
    let (c0, r0) = raster.geo_to_pixel(rect.min().x.max(rmin_x), rect.max().y.min(rmax_y));
    let (c1, r1) = raster.geo_to_pixel(rect.max().x.min(rmax_x), rect.min().y.max(rmin_y));

    let row0 = r0.floor().max(0.0) as usize;
    let row1 = (r1.ceil().max(0.0) as usize).min(rows);
    let col0 = c0.floor().max(0.0) as usize;
    let col1 = (c1.ceil().max(0.0) as usize).min(cols);

    if row0 >= row1 || col0 >= col1 {
        return Ok(SamplePlan::empty());
    }

    // Step that realizes the requested ground resolution
    let cell_m = native_cell_meters(raster);
    let base_step = if cell_m > 0.0 {
        ((params.scale / cell_m).round() as usize).max(1)
    } else {
        1
    };

    let win_rows = row1 - row0;
    let win_cols = col1 - col0;
    let candidates = (win_rows.div_ceil(base_step) as u64) * (win_cols.div_ceil(base_step) as u64);

    let mut coarsening = 1u64;
    if candidates > params.pixel_ceiling {
        if !params.best_effort {
            return Err(Error::PixelBudgetExceeded {
                required: candidates,
                ceiling: params.pixel_ceiling,
            });
        }
        coarsening = ((candidates as f64 / params.pixel_ceiling as f64).sqrt().ceil()) as u64;
    }

    Ok(SamplePlan {
        row0,
        row1,
        col0,
        col1,
        step: base_step * coarsening as usize,
        coarsening,
    })
}

/// Count pixels per class within an AOI.
///
/// Only valid (non-nodata) pixels whose centers fall inside the polygon are
/// counted; classes never observed are absent from the result rather than
/// reported as zero.
pub fn frequency_histogram(
    raster: &Raster<u8>,
    aoi: &Polygon<f64>,
    params: &AggregationParams,
) -> Result<ClassHistogram> {
    let plan = plan_samples(raster, aoi, params)?;
    let nodata = raster.nodata();

    let (counts, valid) = plan
        .rows()
        .into_par_iter()
        .map(|row| {
            let mut counts: BTreeMap<u8, u64> = BTreeMap::new();
            let mut valid = 0u64;
            for col in plan.cols() {
                let (x, y) = raster.pixel_to_geo(col, row);
                if !aoi.contains(&Point::new(x, y)) {
                    continue;
                }
                let v = unsafe { raster.get_unchecked(row, col) };
                if v.is_nodata(nodata) {
                    continue;
                }
                valid += 1;
                *counts.entry(v).or_insert(0) += 1;
            }
            (counts, valid)
        })
        .reduce(
            || (BTreeMap::new(), 0u64),
            |(mut acc, av), (part, pv)| {
                for (k, n) in part {
                    *acc.entry(k).or_insert(0) += n;
                }
                (acc, av + pv)
            },
        );

    Ok(ClassHistogram {
        counts,
        valid_pixels: valid,
        coarsening: plan.coarsening,
    })
}

/// Sum the area of pixels matching a predicate within an AOI.
///
/// Each sampled pixel contributes its ground area times the square of the
/// sampling step, so a coarsened run still estimates the full-window area.
pub fn sum_area<P>(
    raster: &Raster<u8>,
    predicate: P,
    aoi: &Polygon<f64>,
    params: &AggregationParams,
) -> Result<AreaSummary>
where
    P: Fn(u8) -> bool + Sync,
{
    let plan = plan_samples(raster, aoi, params)?;
    let nodata = raster.nodata();
    let weight = (plan.step * plan.step) as f64;

    let (area_m2, matched, valid) = plan
        .rows()
        .into_par_iter()
        .map(|row| {
            let cell_area = pixel_area_m2(raster, row) * weight;
            let mut area = 0.0f64;
            let mut matched = 0u64;
            let mut valid = 0u64;
            for col in plan.cols() {
                let (x, y) = raster.pixel_to_geo(col, row);
                if !aoi.contains(&Point::new(x, y)) {
                    continue;
                }
                let v = unsafe { raster.get_unchecked(row, col) };
                if v.is_nodata(nodata) {
                    continue;
                }
                valid += 1;
                if predicate(v) {
                    matched += 1;
                    area += cell_area;
                }
            }
            (area, matched, valid)
        })
        .reduce(
            || (0.0, 0, 0),
            |(aa, am, av), (pa, pm, pv)| (aa + pa, am + pm, av + pv),
        );

    Ok(AreaSummary {
        area_km2: area_m2 / 1e6,
        matched_pixels: matched,
        valid_pixels: valid,
        coarsening: plan.coarsening,
    })
}

/// Total burned area (any class above Unburned) within an AOI
pub fn burned_area(
    classes: &Raster<u8>,
    aoi: &Polygon<f64>,
    params: &AggregationParams,
) -> Result<AreaSummary> {
    sum_area(classes, is_burned, aoi, params)
}
