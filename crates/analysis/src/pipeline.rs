//! End-to-end burn-severity assessment
//!
//! Two-phase orchestration of the pipeline stages:
//!
//! 1. **Mask phase**: compute NDWI from the pre-event scene and derive the
//!    water mask from it.
//! 2. **Analysis phase**: push the mask down into both scenes, then derive
//!    every severity-feeding index strictly from the masked bands.
//!
//! Keeping the phases separate means an unmasked index can never leak into
//! classification: after phase 1 only masked scenes exist.

use crate::change;
use crate::indices;
use crate::mask::{mask_scene, water_mask, WATER_NDWI_THRESHOLD};
use crate::severity::classify;
use crate::zonal::{burned_area, frequency_histogram, AggregationParams, AreaSummary, ClassHistogram};
use burnsev_core::raster::Raster;
use burnsev_core::scene::Scene;
use burnsev_core::Result;
use geo_types::Polygon;

/// Configuration for a full assessment run
#[derive(Debug, Clone, Copy)]
pub struct BurnAnalysisParams {
    /// NDWI threshold above which a pixel is treated as water
    pub water_threshold: f64,
    /// Zonal aggregation settings
    pub aggregation: AggregationParams,
}

impl Default for BurnAnalysisParams {
    fn default() -> Self {
        Self {
            water_threshold: WATER_NDWI_THRESHOLD,
            aggregation: AggregationParams::default(),
        }
    }
}

/// Outputs of a full assessment run
#[derive(Debug, Clone)]
pub struct BurnAssessment {
    /// Water-masked dNBR change raster
    pub dnbr: Raster<f64>,
    /// Five-class severity raster (nodata 0)
    pub severity: Raster<u8>,
    /// Per-class pixel counts over the AOI
    pub histogram: ClassHistogram,
    /// Burned area (class above Unburned) over the AOI
    pub burned_area: AreaSummary,
}

/// Run the full burn-severity pipeline over a pre/post scene pair.
///
/// Water pixels contribute to no downstream statistic: they are removed
/// from both scenes before dNBR is computed, so they are invalid in the
/// change raster, unlabeled in the class raster, and absent from the
/// histogram and area results.
pub fn assess_burn_severity(
    pre: &Scene,
    post: &Scene,
    aoi: &Polygon<f64>,
    params: &BurnAnalysisParams,
) -> Result<BurnAssessment> {
    // Phase 1: mask from the unmasked pre-event NDWI
    let ndwi = indices::ndwi(pre)?;
    let water = water_mask(&ndwi, params.water_threshold)?;

    // Phase 2: everything downstream sees only masked bands
    let pre_masked = mask_scene(pre, &water, true)?;
    let post_masked = mask_scene(post, &water, true)?;

    let dnbr = change::dnbr(&pre_masked, &post_masked)?;
    let severity = classify(&dnbr)?;

    let histogram = frequency_histogram(&severity, aoi, &params.aggregation)?;
    let burned = burned_area(&severity, aoi, &params.aggregation)?;

    Ok(BurnAssessment {
        dnbr,
        severity,
        histogram,
        burned_area: burned,
    })
}
