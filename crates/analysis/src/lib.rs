//! # burnsev-analysis
//!
//! Raster analytics for wildfire burn-severity mapping.
//!
//! The pipeline is a strict downstream dataflow over immutable rasters:
//!
//! ```text
//! Scene (band access) -> indices -> mask -> change -> severity -> zonal
//! ```
//!
//! - **indices**: normalized-difference spectral indices (NDWI, NDVI, NBR)
//! - **mask**: water mask derivation and mask application
//! - **change**: pixel-wise index differencing (dNBR, dNDVI, dNDWI)
//! - **severity**: threshold classification of dNBR into five classes
//! - **zonal**: area and class-frequency aggregation over an AOI polygon
//! - **pipeline**: the two-phase end-to-end assessment

pub mod change;
pub mod indices;
pub mod mask;
pub mod pipeline;
pub mod severity;
pub mod zonal;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::change::{difference, dnbr, dndvi, dndwi};
    pub use crate::indices::{nbr, ndvi, ndwi, normalized_difference};
    pub use crate::mask::{apply_mask, mask_scene, water_mask, WATER_NDWI_THRESHOLD};
    pub use crate::pipeline::{assess_burn_severity, BurnAnalysisParams, BurnAssessment};
    pub use crate::severity::{
        classify, filter_significant, is_burned, is_significant, SeverityClass, DNBR_BREAKS,
    };
    pub use crate::zonal::{
        burned_area, frequency_histogram, sum_area, AggregationParams, AreaSummary,
        ClassHistogram,
    };
    pub use burnsev_core::prelude::*;
}
