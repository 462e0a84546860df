//! # burnsev-core
//!
//! Core types for the burnsev burn-severity mapping library.
//!
//! This crate provides:
//! - `Raster<T>`: Generic raster grid type
//! - `GeoTransform`: Affine transformation for georeferencing
//! - `Crs`: Coordinate Reference System handling
//! - `Scene`: Multi-band reflectance image with named band access
//! - Native GeoTIFF I/O (band-per-file, no GDAL)

pub mod crs;
pub mod error;
pub mod io;
pub mod raster;
pub mod scene;

pub use crs::Crs;
pub use error::{Error, Result};
pub use raster::{GeoTransform, Raster, RasterElement};
pub use scene::{Band, Scene};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::crs::Crs;
    pub use crate::error::{Error, Result};
    pub use crate::raster::{GeoTransform, Raster, RasterElement};
    pub use crate::scene::{Band, Scene};
}
