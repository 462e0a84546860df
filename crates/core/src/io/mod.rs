//! I/O for reading and writing rasters and scenes
//!
//! Native GeoTIFF support through the `tiff` crate, band-per-file. This is
//! the seam toward the external raster-fetch service; the analysis pipeline
//! itself only ever sees in-memory rasters.

mod native;

pub use native::{read_geotiff, read_scene, write_geotiff};
