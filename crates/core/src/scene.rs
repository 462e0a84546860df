//! Multi-band reflectance scene with named band access
//!
//! A [`Scene`] is the pipeline's view of one satellite acquisition: a set of
//! single-band reflectance rasters keyed by a closed [`Band`] name set, all
//! aligned pixel-for-pixel. Invalid pixels are NaN in the band rasters.

use crate::error::{Error, Result};
use crate::raster::Raster;
use std::collections::HashMap;
use std::fmt;

/// The closed set of reflectance bands a scene can expose.
///
/// Names follow the common shorthand for Landsat/Sentinel-class sensors:
/// `swir1` is the shorter short-wave infrared band (water discrimination),
/// `swir2` the longer one (burn signal).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Band {
    Red,
    Green,
    Nir,
    Swir1,
    Swir2,
}

impl Band {
    /// All bands, in canonical order
    pub const ALL: [Band; 5] = [Band::Red, Band::Green, Band::Nir, Band::Swir1, Band::Swir2];

    /// Lowercase band name
    pub fn name(self) -> &'static str {
        match self {
            Band::Red => "red",
            Band::Green => "green",
            Band::Nir => "nir",
            Band::Swir1 => "swir1",
            Band::Swir2 => "swir2",
        }
    }

    /// Parse a band name (case-insensitive)
    pub fn from_name(name: &str) -> Option<Band> {
        match name.to_ascii_lowercase().as_str() {
            "red" => Some(Band::Red),
            "green" => Some(Band::Green),
            "nir" => Some(Band::Nir),
            "swir1" => Some(Band::Swir1),
            "swir2" => Some(Band::Swir2),
            _ => None,
        }
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A multi-band reflectance image.
///
/// All bands share dimensions and georeferencing; this is enforced when a
/// band is inserted. Band lookup by name is the only access path the
/// analysis pipeline uses, so a missing band surfaces as
/// [`Error::BandNotFound`] at the first index computation.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    bands: HashMap<Band, Raster<f64>>,
}

impl Scene {
    /// Create an empty scene
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a band, checking alignment against bands already present
    pub fn insert(&mut self, band: Band, raster: Raster<f64>) -> Result<()> {
        if let Some(existing) = self.bands.values().next() {
            let (er, ec) = existing.shape();
            let (ar, ac) = raster.shape();
            if (er, ec) != (ar, ac) {
                return Err(Error::SizeMismatch { er, ec, ar, ac });
            }
        }
        self.bands.insert(band, raster);
        Ok(())
    }

    /// Builder-style insert
    pub fn with_band(mut self, band: Band, raster: Raster<f64>) -> Result<Self> {
        self.insert(band, raster)?;
        Ok(self)
    }

    /// Look up a band by name
    pub fn band(&self, band: Band) -> Result<&Raster<f64>> {
        self.bands.get(&band).ok_or(Error::BandNotFound(band.name()))
    }

    /// Whether a band is present
    pub fn contains(&self, band: Band) -> bool {
        self.bands.contains_key(&band)
    }

    /// Iterate over present bands
    pub fn bands(&self) -> impl Iterator<Item = (Band, &Raster<f64>)> {
        self.bands.iter().map(|(&b, r)| (b, r))
    }

    /// Number of bands present
    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    /// Dimensions shared by all bands, if any band is present
    pub fn shape(&self) -> Option<(usize, usize)> {
        self.bands.values().next().map(|r| r.shape())
    }

    /// Build a new scene by transforming every band.
    ///
    /// Used by the masking stage to derive a fully-masked scene so that
    /// downstream indices are recomputed from masked inputs only.
    pub fn map_bands<F>(&self, f: F) -> Result<Scene>
    where
        F: Fn(&Raster<f64>) -> Result<Raster<f64>>,
    {
        let mut out = Scene::new();
        for (band, raster) in self.bands() {
            out.insert(band, f(raster)?)?;
        }
        Ok(out)
    }
}
