//! Coordinate Reference System handling

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coordinate Reference System representation.
///
/// Identified by EPSG code when known, with an optional WKT string for
/// systems without one. Only the geographic/projected distinction matters
/// to the analysis pipeline (per-pixel area needs a latitude correction in
/// geographic coordinates).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Crs {
    /// EPSG code if known
    epsg: Option<u32>,
    /// WKT representation if available
    wkt: Option<String>,
}

impl Crs {
    /// Create a CRS from an EPSG code
    pub fn from_epsg(code: u32) -> Self {
        Self {
            epsg: Some(code),
            wkt: None,
        }
    }

    /// Create a CRS from a WKT string
    pub fn from_wkt(wkt: impl Into<String>) -> Self {
        Self {
            epsg: None,
            wkt: Some(wkt.into()),
        }
    }

    /// WGS84 geographic CRS (EPSG:4326)
    pub fn wgs84() -> Self {
        Self::from_epsg(4326)
    }

    /// Get the EPSG code, if known
    pub fn epsg(&self) -> Option<u32> {
        self.epsg
    }

    /// Get the WKT string, if available
    pub fn wkt(&self) -> Option<&str> {
        self.wkt.as_deref()
    }

    /// Whether coordinates are degrees of longitude/latitude rather than
    /// projected meters.
    pub fn is_geographic(&self) -> bool {
        match self.epsg {
            // WGS84, NAD83, ETRS89 geographic codes
            Some(4326) | Some(4269) | Some(4258) => true,
            Some(_) => false,
            None => self
                .wkt
                .as_deref()
                .map(|w| w.trim_start().starts_with("GEOGCS"))
                .unwrap_or(false),
        }
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.epsg, self.wkt.as_deref()) {
            (Some(code), _) => write!(f, "EPSG:{}", code),
            (None, Some(wkt)) => write!(f, "{}", wkt),
            (None, None) => write!(f, "unknown CRS"),
        }
    }
}
