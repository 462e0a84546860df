//! Burn-severity classification
//!
//! Maps a dNBR raster to a five-class severity raster using fixed ascending
//! thresholds. Class codes start at 1 so that 0 can serve as the nodata
//! marker in the class raster.

use burnsev_core::raster::Raster;
use burnsev_core::{Error, Result};
use ndarray::Array2;
use rayon::prelude::*;
use std::fmt;

/// Upper bounds of the first four severity classes, ascending.
///
/// A dNBR value `v` belongs to the first class whose bound satisfies
/// `v <= bound`; anything above the last bound is High severity.
pub const DNBR_BREAKS: [f64; 4] = [0.10, 0.27, 0.44, 0.66];

/// Nodata marker in class rasters
pub const SEVERITY_NODATA: u8 = 0;

/// Severity class codes, ordered from no burn signal to the strongest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum SeverityClass {
    Unburned = 1,
    Low = 2,
    ModerateLow = 3,
    ModerateHigh = 4,
    High = 5,
}

impl SeverityClass {
    /// All classes, ascending
    pub const ALL: [SeverityClass; 5] = [
        SeverityClass::Unburned,
        SeverityClass::Low,
        SeverityClass::ModerateLow,
        SeverityClass::ModerateHigh,
        SeverityClass::High,
    ];

    /// Numeric class code as stored in the class raster
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Human-readable label
    pub fn label(self) -> &'static str {
        match self {
            SeverityClass::Unburned => "Unburned",
            SeverityClass::Low => "Low",
            SeverityClass::ModerateLow => "Moderate-Low",
            SeverityClass::ModerateHigh => "Moderate-High",
            SeverityClass::High => "High",
        }
    }

    /// Class for a raster code, if it is a valid class code
    pub fn from_code(code: u8) -> Option<SeverityClass> {
        match code {
            1 => Some(SeverityClass::Unburned),
            2 => Some(SeverityClass::Low),
            3 => Some(SeverityClass::ModerateLow),
            4 => Some(SeverityClass::ModerateHigh),
            5 => Some(SeverityClass::High),
            _ => None,
        }
    }

    /// Classify a single dNBR value
    pub fn from_dnbr(value: f64) -> SeverityClass {
        for (i, bound) in DNBR_BREAKS.iter().enumerate() {
            if value <= *bound {
                return SeverityClass::ALL[i];
            }
        }
        SeverityClass::High
    }
}

impl fmt::Display for SeverityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Whether a class code shows any burn signal (anything above Unburned)
pub fn is_burned(code: u8) -> bool {
    code > SeverityClass::Unburned.code() && code <= SeverityClass::High.code()
}

/// Whether a class code is Moderate-Low severity or worse
pub fn is_significant(code: u8) -> bool {
    code >= SeverityClass::ModerateLow.code() && code <= SeverityClass::High.code()
}

/// Classify a dNBR raster into the five severity classes.
///
/// Comparisons are exact IEEE `<=` against the break values: a pixel at
/// exactly 0.10 is Unburned, at exactly 0.27 Low, and so on. Invalid dNBR
/// pixels map to the class-raster nodata value.
pub fn classify(dnbr: &Raster<f64>) -> Result<Raster<u8>> {
    let (rows, cols) = dnbr.shape();
    let nodata = dnbr.nodata();

    let data: Vec<u8> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![SEVERITY_NODATA; cols];
            for col in 0..cols {
                let v = unsafe { dnbr.get_unchecked(row, col) };
                if crate::indices::is_nodata_f64(v, nodata) {
                    continue;
                }
                row_data[col] = SeverityClass::from_dnbr(v).code();
            }
            row_data
        })
        .collect();

    let mut output = dnbr.with_same_meta::<u8>(rows, cols);
    output.set_nodata(Some(SEVERITY_NODATA));
    *output.data_mut() =
        Array2::from_shape_vec((rows, cols), data).map_err(|e| Error::Other(e.to_string()))?;
    Ok(output)
}

/// Keep only Moderate-Low severity and above; everything else becomes
/// nodata. The surviving codes are unchanged, so per-class statistics on
/// the filtered raster match the unfiltered ones for those classes.
pub fn filter_significant(classes: &Raster<u8>) -> Result<Raster<u8>> {
    let (rows, cols) = classes.shape();

    let data: Vec<u8> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![SEVERITY_NODATA; cols];
            for col in 0..cols {
                let c = unsafe { classes.get_unchecked(row, col) };
                if is_significant(c) {
                    row_data[col] = c;
                }
            }
            row_data
        })
        .collect();

    let mut output = classes.with_same_meta::<u8>(rows, cols);
    output.set_nodata(Some(SEVERITY_NODATA));
    *output.data_mut() =
        Array2::from_shape_vec((rows, cols), data).map_err(|e| Error::Other(e.to_string()))?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use burnsev_core::GeoTransform;

    fn dnbr_raster(values: &[f64]) -> Raster<f64> {
        let mut r = Raster::filled(1, values.len(), 0.0);
        r.set_transform(GeoTransform::new(0.0, 1.0, 1.0, -1.0));
        r.set_nodata(Some(f64::NAN));
        for (col, &v) in values.iter().enumerate() {
            r.set(0, col, v).unwrap();
        }
        r
    }

    #[test]
    fn test_boundary_values_inclusive() {
        let dnbr = dnbr_raster(&[0.10, 0.27, 0.44, 0.66]);
        let classes = classify(&dnbr).unwrap();

        assert_eq!(classes.get(0, 0).unwrap(), 1);
        assert_eq!(classes.get(0, 1).unwrap(), 2);
        assert_eq!(classes.get(0, 2).unwrap(), 3);
        assert_eq!(classes.get(0, 3).unwrap(), 4);
    }

    #[test]
    fn test_interior_values() {
        let dnbr = dnbr_raster(&[-0.5, 0.11, 0.3, 0.5, 1.0]);
        let classes = classify(&dnbr).unwrap();

        assert_eq!(classes.get(0, 0).unwrap(), 1);
        assert_eq!(classes.get(0, 1).unwrap(), 2);
        assert_eq!(classes.get(0, 2).unwrap(), 3);
        assert_eq!(classes.get(0, 3).unwrap(), 4);
        assert_eq!(classes.get(0, 4).unwrap(), 5);
    }

    #[test]
    fn test_invalid_maps_to_nodata() {
        let dnbr = dnbr_raster(&[f64::NAN, 0.8]);
        let classes = classify(&dnbr).unwrap();

        assert_eq!(classes.get(0, 0).unwrap(), SEVERITY_NODATA);
        assert_eq!(classes.get(0, 1).unwrap(), 5);
    }

    #[test]
    fn test_class_metadata() {
        assert_eq!(SeverityClass::ModerateLow.code(), 3);
        assert_eq!(SeverityClass::High.label(), "High");
        assert_eq!(SeverityClass::from_code(4), Some(SeverityClass::ModerateHigh));
        assert_eq!(SeverityClass::from_code(0), None);
        assert_eq!(SeverityClass::from_code(6), None);
    }

    #[test]
    fn test_predicates() {
        assert!(!is_burned(SEVERITY_NODATA));
        assert!(!is_burned(1));
        assert!(is_burned(2));
        assert!(is_burned(5));

        assert!(!is_significant(2));
        assert!(is_significant(3));
        assert!(is_significant(5));
        assert!(!is_significant(SEVERITY_NODATA));
    }

    #[test]
    fn test_filter_significant() {
        let dnbr = dnbr_raster(&[0.05, 0.2, 0.3, 0.5, 0.8, f64::NAN]);
        let classes = classify(&dnbr).unwrap();
        let filtered = filter_significant(&classes).unwrap();

        assert_eq!(filtered.get(0, 0).unwrap(), SEVERITY_NODATA);
        assert_eq!(filtered.get(0, 1).unwrap(), SEVERITY_NODATA);
        assert_eq!(filtered.get(0, 2).unwrap(), 3);
        assert_eq!(filtered.get(0, 3).unwrap(), 4);
        assert_eq!(filtered.get(0, 4).unwrap(), 5);
        assert_eq!(filtered.get(0, 5).unwrap(), SEVERITY_NODATA);
    }
}
