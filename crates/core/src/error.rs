//! Error types for burnsev

use thiserror::Error;

/// Main error type for burnsev operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid raster dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Index out of bounds: ({row}, {col}) in raster of size ({rows}, {cols})")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Raster size mismatch: expected ({er}, {ec}), got ({ar}, {ac})")]
    SizeMismatch { er: usize, ec: usize, ar: usize, ac: usize },

    #[error("Band '{0}' not present in scene")]
    BandNotFound(&'static str),

    #[error("AOI polygon is empty or degenerate")]
    EmptyAoi,

    #[error("Aggregation needs {required} samples, over the {ceiling} ceiling (best-effort disabled)")]
    PixelBudgetExceeded { required: u64, ceiling: u64 },

    #[error("Unsupported data type: {0}")]
    UnsupportedDataType(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for burnsev operations
pub type Result<T> = std::result::Result<T, Error>;
