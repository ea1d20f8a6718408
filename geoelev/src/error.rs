//! Error types for the geoelev library.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading tiles or resolving elevations.
#[derive(Error, Debug)]
pub enum ElevationError {
    /// IO error when reading files.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The raster file could not be opened.
    #[error("Could not open raster {path}: {message}")]
    RasterOpen { path: PathBuf, message: String },

    /// The raster was opened but its contents could not be decoded.
    #[error("Could not load raster: {message}")]
    RasterLoad { message: String },

    /// File size doesn't match SRTM1 or SRTM3 format.
    #[error("Invalid file size: {size} bytes (expected 25934402 for SRTM1 or 2884802 for SRTM3)")]
    InvalidFileSize { size: usize },

    /// No raster reader is registered for this file type.
    #[error("Unsupported raster format: {path}")]
    UnsupportedFormat { path: PathBuf },

    /// The geotransform cannot be inverted.
    #[error("Degenerate geotransform (determinant {determinant})")]
    DegenerateTransform { determinant: f64 },

    /// The coordinate reference system has no known definition.
    #[error("Unsupported coordinate reference system: {crs}")]
    UnsupportedCrs { crs: String },

    /// Reprojection between two coordinate reference systems failed.
    #[error("Projection failed: {message}")]
    Projection { message: String },

    /// The computed pixel lies outside the tile grid.
    #[error("Pixel (row={row}, col={col}) outside {width}x{height} grid")]
    OutOfGrid {
        row: i64,
        col: i64,
        width: usize,
        height: usize,
    },

    /// No registered tile covers the coordinate.
    #[error("No tile covers lat={lat}, lon={lon}")]
    NoCoveringTile { lat: f64, lon: f64 },

    /// Invalid coordinate value.
    #[error("Invalid coordinate: {message}")]
    InvalidCoordinate { message: String },

    /// Invalid service configuration.
    #[error("Invalid configuration: {message}")]
    Config { message: String },
}

impl ElevationError {
    /// Returns `true` for errors raised while answering a query, as opposed
    /// to errors raised while loading tiles.
    pub fn is_query_error(&self) -> bool {
        matches!(
            self,
            ElevationError::Projection { .. }
                | ElevationError::OutOfGrid { .. }
                | ElevationError::NoCoveringTile { .. }
                | ElevationError::InvalidCoordinate { .. }
        )
    }
}

/// Result type alias using [`ElevationError`].
pub type Result<T> = std::result::Result<T, ElevationError>;
