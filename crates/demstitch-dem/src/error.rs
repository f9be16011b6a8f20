//! Error types for the DEM crate.

use demstitch_raster::{RasterError, ValidationError};
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when reading and loading DEM tiles.
#[derive(Debug, Error)]
pub enum DemError {
    /// I/O error reading a file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TIFF decoding error.
    #[error("TIFF decode error: {0}")]
    TiffDecode(#[from] tiff::TiffError),

    /// Invalid GeoTIFF - missing or inconsistent georeferencing tags.
    #[error("Invalid GeoTIFF: {0}")]
    InvalidGeoTiff(String),

    /// A tile was read but failed validation.
    #[error("Tile {path} rejected: {source}")]
    Rejected {
        /// Path of the rejected tile.
        path: PathBuf,
        /// Why it was rejected.
        source: ValidationError,
    },

    /// Raster pipeline error.
    #[error(transparent)]
    Raster(#[from] RasterError),
}

impl DemError {
    /// Create a rejection error for a tile.
    pub fn rejected(path: impl Into<PathBuf>, source: ValidationError) -> Self {
        DemError::Rejected {
            path: path.into(),
            source,
        }
    }

    /// Attach a path to a raster validation failure, leaving other errors as they are.
    pub fn with_path(self, path: &std::path::Path) -> Self {
        match self {
            DemError::Raster(RasterError::Validation(source)) => DemError::rejected(path, source),
            other => other,
        }
    }
}
