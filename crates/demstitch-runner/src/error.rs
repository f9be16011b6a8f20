//! Error types for the runner.

use demstitch_dem::DemError;
use demstitch_raster::RasterError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while running the pipeline.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// I/O error on a named file.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// The file being read or written.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse config {path}: {source}")]
    Yaml {
        /// The configuration file.
        path: PathBuf,
        /// Underlying error.
        source: serde_yaml::Error,
    },

    /// Tile loading error.
    #[error(transparent)]
    Dem(#[from] DemError),

    /// Raster pipeline error.
    #[error(transparent)]
    Raster(#[from] RasterError),

    /// PNG encoding or decoding error.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Inconsistent configuration or arguments.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl RunnerError {
    /// Wrap an I/O error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RunnerError::Io {
            path: path.into(),
            source,
        }
    }
}
