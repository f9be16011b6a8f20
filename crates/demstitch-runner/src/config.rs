//! YAML pipeline configuration.
//!
//! Every field has a default, so an empty document is a valid configuration:
//!
//! ```yaml
//! load:
//!   mode: lenient
//!   expected_size: [1500, 1500]
//!   drop_empty: true
//!   expected_epsg: 26912
//!   pitch: unit
//!   nodata: { below: -1.0e30 }
//!   parallel: true
//! pipeline:
//!   trim: true
//!   window: [100, 2900, 0, 4499]
//!   target_dimension: 1024
//!   normalize: true
//! ```

use crate::{Result, RunnerError};
use demstitch_dem::LoadOptions;
use demstitch_raster::{factor_for_target, TrimWindow};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Post-assembly processing options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessOptions {
    /// Trim all-missing borders.
    pub trim: bool,
    /// Inclusive `[min_row, max_row, min_col, max_col]`; cells outside are
    /// masked as missing before trimming.
    pub window: Option<[usize; 4]>,
    /// Fixed decimation factor.
    pub decimation: Option<u32>,
    /// Pick the decimation factor that brings the smaller dimension down to
    /// about this many pixels.
    pub target_dimension: Option<usize>,
    /// Shift elevations so the minimum becomes zero.
    pub normalize: bool,
}

impl ProcessOptions {
    /// The window as a [`TrimWindow`], if set.
    pub fn trim_window(&self) -> Option<TrimWindow> {
        self.window.map(|[min_row, max_row, min_col, max_col]| TrimWindow {
            min_row,
            max_row,
            min_col,
            max_col,
        })
    }

    /// Decimation factor for a canvas of the given shape.
    pub fn decimation_for(&self, height: usize, width: usize) -> u32 {
        match (self.decimation, self.target_dimension) {
            (Some(factor), _) => factor,
            (None, Some(target)) => factor_for_target(height, width, target),
            (None, None) => 1,
        }
    }

    /// Check option consistency.
    pub fn validate(&self) -> Result<()> {
        if self.decimation.is_some() && self.target_dimension.is_some() {
            return Err(RunnerError::Config(
                "decimation and target_dimension are mutually exclusive".to_string(),
            ));
        }
        if self.decimation == Some(0) {
            return Err(RunnerError::Config("decimation must be at least 1".to_string()));
        }
        if let Some([min_row, max_row, min_col, max_col]) = self.window {
            if min_row > max_row || min_col > max_col {
                return Err(RunnerError::Config(format!(
                    "window [{}, {}, {}, {}] is inverted",
                    min_row, max_row, min_col, max_col
                )));
            }
        }
        Ok(())
    }
}

/// Complete pipeline configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Tile loading and validation.
    pub load: LoadOptions,
    /// Post-assembly processing.
    pub pipeline: ProcessOptions,
}

impl PipelineConfig {
    /// Parse a configuration from YAML text.
    pub fn from_yaml_str(text: &str) -> std::result::Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }

    /// Load and validate a configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| RunnerError::io(path, e))?;
        let config = Self::from_yaml_str(&text).map_err(|source| RunnerError::Yaml {
            path: path.to_path_buf(),
            source,
        })?;
        config.pipeline.validate()?;
        Ok(config)
    }
}
