//! # demstitch-runner
//!
//! Configuration, file I/O and stage wiring behind the `demstitch` binary.
//!
//! ```no_run
//! use demstitch_runner::{assemble_paths, process, write_quantized, PipelineConfig};
//! use std::path::Path;
//!
//! let config = PipelineConfig::from_file("demstitch.yaml")?;
//! let paths = demstitch_dem::tile_paths_in("dem_data")?;
//! let (canvas, _extent) = assemble_paths(&paths, &config)?;
//! let processed = process(canvas, &config.pipeline)?;
//! write_quantized(&processed.canvas, processed.decimation, Path::new("map.png"), None)?;
//! # Ok::<(), demstitch_runner::RunnerError>(())
//! ```

pub mod config;
mod error;
pub mod io;
mod pipeline;

pub use config::{PipelineConfig, ProcessOptions};
pub use error::RunnerError;
pub use pipeline::{assemble_paths, assemble_with, log_stats, process, write_quantized, Processed};

/// Result type for runner operations.
pub type Result<T> = std::result::Result<T, RunnerError>;
