//! # demstitch-raster
//!
//! Mosaic assembly and the no-data aware numeric pipeline for elevation
//! rasters.
//!
//! ## Overview
//!
//! Independently geo-referenced tiles ([`TileFrame`]) are placed on a shared
//! integer pixel grid and composited into a single [`Canvas`]. The canvas is
//! then handed, by value, through a chain of stages that each produce a new
//! canvas:
//!
//! - [`trim`] drops all-missing borders
//! - [`decimate`] subsamples by an integer factor
//! - [`normalize`] shifts elevations to start at zero
//! - [`quantize`] maps elevations onto 8 bits with a validity mask
//! - [`encode_blob`] / [`decode_blob`] serialize canvases
//!
//! Missing samples are NaN throughout and no stage ever turns a missing
//! sample into a present one.
//!
//! ## Example
//!
//! ```
//! use demstitch_raster::{decimate, normalize, trim, GeoTransform, Mosaic, NoDataRule, TileFrame};
//!
//! let transform = GeoTransform::north_up(0.0, 2.0, 1.0)?;
//! let tile = TileFrame::new(transform, 2, 2, vec![10.0, 12.0, -9999.0, 14.0], NoDataRule::Sentinel(-9999.0))?;
//!
//! let (canvas, extent) = Mosaic::build(&[tile])?;
//! assert_eq!((extent.width(), extent.height()), (2, 2));
//!
//! let canvas = normalize(&decimate(&trim(&canvas), 1)?)?;
//! assert_eq!(canvas.get(0, 0), Some(0.0));
//! # Ok::<(), demstitch_raster::RasterError>(())
//! ```

mod blob;
mod canvas;
mod error;
mod frame;
mod grid;
mod mosaic;
mod normalize;
mod resample;
mod transform;
mod trim;

pub use blob::{decode_blob, encode_blob, BlobElement, DIM_FIELD_SIZE, HEADER_SIZE};
pub use canvas::{Canvas, CanvasStats};
pub use error::{RasterError, ValidationError};
pub use frame::{NoDataRule, RawTile, TileFrame, DEFAULT_NODATA_THRESHOLD};
pub use grid::PixelGrid;
pub use mosaic::{assemble, compute_extent, placement_window, Extent, Mosaic, PlacementWindow};
pub use normalize::{normalize, quantize, Quantized, MASK_MISSING, MASK_PRESENT, QUANT_MAX};
pub use resample::{decimate, factor_for_target};
pub use transform::GeoTransform;
pub use trim::{mask_outside, trim, TrimWindow};

/// Result type for raster operations.
pub type Result<T> = std::result::Result<T, RasterError>;
