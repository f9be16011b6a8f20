//! # demstitch-dem
//!
//! Reads geo-referenced elevation tiles and turns them into validated
//! [`TileFrame`](demstitch_raster::TileFrame)s for mosaic assembly.
//!
//! ## Overview
//!
//! - [`TileSource`] abstracts where tiles come from. [`GeoTiffSource`] reads
//!   single-band GeoTIFF files with the `tiff` crate, taking georeferencing
//!   from the ModelTransformation or ModelTiepoint/ModelPixelScale tags, the
//!   projection from the GeoKey directory and the no-data sentinel from
//!   `GDAL_NODATA`.
//! - [`TileLoader`] applies [`LoadOptions`]: band count, projection, tile
//!   size, pixel pitch and empty-tile checks. In [`LoadMode::Strict`] the first
//!   bad tile aborts the load; in [`LoadMode::Lenient`] it is logged and
//!   skipped.
//!
//! Tiles can be read in parallel on the rayon thread pool. Results always come
//! back in input order, so overlapping tiles composite deterministically.
//!
//! ## Example
//!
//! ```no_run
//! use demstitch_dem::{tile_paths_in, LoadOptions, TileLoader};
//! use demstitch_raster::Mosaic;
//!
//! let paths = tile_paths_in("dem_data")?;
//! let tiles = TileLoader::geotiff(LoadOptions::default()).load_all(&paths)?;
//! let (canvas, extent) = Mosaic::build(&tiles)?;
//! println!("{}x{} mosaic at {:?}", canvas.width(), canvas.height(), extent);
//! # Ok::<(), demstitch_dem::DemError>(())
//! ```

mod error;
mod loader;
mod source;

pub use error::DemError;
pub use loader::{tile_paths_in, LoadMode, LoadOptions, NoDataPolicy, PitchPolicy, TileLoader};
pub use source::{epsg_from_geokeys, GeoTiffSource, SourceTile, TileSource};

/// Result type for DEM operations.
pub type Result<T> = std::result::Result<T, DemError>;
