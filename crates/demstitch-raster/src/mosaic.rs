//! Mosaic assembly: global extent and tile compositing.
//!
//! Tiles are placed on a shared [`PixelGrid`] (x grows east, y grows north).
//! The canvas stores that grid north-up: canvas row 0 is `max_y`, canvas
//! column 0 is `min_x`.

use crate::{Canvas, CanvasStats, PixelGrid, RasterError, Result, TileFrame};
use std::time::Instant;
use tracing::{debug, info};

/// Inclusive bounds of the pixel grid covered by a set of tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extent {
    /// Western-most grid column.
    pub min_x: i64,
    /// Southern-most grid row.
    pub min_y: i64,
    /// Eastern-most grid column.
    pub max_x: i64,
    /// Northern-most grid row.
    pub max_y: i64,
}

impl Extent {
    /// Canvas width in pixels, 0 if the bounds are inverted.
    pub fn width(&self) -> usize {
        span(self.min_x, self.max_x)
    }

    /// Canvas height in pixels, 0 if the bounds are inverted.
    pub fn height(&self) -> usize {
        span(self.min_y, self.max_y)
    }

    /// Fail unless the bounds are ordered and the canvas size fits in memory
    /// addressing.
    pub fn check(&self) -> Result<()> {
        let ordered = self.min_x <= self.max_x && self.min_y <= self.max_y;
        if !ordered || self.width().checked_mul(self.height()).is_none() {
            return Err(RasterError::InvalidExtent {
                min_x: self.min_x,
                min_y: self.min_y,
                max_x: self.max_x,
                max_y: self.max_y,
            });
        }
        Ok(())
    }
}

fn span(min: i64, max: i64) -> usize {
    let cells = i128::from(max) - i128::from(min) + 1;
    usize::try_from(cells.max(0)).unwrap_or(usize::MAX)
}

/// Half-open canvas window a tile is written into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementWindow {
    /// First canvas row (north edge).
    pub row: usize,
    /// First canvas column (west edge).
    pub col: usize,
    /// Number of columns.
    pub width: usize,
    /// Number of rows.
    pub height: usize,
}

/// Compute the grid extent containing every tile.
///
/// `min_x = min(gx)`, `max_x = max(gx + width - 1)`, and likewise for y, where
/// `(gx, gy)` is each tile's south-west grid corner.
pub fn compute_extent(tiles: &[TileFrame]) -> Result<Extent> {
    let grid = PixelGrid::of(tiles)?;

    let mut extent: Option<Extent> = None;
    for tile in tiles {
        let (gx, gy) = grid.cell_of(tile)?;
        let max_x = gx + tile.width() as i64 - 1;
        let max_y = gy + tile.height() as i64 - 1;

        extent = Some(match extent {
            None => Extent {
                min_x: gx,
                min_y: gy,
                max_x,
                max_y,
            },
            Some(e) => Extent {
                min_x: e.min_x.min(gx),
                min_y: e.min_y.min(gy),
                max_x: e.max_x.max(max_x),
                max_y: e.max_y.max(max_y),
            },
        });
    }

    extent.ok_or(RasterError::EmptyInput)
}

/// Compute where a tile lands on a canvas covering `extent` of `grid`.
pub fn placement_window(
    tile: &TileFrame,
    grid: &PixelGrid,
    extent: &Extent,
) -> Result<PlacementWindow> {
    let (gx, gy) = grid.cell_of(tile)?;
    let width = tile.width();
    let height = tile.height();

    let col = gx - extent.min_x;
    let row = extent.max_y - (gy + height as i64 - 1);

    let fits = col >= 0
        && row >= 0
        && col as usize + width as usize <= extent.width()
        && row as usize + height as usize <= extent.height();
    if !fits {
        return Err(RasterError::WindowOutOfBounds {
            col,
            row,
            width,
            height,
            canvas_width: extent.width(),
            canvas_height: extent.height(),
        });
    }

    Ok(PlacementWindow {
        row: row as usize,
        col: col as usize,
        width: width as usize,
        height: height as usize,
    })
}

/// Composite tiles into a fresh canvas covering `extent`.
///
/// `extent` is measured on the grid anchored at the first tile, as returned
/// by [`compute_extent`] for the same tiles. It is rejected with
/// [`RasterError::InvalidExtent`] before allocation if its bounds are
/// inverted or its area overflows.
///
/// Tiles are written in input order and each one overwrites its whole
/// window, so later tiles win wherever they overlap earlier ones. Tiles whose
/// rows grow northwards are mirrored vertically, tiles whose columns grow
/// westwards are mirrored horizontally.
pub fn assemble(tiles: &[TileFrame], extent: &Extent) -> Result<Canvas<f32>> {
    let grid = PixelGrid::of(tiles)?;
    extent.check()?;

    debug!(
        "Initializing canvas ({} x {})",
        extent.width(),
        extent.height()
    );
    let mut canvas = Canvas::missing(extent.width(), extent.height());

    for (k, tile) in tiles.iter().enumerate() {
        let window = placement_window(tile, &grid, extent)?;
        debug!(
            "Inserting tile {} of {} at row {}, col {}",
            k + 1,
            tiles.len(),
            window.row,
            window.col
        );
        composite(&mut canvas, tile, &window);
    }

    Ok(canvas)
}

fn composite(canvas: &mut Canvas<f32>, tile: &TileFrame, window: &PlacementWindow) {
    let flip_rows = tile.transform().rows_grow_north();
    let flip_cols = tile.transform().columns_grow_west();
    let samples = tile.samples();

    for r in 0..window.height {
        let src_row = if flip_rows { window.height - 1 - r } else { r };
        let src = samples.row(src_row);
        let dst = &mut canvas.row_mut(window.row + r)[window.col..window.col + window.width];

        if flip_cols {
            for (d, s) in dst.iter_mut().zip(src.iter().rev()) {
                *d = *s;
            }
        } else {
            dst.copy_from_slice(src);
        }
    }
}

/// Convenience wrapper computing the extent and assembling in one step.
#[derive(Debug)]
pub struct Mosaic;

impl Mosaic {
    /// Compute the extent of `tiles` and composite them.
    pub fn build(tiles: &[TileFrame]) -> Result<(Canvas<f32>, Extent)> {
        let extent = compute_extent(tiles)?;
        info!(
            "Extent: x {}..={} ({} px), y {}..={} ({} px)",
            extent.min_x,
            extent.max_x,
            extent.width(),
            extent.min_y,
            extent.max_y,
            extent.height()
        );

        let start = Instant::now();
        let canvas = assemble(tiles, &extent)?;
        let stats = CanvasStats::of(&canvas);
        info!(
            "Assembled {} tiles in {:.3}s: {} cells, {} present ({:.1} %)",
            tiles.len(),
            start.elapsed().as_secs_f64(),
            stats.total,
            stats.present,
            stats.coverage_percent()
        );

        Ok((canvas, extent))
    }
}
