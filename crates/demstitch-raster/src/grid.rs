//! Shared integer pixel grid for a set of tiles.
//!
//! The grid is anchored on the south-west corner of the first tile. Every
//! other tile must sit a whole number of pixels away from that corner; the
//! absolute position of the anchor does not have to be a multiple of the
//! pitch, so pixel-is-point rasters and projected grids with odd offsets
//! line up as well as pitch-aligned ones.

use crate::{RasterError, Result, TileFrame};

/// Tolerance, in pixels, when checking that an edge lands on the grid.
const GRID_EPSILON: f64 = 1e-6;

/// Integer pixel grid with x growing east and y growing north.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelGrid {
    pitch: f64,
    anchor_x: f64,
    anchor_y: f64,
    anchor_col: i64,
    anchor_row: i64,
}

impl PixelGrid {
    /// Build the grid shared by `tiles`.
    ///
    /// Every tile must have square pixels and the first tile's pitch.
    pub fn of(tiles: &[TileFrame]) -> Result<Self> {
        let first = tiles.first().ok_or(RasterError::EmptyInput)?;
        let pitch = first.pitch();
        for tile in tiles {
            tile.transform().require_square_pixels()?;
            if tile.pitch() != pitch {
                return Err(RasterError::MixedPitch {
                    first: pitch,
                    other: tile.pitch(),
                });
            }
        }

        let (anchor_x, anchor_y) = first.south_west_corner();
        Ok(Self {
            pitch,
            anchor_x,
            anchor_y,
            anchor_col: anchor_index(anchor_x, pitch),
            anchor_row: anchor_index(anchor_y, pitch),
        })
    }

    /// Ground size of one grid cell.
    pub fn pitch(&self) -> f64 {
        self.pitch
    }

    /// Grid cell of a tile's south-west corner.
    pub fn cell_of(&self, tile: &TileFrame) -> Result<(i64, i64)> {
        let (x, y) = tile.south_west_corner();
        Ok((
            self.anchor_col + cells_between(self.anchor_x, x, self.pitch)?,
            self.anchor_row + cells_between(self.anchor_y, y, self.pitch)?,
        ))
    }

    /// Global coordinates of the south-west corner of grid cell `(col, row)`.
    pub fn cell_to_global(&self, col: i64, row: i64) -> (f64, f64) {
        (
            self.anchor_x + (col - self.anchor_col) as f64 * self.pitch,
            self.anchor_y + (row - self.anchor_row) as f64 * self.pitch,
        )
    }
}

/// Grid index given to the anchor edge. Pitch-aligned anchors keep their
/// natural index; others take the cell they fall in.
fn anchor_index(edge: f64, pitch: f64) -> i64 {
    let cells = edge / pitch;
    let rounded = cells.round();
    if (cells - rounded).abs() <= GRID_EPSILON {
        rounded as i64
    } else {
        cells.floor() as i64
    }
}

fn cells_between(anchor: f64, edge: f64, pitch: f64) -> Result<i64> {
    let cells = (edge - anchor) / pitch;
    let rounded = cells.round();
    if (cells - rounded).abs() > GRID_EPSILON {
        return Err(RasterError::MisalignedOrigin {
            value: edge,
            anchor,
            pitch,
        });
    }
    Ok(rounded as i64)
}
