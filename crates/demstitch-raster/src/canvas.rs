//! Row-major 2-D sample grid shared by every pipeline stage.

use crate::{RasterError, Result};

/// A 2-D raster in row-major order.
///
/// Row 0 is the northern-most row and column 0 the western-most column.
/// Elevation canvases use `f32` with NaN as the "missing" marker; quantized
/// images and masks use `u8`.
#[derive(Debug, Clone, PartialEq)]
pub struct Canvas<T> {
    data: Vec<T>,
    width: usize,
    height: usize,
}

impl<T: Copy> Canvas<T> {
    /// Create a canvas with every cell set to `value`.
    pub fn filled(width: usize, height: usize, value: T) -> Self {
        Self {
            data: vec![value; width * height],
            width,
            height,
        }
    }

    /// Wrap a row-major buffer, checking its length.
    pub fn from_vec(width: usize, height: usize, data: Vec<T>) -> Result<Self> {
        if data.len() != width * height {
            return Err(RasterError::ShapeMismatch {
                width,
                height,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Build a canvas from nested rows. All rows must have the same length.
    pub fn from_rows(rows: &[Vec<T>]) -> Result<Self> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|r| r.len() != width) {
            return Err(RasterError::ShapeMismatch {
                width,
                height,
                actual: rows.iter().map(Vec::len).sum(),
            });
        }
        let data: Vec<T> = rows.iter().flat_map(|r| r.iter().copied()).collect();
        Self::from_vec(width, height, data)
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.height
    }

    /// `(dim0, dim1)` = `(rows, columns)`, the order used by the blob header.
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    /// Total number of cells.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the canvas has no cells.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Sample at `(row, col)`, if in range.
    pub fn get(&self, row: usize, col: usize) -> Option<T> {
        if row < self.height && col < self.width {
            Some(self.data[row * self.width + col])
        } else {
            None
        }
    }

    /// Overwrite the sample at `(row, col)`. Out-of-range writes are ignored.
    pub fn set(&mut self, row: usize, col: usize, value: T) {
        if row < self.height && col < self.width {
            self.data[row * self.width + col] = value;
        }
    }

    /// One row as a slice.
    pub fn row(&self, row: usize) -> &[T] {
        &self.data[row * self.width..(row + 1) * self.width]
    }

    /// One row as a mutable slice.
    pub fn row_mut(&mut self, row: usize) -> &mut [T] {
        &mut self.data[row * self.width..(row + 1) * self.width]
    }

    /// Iterate over rows, north to south.
    pub fn rows(&self) -> impl Iterator<Item = &[T]> {
        // chunks() panics on a zero chunk size
        self.data.chunks(self.width.max(1)).take(self.height)
    }

    /// All samples in row-major order.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Consume the canvas, returning its buffer.
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Copy the sub-rectangle `rows x cols` (half-open ranges) into a new canvas.
    pub fn crop(&self, rows: std::ops::Range<usize>, cols: std::ops::Range<usize>) -> Self {
        let width = cols.len();
        let height = rows.len();
        let mut data = Vec::with_capacity(width * height);
        for r in rows {
            data.extend_from_slice(&self.row(r)[cols.clone()]);
        }
        Self {
            data,
            width,
            height,
        }
    }

    /// Apply `f` to every cell, producing a new canvas.
    pub fn map<U: Copy>(&self, f: impl Fn(T) -> U) -> Canvas<U> {
        Canvas {
            data: self.data.iter().map(|&v| f(v)).collect(),
            width: self.width,
            height: self.height,
        }
    }
}

impl Canvas<f32> {
    /// An elevation canvas with every cell missing.
    pub fn missing(width: usize, height: usize) -> Self {
        Self::filled(width, height, f32::NAN)
    }

    /// Number of cells holding elevation data.
    pub fn present_count(&self) -> usize {
        self.data.iter().filter(|v| !v.is_nan()).count()
    }

    /// Minimum and maximum of present samples, or `None` if all are missing.
    pub fn value_range(&self) -> Option<(f32, f32)> {
        self.data
            .iter()
            .filter(|v| !v.is_nan())
            .fold(None, |acc, &v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    /// Whether two canvases have the same shape and bit-identical samples.
    ///
    /// Unlike `==`, this treats two NaN cells as equal.
    pub fn bitwise_eq(&self, other: &Self) -> bool {
        self.shape() == other.shape()
            && self
                .data
                .iter()
                .zip(&other.data)
                .all(|(a, b)| a.to_bits() == b.to_bits())
    }
}

/// Summary statistics of an elevation canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasStats {
    /// Number of rows.
    pub height: usize,
    /// Number of columns.
    pub width: usize,
    /// Total number of cells.
    pub total: usize,
    /// Cells holding elevation data.
    pub present: usize,
    /// Smallest present elevation.
    pub min: Option<f32>,
    /// Largest present elevation.
    pub max: Option<f32>,
}

impl CanvasStats {
    /// Compute statistics for a canvas.
    pub fn of(canvas: &Canvas<f32>) -> Self {
        let range = canvas.value_range();
        Self {
            height: canvas.height(),
            width: canvas.width(),
            total: canvas.len(),
            present: canvas.present_count(),
            min: range.map(|r| r.0),
            max: range.map(|r| r.1),
        }
    }

    /// Percentage of cells holding elevation data.
    pub fn coverage_percent(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            100.0 * self.present as f64 / self.total as f64
        }
    }
}
