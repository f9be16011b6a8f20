//! Removal of all-missing borders.

use crate::Canvas;

/// Inclusive row/column window; cells outside it are treated as missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrimWindow {
    /// First row kept.
    pub min_row: usize,
    /// Last row kept.
    pub max_row: usize,
    /// First column kept.
    pub min_col: usize,
    /// Last column kept.
    pub max_col: usize,
}

impl TrimWindow {
    fn contains(&self, row: usize, col: usize) -> bool {
        row >= self.min_row && row <= self.max_row && col >= self.min_col && col <= self.max_col
    }
}

/// First and last index for which `present(i)` holds, or `None` if it never does.
fn present_span(len: usize, present: impl Fn(usize) -> bool) -> Option<(usize, usize)> {
    let first = (0..len).find(|&i| present(i))?;
    let last = (0..len).rev().find(|&i| present(i))?;
    Some((first, last))
}

/// Drop leading and trailing rows and columns that are entirely missing.
///
/// Each axis is handled independently. If every row (resp. column) is
/// missing, that axis is left as is rather than collapsing to zero.
/// Trimming a trimmed canvas returns it unchanged.
pub fn trim(canvas: &Canvas<f32>) -> Canvas<f32> {
    let rows = present_span(canvas.height(), |r| canvas.row(r).iter().any(|v| !v.is_nan()))
        .map_or(0..canvas.height(), |(a, b)| a..b + 1);
    let cols = present_span(canvas.width(), |c| {
        (0..canvas.height()).any(|r| canvas.get(r, c).is_some_and(|v| !v.is_nan()))
    })
    .map_or(0..canvas.width(), |(a, b)| a..b + 1);

    canvas.crop(rows, cols)
}

/// Mark every cell outside `window` as missing.
pub fn mask_outside(canvas: &Canvas<f32>, window: &TrimWindow) -> Canvas<f32> {
    let mut out = canvas.clone();
    for r in 0..out.height() {
        let row = out.row_mut(r);
        for (c, v) in row.iter_mut().enumerate() {
            if !window.contains(r, c) {
                *v = f32::NAN;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const N: f32 = f32::NAN;

    #[test]
    fn test_trims_borders() {
        let c = Canvas::from_rows(&[
            vec![N, N, N, N],
            vec![N, 1.0, N, N],
            vec![N, N, 2.0, N],
            vec![N, N, N, N],
        ])
        .unwrap();
        let t = trim(&c);
        assert_eq!(t.shape(), (2, 2));
        assert_eq!(t.get(0, 0), Some(1.0));
        assert_eq!(t.get(1, 1), Some(2.0));
        assert!(t.get(0, 1).unwrap().is_nan());
    }

    #[test]
    fn test_interior_missing_rows_kept() {
        let c = Canvas::from_rows(&[vec![1.0], vec![N], vec![3.0], vec![N]]).unwrap();
        let t = trim(&c);
        assert_eq!(t.shape(), (3, 1));
    }

    #[test]
    fn test_all_missing_left_untrimmed() {
        let c = Canvas::missing(3, 2);
        let t = trim(&c);
        assert_eq!(t.shape(), (2, 3));
    }

    #[test]
    fn test_trim_is_idempotent() {
        let canvases = vec![
            Canvas::from_rows(&[vec![N, N, N], vec![N, 5.0, N], vec![N, N, N]]).unwrap(),
            Canvas::from_rows(&[vec![1.0, N], vec![N, N]]).unwrap(),
            Canvas::missing(2, 2),
            Canvas::missing(0, 0),
            Canvas::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap(),
        ];
        for c in canvases {
            let once = trim(&c);
            let twice = trim(&once);
            assert!(once.bitwise_eq(&twice));
        }
    }

    #[test]
    fn test_mask_outside_then_trim() {
        let c = Canvas::from_rows(&[
            vec![1.0, 2.0, 3.0],
            vec![4.0, 5.0, 6.0],
            vec![7.0, 8.0, 9.0],
        ])
        .unwrap();
        let window = TrimWindow {
            min_row: 1,
            max_row: 2,
            min_col: 0,
            max_col: 1,
        };
        let masked = mask_outside(&c, &window);
        assert!(masked.get(0, 0).unwrap().is_nan());
        assert!(masked.get(1, 2).unwrap().is_nan());
        assert_eq!(masked.get(2, 1), Some(8.0));

        let t = trim(&masked);
        assert_eq!(t.as_slice(), &[4.0, 5.0, 7.0, 8.0]);
    }
}
