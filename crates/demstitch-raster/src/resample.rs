//! Strided decimation.

use crate::{Canvas, RasterError, Result};

/// Keep every `factor`-th row and column, starting at 0, and divide the
/// retained elevations by `factor`.
///
/// Each output pixel covers `factor` times the ground distance, so dividing
/// keeps elevation expressed in the same units as the pixel pitch. No
/// interpolation takes place and missing samples stay missing. The output is
/// `ceil(height / factor)` by `ceil(width / factor)`.
pub fn decimate(canvas: &Canvas<f32>, factor: u32) -> Result<Canvas<f32>> {
    if factor == 0 {
        return Err(RasterError::InvalidFactor(factor));
    }
    if factor == 1 {
        return Ok(canvas.clone());
    }

    let step = factor as usize;
    let scale = factor as f32;
    let width = canvas.width().div_ceil(step);
    let height = canvas.height().div_ceil(step);

    let mut data = Vec::with_capacity(width * height);
    for r in (0..canvas.height()).step_by(step) {
        data.extend(canvas.row(r).iter().step_by(step).map(|v| v / scale));
    }

    Canvas::from_vec(width, height, data)
}

/// Decimation factor that brings the smaller canvas dimension down to about
/// `target` pixels, or 1 if it is already there.
pub fn factor_for_target(height: usize, width: usize, target: usize) -> u32 {
    let smallest = height.min(width);
    if target == 0 || target >= smallest {
        return 1;
    }
    ((smallest / target) as u32).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const N: f32 = f32::NAN;

    #[test]
    fn test_zero_factor_rejected() {
        let c = Canvas::missing(2, 2);
        assert!(matches!(decimate(&c, 0), Err(RasterError::InvalidFactor(0))));
    }

    #[test]
    fn test_factor_one_is_identity() {
        let c = Canvas::from_rows(&[vec![1.0, N], vec![3.0, 4.0]]).unwrap();
        assert!(decimate(&c, 1).unwrap().bitwise_eq(&c));
    }

    #[test]
    fn test_strided_and_rescaled() {
        let c = Canvas::from_rows(&[
            vec![2.0, 9.0, 4.0, 9.0, 6.0],
            vec![9.0, 9.0, 9.0, 9.0, 9.0],
            vec![8.0, 9.0, N, 9.0, 10.0],
        ])
        .unwrap();
        let d = decimate(&c, 2).unwrap();
        assert_eq!(d.shape(), (2, 3));
        assert_relative_eq!(d.get(0, 0).unwrap(), 1.0);
        assert_relative_eq!(d.get(0, 1).unwrap(), 2.0);
        assert_relative_eq!(d.get(0, 2).unwrap(), 3.0);
        assert_relative_eq!(d.get(1, 0).unwrap(), 4.0);
        assert!(d.get(1, 1).unwrap().is_nan());
        assert_relative_eq!(d.get(1, 2).unwrap(), 5.0);
    }

    #[test]
    fn test_output_shape_rounds_up() {
        let c = Canvas::filled(7, 4, 1.0f32);
        for factor in 1..=8u32 {
            let d = decimate(&c, factor).unwrap();
            let f = factor as usize;
            assert_eq!(d.shape(), ((4 + f - 1) / f, (7 + f - 1) / f));
        }
    }

    #[test]
    fn test_missing_never_filled() {
        let c = Canvas::from_rows(&[vec![N, 1.0, N], vec![2.0, N, 3.0], vec![N, N, N]]).unwrap();
        for factor in 1..=3u32 {
            let d = decimate(&c, factor).unwrap();
            let step = factor as usize;
            for r in 0..d.height() {
                for col in 0..d.width() {
                    let src = c.get(r * step, col * step).unwrap();
                    assert_eq!(src.is_nan(), d.get(r, col).unwrap().is_nan());
                }
            }
        }
    }

    #[test]
    fn test_factor_for_target() {
        assert_eq!(factor_for_target(3000, 4500, 1000), 3);
        assert_eq!(factor_for_target(3000, 4500, 1400), 2);
        assert_eq!(factor_for_target(800, 4500, 1000), 1);
        assert_eq!(factor_for_target(800, 800, 0), 1);
    }
}
