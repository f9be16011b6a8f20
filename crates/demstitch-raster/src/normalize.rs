//! Zero-based normalization and 8-bit quantization.

use crate::{Canvas, RasterError, Result};

/// Largest quantized value.
pub const QUANT_MAX: f64 = 255.0;

/// Mask value for cells holding elevation data.
pub const MASK_PRESENT: u8 = 255;

/// Mask value for missing cells.
pub const MASK_MISSING: u8 = 0;

/// Result of quantizing an elevation canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct Quantized {
    /// Elevations mapped onto `0..=255`. Missing cells hold 0.
    pub image: Canvas<u8>,
    /// `MASK_PRESENT` where the source had data, `MASK_MISSING` elsewhere.
    pub mask: Canvas<u8>,
    /// Multiply a quantized value by this to get back approximate elevation,
    /// in units of the decimated pixel pitch.
    pub scale_factor: f64,
}

/// Shift elevations so the smallest present value becomes zero.
///
/// Fails if the canvas is empty or holds no data. A flat canvas normalizes
/// to all zeros.
pub fn normalize(canvas: &Canvas<f32>) -> Result<Canvas<f32>> {
    if canvas.is_empty() {
        return Err(RasterError::degenerate("canvas is empty"));
    }
    let (min, _) = canvas
        .value_range()
        .ok_or_else(|| RasterError::degenerate("canvas holds no elevation data"))?;

    // NaN - min stays NaN
    Ok(canvas.map(|v| v - min))
}

/// Quantize an elevation canvas to 8 bits.
///
/// Values are mapped linearly from `[min, max]` onto `[0, 255]` and
/// truncated. `decimation_factor` is the factor the canvas was decimated by,
/// folded into the reported scale factor.
pub fn quantize(canvas: &Canvas<f32>, decimation_factor: u32) -> Result<Quantized> {
    if canvas.is_empty() {
        return Err(RasterError::degenerate("canvas is empty"));
    }
    if decimation_factor == 0 {
        return Err(RasterError::InvalidFactor(decimation_factor));
    }
    let (min, max) = canvas
        .value_range()
        .ok_or_else(|| RasterError::degenerate("canvas holds no elevation data"))?;
    if max == min {
        return Err(RasterError::degenerate(format!(
            "all elevations equal {}",
            min
        )));
    }

    let min = min as f64;
    let range = max as f64 - min;
    let scale = QUANT_MAX / range;

    let image = canvas.map(|v| {
        if v.is_nan() {
            0
        } else {
            ((v as f64 - min) * scale).clamp(0.0, QUANT_MAX) as u8
        }
    });
    let mask = canvas.map(|v| if v.is_nan() { MASK_MISSING } else { MASK_PRESENT });

    Ok(Quantized {
        image,
        mask,
        scale_factor: range / QUANT_MAX / decimation_factor as f64,
    })
}
