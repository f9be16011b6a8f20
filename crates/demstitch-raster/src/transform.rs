//! Affine geo-transform of a single tile.

use crate::{Result, ValidationError};

/// Validated affine mapping from pixel indices to global coordinates.
///
/// Follows the GDAL convention:
///
/// ```text
/// x = origin_x + col * pixel_width  + row * rotation_x
/// y = origin_y + col * rotation_y   + row * pixel_height
/// ```
///
/// Only north-aligned transforms are accepted, so both rotation terms are
/// always zero on a constructed value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform {
    /// Global x of the top-left corner of the top-left pixel.
    pub origin_x: f64,
    /// Global y of the top-left corner of the top-left pixel.
    pub origin_y: f64,
    /// Signed pixel width (negative when columns grow westwards).
    pub pixel_width: f64,
    /// Signed pixel height (negative for north-up rasters).
    pub pixel_height: f64,
    /// Row rotation term, always zero.
    pub rotation_x: f64,
    /// Column rotation term, always zero.
    pub rotation_y: f64,
}

impl GeoTransform {
    /// Build a north-up transform (negative pixel height) with square pixels.
    pub fn north_up(origin_x: f64, origin_y: f64, pitch: f64) -> Result<Self> {
        Self::from_gdal([origin_x, pitch, 0.0, origin_y, 0.0, -pitch])
    }

    /// Build a transform from the six GDAL-ordered coefficients
    /// `[origin_x, pixel_width, rotation_x, origin_y, rotation_y, pixel_height]`.
    pub fn from_gdal(coefficients: [f64; 6]) -> Result<Self> {
        if coefficients.iter().any(|c| !c.is_finite()) {
            return Err(ValidationError::NonFiniteTransform.into());
        }

        let [origin_x, pixel_width, rotation_x, origin_y, rotation_y, pixel_height] = coefficients;

        if rotation_x != 0.0 || rotation_y != 0.0 {
            return Err(ValidationError::RotatedTransform {
                rotation_x,
                rotation_y,
            }
            .into());
        }
        if pixel_width == 0.0 || pixel_height == 0.0 {
            return Err(ValidationError::ZeroPitch.into());
        }

        Ok(Self {
            origin_x,
            origin_y,
            pixel_width,
            pixel_height,
            rotation_x,
            rotation_y,
        })
    }

    /// The six coefficients in GDAL order.
    pub fn to_gdal(&self) -> [f64; 6] {
        [
            self.origin_x,
            self.pixel_width,
            self.rotation_x,
            self.origin_y,
            self.rotation_y,
            self.pixel_height,
        ]
    }

    /// Ground size of one pixel along x.
    pub fn pitch(&self) -> f64 {
        self.pixel_width.abs()
    }

    /// Whether `|pixel_width| == |pixel_height|`.
    pub fn has_square_pixels(&self) -> bool {
        self.pixel_width.abs() == self.pixel_height.abs()
    }

    /// Assert square pixels, as required before treating the pitch as a
    /// physical scale.
    pub fn require_square_pixels(&self) -> Result<()> {
        if self.has_square_pixels() {
            Ok(())
        } else {
            Err(ValidationError::NonSquarePixels {
                width: self.pixel_width,
                height: self.pixel_height,
            }
            .into())
        }
    }

    /// Whether rows grow northwards (positive pixel height).
    pub fn rows_grow_north(&self) -> bool {
        self.pixel_height > 0.0
    }

    /// Whether columns grow westwards (negative pixel width).
    pub fn columns_grow_west(&self) -> bool {
        self.pixel_width < 0.0
    }

    /// Map a pixel corner `(col, row)` to global coordinates.
    pub fn pixel_to_global(&self, col: f64, row: f64) -> (f64, f64) {
        (
            self.origin_x + col * self.pixel_width + row * self.rotation_x,
            self.origin_y + col * self.rotation_y + row * self.pixel_height,
        )
    }

    /// Global coordinates of the south-west corner of a `width` x `height`
    /// tile using this transform.
    pub fn south_west_corner(&self, width: u32, height: u32) -> (f64, f64) {
        let (x_a, y_a) = self.pixel_to_global(0.0, 0.0);
        let (x_b, y_b) = self.pixel_to_global(width as f64, height as f64);
        (x_a.min(x_b), y_a.min(y_b))
    }
}
