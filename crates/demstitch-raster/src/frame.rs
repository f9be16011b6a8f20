//! A single validated tile ready for compositing.

use crate::{Canvas, GeoTransform, Result, ValidationError};

/// Threshold used by the threshold ingestion path: anything below is missing.
pub const DEFAULT_NODATA_THRESHOLD: f32 = -1e30;

/// How "no elevation data" is recognised in raw tile samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NoDataRule {
    /// Samples exactly equal to the sentinel are missing.
    Sentinel(f32),
    /// Samples strictly below the threshold are missing.
    Below(f32),
    /// Only NaN samples are missing.
    None,
}

impl NoDataRule {
    /// Whether a raw sample is missing under this rule.
    pub fn is_missing(&self, sample: f32) -> bool {
        if sample.is_nan() {
            return true;
        }
        match *self {
            NoDataRule::Sentinel(v) => sample == v,
            NoDataRule::Below(t) => sample < t,
            NoDataRule::None => false,
        }
    }
}

impl Default for NoDataRule {
    fn default() -> Self {
        NoDataRule::Below(DEFAULT_NODATA_THRESHOLD)
    }
}

/// Raw tile contents as exposed by a tile source, before validation.
#[derive(Debug, Clone)]
pub struct RawTile {
    /// Affine transform read from the tile.
    pub transform: GeoTransform,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Samples in row-major order, as stored in the file.
    pub samples: Vec<f32>,
    /// No-data sentinel declared by the file, if any.
    pub declared_nodata: Option<f32>,
}

/// A loaded tile: transform, dimensions and samples with missing cells
/// canonicalised to NaN.
///
/// Tiles are read-only once built and are dropped after compositing.
#[derive(Debug, Clone)]
pub struct TileFrame {
    transform: GeoTransform,
    samples: Canvas<f32>,
}

impl TileFrame {
    /// Build a frame from raw samples, replacing cells matched by `rule` with NaN.
    pub fn new(
        transform: GeoTransform,
        width: u32,
        height: u32,
        mut samples: Vec<f32>,
        rule: NoDataRule,
    ) -> Result<Self> {
        if samples.len() != width as usize * height as usize {
            return Err(ValidationError::SampleCount {
                width,
                height,
                actual: samples.len(),
            }
            .into());
        }

        for s in samples.iter_mut() {
            if rule.is_missing(*s) {
                *s = f32::NAN;
            }
        }

        let samples = Canvas::from_vec(width as usize, height as usize, samples)?;
        Ok(Self { transform, samples })
    }

    /// Build a frame from a raw tile.
    pub fn from_raw(raw: RawTile, rule: NoDataRule) -> Result<Self> {
        Self::new(raw.transform, raw.width, raw.height, raw.samples, rule)
    }

    /// The tile's geo-transform.
    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.samples.width() as u32
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.samples.height() as u32
    }

    /// Samples in file order, missing cells as NaN.
    pub fn samples(&self) -> &Canvas<f32> {
        &self.samples
    }

    /// Ground size of one pixel.
    pub fn pitch(&self) -> f64 {
        self.transform.pitch()
    }

    /// Global coordinates of the tile's south-west corner.
    pub fn south_west_corner(&self) -> (f64, f64) {
        self.transform.south_west_corner(self.width(), self.height())
    }

    /// Number of samples holding elevation data.
    pub fn present_count(&self) -> usize {
        self.samples.present_count()
    }

    /// Whether every sample is missing.
    pub fn is_all_missing(&self) -> bool {
        self.present_count() == 0
    }

    /// Reject the tile unless its pitch equals `expected` on both axes.
    pub fn require_pitch(&self, expected: f64) -> Result<()> {
        self.transform.require_square_pixels()?;
        if self.pitch() != expected {
            return Err(ValidationError::UnexpectedPitch {
                expected,
                actual: self.pitch(),
            }
            .into());
        }
        Ok(())
    }

    /// Multiply elevations by the pixel pitch.
    ///
    /// Requires square pixels so the vertical scale is the same along both axes.
    pub fn rescale_by_pitch(mut self) -> Result<Self> {
        self.transform.require_square_pixels()?;
        let pitch = self.pitch() as f32;
        self.samples = self.samples.map(|v| v * pitch);
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RasterError;

    fn unit(origin_x: f64, origin_y: f64) -> GeoTransform {
        GeoTransform::north_up(origin_x, origin_y, 1.0).unwrap()
    }

    #[test]
    fn test_sentinel_becomes_nan() {
        let frame = TileFrame::new(
            unit(0.0, 0.0),
            2,
            2,
            vec![1.0, -9999.0, 3.0, 4.0],
            NoDataRule::Sentinel(-9999.0),
        )
        .unwrap();
        assert!(frame.samples().as_slice()[1].is_nan());
        assert_eq!(frame.present_count(), 3);
    }

    #[test]
    fn test_threshold_rule() {
        let frame = TileFrame::new(
            unit(0.0, 0.0),
            3,
            1,
            vec![-3.4e38, 0.0, -1.0],
            NoDataRule::default(),
        )
        .unwrap();
        assert_eq!(frame.present_count(), 2);
        assert!(!frame.is_all_missing());
    }

    #[test]
    fn test_sample_count_mismatch() {
        let err = TileFrame::new(unit(0.0, 0.0), 2, 2, vec![0.0; 3], NoDataRule::None).unwrap_err();
        assert!(matches!(
            err,
            RasterError::Validation(ValidationError::SampleCount { actual: 3, .. })
        ));
    }

    #[test]
    fn test_require_pitch() {
        let t = GeoTransform::north_up(0.0, 0.0, 2.0).unwrap();
        let frame = TileFrame::new(t, 1, 1, vec![1.0], NoDataRule::None).unwrap();
        assert!(frame.require_pitch(2.0).is_ok());
        assert!(matches!(
            frame.require_pitch(1.0),
            Err(RasterError::Validation(ValidationError::UnexpectedPitch { .. }))
        ));
    }

    #[test]
    fn test_rescale_by_pitch_keeps_missing() {
        let t = GeoTransform::north_up(0.0, 0.0, 0.5).unwrap();
        let frame = TileFrame::new(t, 2, 1, vec![10.0, f32::NAN], NoDataRule::None)
            .unwrap()
            .rescale_by_pitch()
            .unwrap();
        assert_eq!(frame.samples().get(0, 0), Some(5.0));
        assert!(frame.samples().get(0, 1).unwrap().is_nan());
    }

    #[test]
    fn test_rescale_rejects_non_square() {
        let t = GeoTransform::from_gdal([0.0, 1.0, 0.0, 0.0, 0.0, -2.0]).unwrap();
        let frame = TileFrame::new(t, 1, 1, vec![1.0], NoDataRule::None).unwrap();
        assert!(frame.rescale_by_pitch().is_err());
    }
}
