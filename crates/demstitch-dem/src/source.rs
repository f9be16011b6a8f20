//! Tile sources: where raw tile samples and georeferencing come from.

use crate::{DemError, Result};
use demstitch_raster::{GeoTransform, RawTile};
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::tags::Tag;

/// GeoTIFF ModelPixelScaleTag.
const MODEL_PIXEL_SCALE: u16 = 33550;
/// GeoTIFF ModelTiepointTag.
const MODEL_TIEPOINT: u16 = 33922;
/// GeoTIFF ModelTransformationTag.
const MODEL_TRANSFORMATION: u16 = 34264;
/// GeoTIFF GeoKeyDirectoryTag.
const GEO_KEY_DIRECTORY: u16 = 34735;
/// GDAL_NODATA, stored as ASCII.
const GDAL_NODATA: u16 = 42113;

/// GeographicTypeGeoKey.
const GEOGRAPHIC_TYPE_GEO_KEY: u16 = 2048;
/// ProjectedCSTypeGeoKey.
const PROJECTED_CS_TYPE_GEO_KEY: u16 = 3072;

/// A tile as read from its source, before no-data handling and validation.
#[derive(Debug, Clone)]
pub struct SourceTile {
    /// Transform, dimensions, samples and declared no-data value.
    pub raw: RawTile,
    /// Number of raster bands in the file.
    pub band_count: u16,
    /// EPSG code of the tile's coordinate system, if declared.
    pub epsg: Option<u16>,
}

/// Something that can open a tile by path.
///
/// Implementations must not have side effects beyond reading, so tiles can be
/// opened concurrently.
pub trait TileSource: Sync {
    /// Read one tile.
    fn open(&self, path: &Path) -> Result<SourceTile>;
}

/// Reads single-band GeoTIFF elevation tiles with the `tiff` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeoTiffSource;

impl GeoTiffSource {
    /// Create a new GeoTIFF source.
    pub fn new() -> Self {
        Self
    }

    /// Read the affine transform from GeoTIFF tags.
    ///
    /// `ModelTransformationTag` is preferred since it is the only place
    /// rotation terms can appear; otherwise the tie point and pixel scale are
    /// combined into a north-up transform.
    fn read_geotransform<R: std::io::Read + std::io::Seek>(
        decoder: &mut Decoder<R>,
    ) -> Result<GeoTransform> {
        if let Ok(m) = decoder.get_tag_f64_vec(Tag::from_u16_exhaustive(MODEL_TRANSFORMATION)) {
            if m.len() < 16 {
                return Err(DemError::InvalidGeoTiff(format!(
                    "ModelTransformation has {} values, expected 16",
                    m.len()
                )));
            }
            // x = m[0]*col + m[1]*row + m[3]
            // y = m[4]*col + m[5]*row + m[7]
            return Ok(GeoTransform::from_gdal([m[3], m[0], m[1], m[7], m[4], m[5]])?);
        }

        let tiepoint = decoder.get_tag_f64_vec(Tag::from_u16_exhaustive(MODEL_TIEPOINT));
        let pixel_scale = decoder.get_tag_f64_vec(Tag::from_u16_exhaustive(MODEL_PIXEL_SCALE));

        match (tiepoint, pixel_scale) {
            (Ok(tiepoint), Ok(scale)) if tiepoint.len() >= 6 && scale.len() >= 2 => {
                // Tiepoint format: [i, j, k, x, y, z] ties raster (i, j) to model (x, y)
                let (i, j) = (tiepoint[0], tiepoint[1]);
                let (x, y) = (tiepoint[3], tiepoint[4]);
                let (scale_x, scale_y) = (scale[0], scale[1]);

                // Rows run south, so the pixel height is the negated y scale
                Ok(GeoTransform::from_gdal([
                    x - i * scale_x,
                    scale_x,
                    0.0,
                    y + j * scale_y,
                    0.0,
                    -scale_y,
                ])?)
            }
            _ => Err(DemError::InvalidGeoTiff(
                "missing ModelTransformation or ModelTiepoint/ModelPixelScale tags".to_string(),
            )),
        }
    }

    /// Read the EPSG code from the GeoKey directory, preferring the projected
    /// coordinate system over the geographic one.
    fn read_epsg<R: std::io::Read + std::io::Seek>(decoder: &mut Decoder<R>) -> Option<u16> {
        let keys = decoder.get_tag_u16_vec(Tag::from_u16_exhaustive(GEO_KEY_DIRECTORY)).ok()?;
        epsg_from_geokeys(&keys)
    }

    /// Number of samples per pixel; absent means one.
    fn read_band_count<R: std::io::Read + std::io::Seek>(decoder: &mut Decoder<R>) -> Result<u16> {
        match decoder.find_tag(Tag::SamplesPerPixel)? {
            Some(value) => Ok(value.into_u16()?),
            None => Ok(1),
        }
    }

    /// Decode elevation data from the TIFF decoder.
    fn decode_elevation_data<R: std::io::Read + std::io::Seek>(
        decoder: &mut Decoder<R>,
    ) -> Result<Vec<f32>> {
        let result = decoder.read_image()?;

        match result {
            DecodingResult::F32(data) => Ok(data),
            DecodingResult::F64(data) => Ok(data.into_iter().map(|v| v as f32).collect()),
            DecodingResult::I16(data) => Ok(data.into_iter().map(|v| v as f32).collect()),
            DecodingResult::I32(data) => Ok(data.into_iter().map(|v| v as f32).collect()),
            DecodingResult::U16(data) => Ok(data.into_iter().map(|v| v as f32).collect()),
            DecodingResult::U32(data) => Ok(data.into_iter().map(|v| v as f32).collect()),
            DecodingResult::U8(data) => Ok(data.into_iter().map(|v| v as f32).collect()),
            DecodingResult::I8(data) => Ok(data.into_iter().map(|v| v as f32).collect()),
            DecodingResult::U64(data) => Ok(data.into_iter().map(|v| v as f32).collect()),
            DecodingResult::I64(data) => Ok(data.into_iter().map(|v| v as f32).collect()),
        }
    }

    /// Read the no-data value from the GDAL_NODATA tag.
    fn read_nodata_value<R: std::io::Read + std::io::Seek>(
        decoder: &mut Decoder<R>,
    ) -> Result<Option<f32>> {
        match decoder.get_tag_ascii_string(Tag::from_u16_exhaustive(GDAL_NODATA)) {
            Ok(text) => {
                let text = text.trim_end_matches('\0').trim();
                text.parse::<f32>().map(Some).map_err(|_| {
                    DemError::InvalidGeoTiff(format!("unparseable GDAL_NODATA value {:?}", text))
                })
            }
            Err(_) => Ok(None),
        }
    }
}

impl TileSource for GeoTiffSource {
    fn open(&self, path: &Path) -> Result<SourceTile> {
        let file = std::fs::File::open(path)?;
        let mut decoder = Decoder::new(std::io::BufReader::new(file))?;

        // Allow large DEM tiles (10812 x 10812 f32 is ~466 MB)
        let mut limits = Limits::default();
        limits.decoding_buffer_size = 1024 * 1024 * 1024;
        limits.intermediate_buffer_size = 1024 * 1024 * 1024;
        limits.ifd_value_size = 1024 * 1024 * 1024;
        decoder = decoder.with_limits(limits);

        let (width, height) = decoder.dimensions()?;
        let band_count = Self::read_band_count(&mut decoder)?;
        let transform = Self::read_geotransform(&mut decoder).map_err(|e| e.with_path(path))?;
        let epsg = Self::read_epsg(&mut decoder);
        let declared_nodata = Self::read_nodata_value(&mut decoder)?;
        let samples = Self::decode_elevation_data(&mut decoder)?;

        Ok(SourceTile {
            raw: RawTile {
                transform,
                width,
                height,
                samples,
                declared_nodata,
            },
            band_count,
            epsg,
        })
    }
}

/// Extract the EPSG code from a GeoKeyDirectory.
///
/// Layout: `[version, revision, minor, key_count]` followed by `key_count`
/// entries of `[key_id, tag_location, count, value]`. Only keys stored inline
/// (`tag_location == 0`) are considered.
pub fn epsg_from_geokeys(keys: &[u16]) -> Option<u16> {
    if keys.len() < 4 {
        return None;
    }
    let key_count = keys[3] as usize;

    let mut geographic = None;
    let mut projected = None;
    for entry in keys[4..].chunks_exact(4).take(key_count) {
        let (key_id, location, value) = (entry[0], entry[1], entry[3]);
        if location != 0 {
            continue;
        }
        match key_id {
            PROJECTED_CS_TYPE_GEO_KEY => projected = Some(value),
            GEOGRAPHIC_TYPE_GEO_KEY => geographic = Some(value),
            _ => {}
        }
    }

    projected.or(geographic)
}
