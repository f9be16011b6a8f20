//! Reads GeoTIFF tiles written with the `tiff` encoder.

use approx::assert_relative_eq;
use demstitch_dem::{
    tile_paths_in, DemError, GeoTiffSource, LoadMode, LoadOptions, TileLoader, TileSource,
};
use demstitch_raster::{Mosaic, ValidationError};
use std::fs::File;
use std::path::{Path, PathBuf};
use tiff::encoder::{colortype, TiffEncoder};
use tiff::tags::Tag;

const MODEL_PIXEL_SCALE: u16 = 33550;
const MODEL_TIEPOINT: u16 = 33922;
const MODEL_TRANSFORMATION: u16 = 34264;
const GEO_KEY_DIRECTORY: u16 = 34735;
const GDAL_NODATA: u16 = 42113;

/// Write a north-up single-band f32 GeoTIFF with its top-left corner at `(x, y)`.
#[allow(clippy::too_many_arguments)]
fn write_tile(
    path: &Path,
    x: f64,
    y: f64,
    width: u32,
    height: u32,
    samples: &[f32],
    epsg: u16,
    nodata: Option<&str>,
) {
    let file = File::create(path).unwrap();
    let mut tiff = TiffEncoder::new(file).unwrap();
    let mut image = tiff
        .new_image::<colortype::Gray32Float>(width, height)
        .unwrap();

    let dir = image.encoder();
    dir.write_tag(Tag::Unknown(MODEL_PIXEL_SCALE), &[1.0f64, 1.0, 0.0][..])
        .unwrap();
    dir.write_tag(Tag::Unknown(MODEL_TIEPOINT), &[0.0f64, 0.0, 0.0, x, y, 0.0][..])
        .unwrap();
    let geokeys: [u16; 12] = [1, 1, 0, 2, 1024, 0, 1, 1, 3072, 0, 1, epsg];
    dir.write_tag(Tag::Unknown(GEO_KEY_DIRECTORY), &geokeys[..])
        .unwrap();
    if let Some(nodata) = nodata {
        dir.write_tag(Tag::Unknown(GDAL_NODATA), nodata).unwrap();
    }

    image.write_data(samples).unwrap();
}

fn tile_at(dir: &Path, name: &str, x: f64, samples: &[f32]) -> PathBuf {
    let path = dir.join(name);
    write_tile(&path, x, 20.0, 3, 2, samples, 26912, Some("-9999"));
    path
}

#[test]
fn test_geotiff_source_reads_georeferencing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tile.tif");
    write_tile(
        &path,
        10.0,
        20.0,
        3,
        2,
        &[1.0, 2.0, 3.0, -9999.0, 5.0, 6.5],
        26912,
        Some("-9999"),
    );

    let tile = GeoTiffSource::new().open(&path).unwrap();
    assert_eq!(tile.band_count, 1);
    assert_eq!(tile.epsg, Some(26912));
    assert_eq!(tile.raw.declared_nodata, Some(-9999.0));
    assert_eq!((tile.raw.width, tile.raw.height), (3, 2));
    assert_relative_eq!(tile.raw.transform.origin_x, 10.0);
    assert_relative_eq!(tile.raw.transform.origin_y, 20.0);
    assert_relative_eq!(tile.raw.transform.pixel_width, 1.0);
    assert_relative_eq!(tile.raw.transform.pixel_height, -1.0);
    assert_eq!(tile.raw.samples[5], 6.5);
}

#[test]
fn test_missing_georeferencing_is_invalid() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plain.tif");
    let file = File::create(&path).unwrap();
    TiffEncoder::new(file)
        .unwrap()
        .write_image::<colortype::Gray32Float>(2, 1, &[1.0, 2.0])
        .unwrap();

    let err = GeoTiffSource::new().open(&path).unwrap_err();
    assert!(matches!(err, DemError::InvalidGeoTiff(_)));
}

#[test]
fn test_short_model_transformation_is_invalid() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("short.tif");
    let file = File::create(&path).unwrap();
    let mut tiff = TiffEncoder::new(file).unwrap();
    let mut image = tiff.new_image::<colortype::Gray32Float>(2, 1).unwrap();
    // Only the first two rows of the 4x4 matrix.
    let rows = [1.0f64, 0.0, 0.0, 10.0, 0.0, -1.0, 0.0, 20.0];
    image
        .encoder()
        .write_tag(Tag::Unknown(MODEL_TRANSFORMATION), &rows[..])
        .unwrap();
    image.write_data(&[1.0, 2.0]).unwrap();

    let err = GeoTiffSource::new().open(&path).unwrap_err();
    match err {
        DemError::InvalidGeoTiff(message) => assert!(message.contains("8 values")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_directory_load_and_assemble() {
    let dir = tempfile::tempdir().unwrap();
    tile_at(dir.path(), "b.tif", 13.0, &[7.0; 6]);
    tile_at(dir.path(), "a.tif", 10.0, &[1.0, 2.0, 3.0, -9999.0, 5.0, 6.0]);
    std::fs::write(dir.path().join("notes.txt"), "not a tile").unwrap();

    let paths = tile_paths_in(dir.path()).unwrap();
    assert_eq!(paths.len(), 2);
    assert!(paths[0].ends_with("a.tif"));

    let tiles = TileLoader::geotiff(LoadOptions::default())
        .load_all(&paths)
        .unwrap();
    let (canvas, extent) = Mosaic::build(&tiles).unwrap();

    assert_eq!((extent.min_x, extent.max_x), (10, 15));
    assert_eq!((extent.min_y, extent.max_y), (18, 19));
    assert_eq!(canvas.shape(), (2, 6));
    assert_eq!(canvas.row(0), &[1.0, 2.0, 3.0, 7.0, 7.0, 7.0]);
    assert!(canvas.get(1, 0).unwrap().is_nan());
    assert_eq!(canvas.get(1, 5), Some(7.0));
}

#[test]
fn test_lenient_load_skips_unreadable_and_foreign_tiles() {
    let dir = tempfile::tempdir().unwrap();
    let good = tile_at(dir.path(), "good.tif", 0.0, &[1.0; 6]);
    let broken = dir.path().join("broken.tif");
    std::fs::write(&broken, b"definitely not a tiff").unwrap();
    let foreign = dir.path().join("foreign.tif");
    write_tile(&foreign, 3.0, 20.0, 3, 2, &[2.0; 6], 32612, None);

    let options = LoadOptions {
        mode: LoadMode::Lenient,
        expected_epsg: Some(26912),
        ..LoadOptions::default()
    };
    let paths = vec![good.clone(), broken.clone(), foreign.clone()];
    let tiles = TileLoader::geotiff(options.clone()).load_all(&paths).unwrap();
    assert_eq!(tiles.len(), 1);

    let strict = LoadOptions {
        mode: LoadMode::Strict,
        ..options
    };
    let err = TileLoader::geotiff(strict)
        .load_all(&[good, foreign.clone()])
        .unwrap_err();
    match err {
        DemError::Rejected { path, source } => {
            assert_eq!(path, foreign);
            assert_eq!(
                source,
                ValidationError::Projection {
                    expected: 26912,
                    actual: Some(32612)
                }
            );
        }
        other => panic!("unexpected error: {other}"),
    }
}
