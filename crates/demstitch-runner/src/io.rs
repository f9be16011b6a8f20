//! Blob and PNG files.

use crate::{Result, RunnerError};
use demstitch_raster::{decode_blob, encode_blob, BlobElement, Canvas};
use image::GrayImage;
use std::path::Path;
use tracing::debug;

/// Read a blob file into a canvas of `T`.
pub fn read_blob<T: BlobElement, P: AsRef<Path>>(path: P) -> Result<Canvas<T>> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| RunnerError::io(path, e))?;
    let canvas = decode_blob(&bytes)?;
    debug!(
        "Read {}x{} blob from {}",
        canvas.height(),
        canvas.width(),
        path.display()
    );
    Ok(canvas)
}

/// Write a canvas to a blob file.
pub fn write_blob<T: BlobElement, P: AsRef<Path>>(path: P, canvas: &Canvas<T>) -> Result<()> {
    let path = path.as_ref();
    let bytes = encode_blob(canvas)?;
    std::fs::write(path, &bytes).map_err(|e| RunnerError::io(path, e))?;
    debug!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

/// Write an 8-bit canvas as a grayscale PNG.
pub fn write_png<P: AsRef<Path>>(path: P, canvas: &Canvas<u8>) -> Result<()> {
    let path = path.as_ref();
    let (width, height) = (to_u32(canvas.width())?, to_u32(canvas.height())?);
    let image = GrayImage::from_raw(width, height, canvas.as_slice().to_vec()).ok_or_else(|| {
        RunnerError::Config(format!("{}x{} canvas does not fit an image", height, width))
    })?;
    image.save_with_format(path, image::ImageFormat::Png)?;
    debug!("Wrote {}x{} PNG to {}", height, width, path.display());
    Ok(())
}

/// Read a PNG (or any supported image) as an 8-bit grayscale canvas.
pub fn read_png<P: AsRef<Path>>(path: P) -> Result<Canvas<u8>> {
    let image = image::open(path.as_ref())?.into_luma8();
    let (width, height) = image.dimensions();
    Ok(Canvas::from_vec(
        width as usize,
        height as usize,
        image.into_raw(),
    )?)
}

fn to_u32(value: usize) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| RunnerError::Config(format!("dimension {} too large for an image", value)))
}
