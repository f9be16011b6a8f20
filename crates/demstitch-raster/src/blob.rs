//! Binary blob encoding of canvases.
//!
//! ## Blob Format
//!
//! | Field   | Size (bytes)            | Description                                 |
//! |---------|-------------------------|---------------------------------------------|
//! | dim0    | 4                       | Row count, signed 32-bit little-endian.     |
//! | dim1    | 4                       | Column count, signed 32-bit little-endian.  |
//! | payload | dim0 * dim1 * elem size | Samples in row-major order, little-endian.  |
//!
//! The element type (`f32` for elevation, `u8` for quantized images) is not
//! recorded; the reader must know what it expects. There is no padding and
//! no checksum. Blobs written with 8-byte dimension fields are not readable.

use crate::{Canvas, RasterError, Result};

/// Size of one dimension field in the header.
pub const DIM_FIELD_SIZE: usize = 4;

/// Total header size.
pub const HEADER_SIZE: usize = 2 * DIM_FIELD_SIZE;

/// A sample type that can be stored in a blob payload.
pub trait BlobElement: Copy {
    /// Encoded size in bytes.
    const SIZE: usize;

    /// Append the little-endian encoding of `self`.
    fn write_le(self, buf: &mut Vec<u8>);

    /// Decode from exactly `SIZE` little-endian bytes.
    fn read_le(bytes: &[u8]) -> Self;
}

impl BlobElement for f32 {
    const SIZE: usize = 4;

    fn write_le(self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.to_le_bytes());
    }

    fn read_le(bytes: &[u8]) -> Self {
        f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
    }
}

impl BlobElement for u8 {
    const SIZE: usize = 1;

    fn write_le(self, buf: &mut Vec<u8>) {
        buf.push(self);
    }

    fn read_le(bytes: &[u8]) -> Self {
        bytes[0]
    }
}

fn encode_dim(value: usize, offset: usize) -> Result<[u8; DIM_FIELD_SIZE]> {
    let value = i32::try_from(value)
        .map_err(|_| RasterError::malformed_at(offset, format!("dimension {} exceeds i32", value)))?;
    Ok(value.to_le_bytes())
}

/// Both dimensions are zero or neither is.
fn check_zero_dims(dim0: usize, dim1: usize) -> Result<()> {
    if (dim0 == 0) != (dim1 == 0) {
        let offset = if dim0 == 0 { 0 } else { DIM_FIELD_SIZE };
        return Err(RasterError::malformed_at(
            offset,
            format!("zero dimension in {}x{} header", dim0, dim1),
        ));
    }
    Ok(())
}

/// Encode a canvas as a blob.
///
/// A canvas with exactly one zero dimension has no blob form and is rejected.
pub fn encode_blob<T: BlobElement>(canvas: &Canvas<T>) -> Result<Vec<u8>> {
    let (dim0, dim1) = canvas.shape();
    check_zero_dims(dim0, dim1)?;
    let mut buf = Vec::with_capacity(HEADER_SIZE + canvas.len() * T::SIZE);

    buf.extend_from_slice(&encode_dim(dim0, 0)?);
    buf.extend_from_slice(&encode_dim(dim1, DIM_FIELD_SIZE)?);

    for &v in canvas.as_slice() {
        v.write_le(&mut buf);
    }

    Ok(buf)
}

fn read_dim(bytes: &[u8], offset: usize) -> Result<usize> {
    let field = &bytes[offset..offset + DIM_FIELD_SIZE];
    let value = i32::from_le_bytes([field[0], field[1], field[2], field[3]]);
    usize::try_from(value)
        .map_err(|_| RasterError::malformed_at(offset, format!("negative dimension {}", value)))
}

/// Decode a blob into a canvas of `T`.
pub fn decode_blob<T: BlobElement>(bytes: &[u8]) -> Result<Canvas<T>> {
    if bytes.len() < HEADER_SIZE {
        return Err(RasterError::TruncatedBlob {
            offset: 0,
            expected: HEADER_SIZE,
            actual: bytes.len(),
        });
    }

    let dim0 = read_dim(bytes, 0)?;
    let dim1 = read_dim(bytes, DIM_FIELD_SIZE)?;
    let payload = &bytes[HEADER_SIZE..];
    check_zero_dims(dim0, dim1)?;

    let expected = dim0
        .checked_mul(dim1)
        .and_then(|n| n.checked_mul(T::SIZE))
        .ok_or_else(|| {
            RasterError::malformed_at(0, format!("{}x{} payload size overflows", dim0, dim1))
        })?;

    if payload.len() < expected {
        return Err(RasterError::TruncatedBlob {
            offset: HEADER_SIZE,
            expected,
            actual: payload.len(),
        });
    }
    if payload.len() > expected {
        return Err(RasterError::malformed_at(
            HEADER_SIZE + expected,
            format!(
                "header promises {} payload bytes but {} are present",
                expected,
                payload.len()
            ),
        ));
    }

    let data: Vec<T> = payload.chunks_exact(T::SIZE).map(T::read_le).collect();
    Canvas::from_vec(dim1, dim0, data)
}
