//! Error types for the raster crate.

use thiserror::Error;

/// Reasons a tile is rejected before it reaches the mosaic.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// The geo-transform has non-zero rotation/shear terms.
    #[error("rotated or sheared geo-transform (rotation terms {rotation_x}, {rotation_y})")]
    RotatedTransform {
        /// Row rotation term.
        rotation_x: f64,
        /// Column rotation term.
        rotation_y: f64,
    },

    /// A geo-transform coefficient is NaN or infinite.
    #[error("non-finite geo-transform coefficient")]
    NonFiniteTransform,

    /// Pixel width or height is zero.
    #[error("zero pixel pitch")]
    ZeroPitch,

    /// Pixel width and height differ in magnitude.
    #[error("non-square pixels: width {width}, height {height}")]
    NonSquarePixels {
        /// Pixel width.
        width: f64,
        /// Pixel height.
        height: f64,
    },

    /// Pixel pitch differs from the one required by the ingestion path.
    #[error("unexpected pixel pitch {actual} (expected {expected})")]
    UnexpectedPitch {
        /// Required pitch.
        expected: f64,
        /// Pitch found in the tile.
        actual: f64,
    },

    /// Sample array length does not match the declared dimensions.
    #[error("tile declares {width}x{height} pixels but holds {actual} samples")]
    SampleCount {
        /// Declared width.
        width: u32,
        /// Declared height.
        height: u32,
        /// Number of samples actually present.
        actual: usize,
    },

    /// The raster has more than one band.
    #[error("expected a single band, found {0}")]
    BandCount(u16),

    /// The tile is in an unexpected projection.
    #[error("unexpected projection {actual:?} (expected EPSG:{expected})")]
    Projection {
        /// Required EPSG code.
        expected: u16,
        /// EPSG code found in the tile, if any.
        actual: Option<u16>,
    },

    /// The tile does not have the expected pixel dimensions.
    #[error("unexpected tile size {width}x{height} (expected {expected_width}x{expected_height})")]
    UnexpectedSize {
        /// Tile width.
        width: u32,
        /// Tile height.
        height: u32,
        /// Required width.
        expected_width: u32,
        /// Required height.
        expected_height: u32,
    },

    /// Every sample of the tile is missing.
    #[error("tile holds no elevation data")]
    AllMissing,
}

/// Errors raised by the mosaic and canvas pipeline.
#[derive(Debug, Error)]
pub enum RasterError {
    /// A tile failed validation.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// No tiles were supplied.
    #[error("no tiles to assemble")]
    EmptyInput,

    /// Tiles with different pixel pitch were composited together.
    #[error("mixed pixel pitch: {first} and {other}")]
    MixedPitch {
        /// Pitch of the first tile.
        first: f64,
        /// Conflicting pitch.
        other: f64,
    },

    /// A tile edge is not a whole number of pixels away from the grid anchor.
    #[error("tile edge {value} is not a whole number of {pitch} pixels from grid anchor {anchor}")]
    MisalignedOrigin {
        /// Offending edge coordinate.
        value: f64,
        /// Matching edge of the tile the grid is anchored on.
        anchor: f64,
        /// Pixel pitch.
        pitch: f64,
    },

    /// Extent bounds are inverted or too large to allocate.
    #[error("invalid extent x {min_x}..={max_x}, y {min_y}..={max_y}")]
    InvalidExtent {
        /// Western-most grid column.
        min_x: i64,
        /// Southern-most grid row.
        min_y: i64,
        /// Eastern-most grid column.
        max_x: i64,
        /// Northern-most grid row.
        max_y: i64,
    },

    /// A tile does not fit inside the canvas extent.
    #[error("tile window at ({col}, {row}) size {width}x{height} exceeds canvas {canvas_width}x{canvas_height}")]
    WindowOutOfBounds {
        /// Signed column of the window's west edge.
        col: i64,
        /// Signed row of the window's north edge.
        row: i64,
        /// Window width.
        width: u32,
        /// Window height.
        height: u32,
        /// Canvas width.
        canvas_width: usize,
        /// Canvas height.
        canvas_height: usize,
    },

    /// Buffer length does not match canvas dimensions.
    #[error("buffer of {actual} elements does not match {width}x{height}")]
    ShapeMismatch {
        /// Canvas width.
        width: usize,
        /// Canvas height.
        height: usize,
        /// Buffer length.
        actual: usize,
    },

    /// Decimation factor must be at least 1.
    #[error("invalid decimation factor {0}")]
    InvalidFactor(u32),

    /// Value range cannot be normalized or quantized.
    #[error("degenerate value range: {0}")]
    DegenerateRange(String),

    /// Blob is shorter than its header promises.
    #[error("truncated blob at offset {offset}: expected {expected} bytes, found {actual}")]
    TruncatedBlob {
        /// Byte offset where the shortfall was detected.
        offset: usize,
        /// Bytes required from that offset.
        expected: usize,
        /// Bytes actually available from that offset.
        actual: usize,
    },

    /// Blob header is inconsistent with itself or with the payload.
    #[error("malformed blob header at offset {offset}: {message}")]
    MalformedHeader {
        /// Byte offset of the offending field.
        offset: usize,
        /// Description of the problem.
        message: String,
    },
}

impl RasterError {
    /// Create a malformed-header error at a specific offset.
    pub fn malformed_at(offset: usize, message: impl Into<String>) -> Self {
        RasterError::MalformedHeader {
            offset,
            message: message.into(),
        }
    }

    /// Create a degenerate-range error.
    pub fn degenerate(message: impl Into<String>) -> Self {
        RasterError::DegenerateRange(message.into())
    }
}
