//! Error types for raster decoding and terrain fusion.

use thiserror::Error;

/// Failure to turn a byte buffer into a [`Raster`](crate::Raster).
#[derive(Error, Debug)]
pub enum DecodeError {
    /// The byte buffer has no content.
    #[error("raster buffer is empty")]
    Empty,

    /// Not a recognized image format, or a layout this crate cannot split into bands.
    #[error("unsupported raster format: {0}")]
    UnsupportedFormat(String),

    /// Width or height is zero.
    #[error("raster declares zero dimensions ({width}×{height})")]
    ZeroDimensions { width: usize, height: usize },

    /// Fewer (or more) samples than `width * height * bands`.
    #[error("raster data is truncated: expected {expected} samples, found {actual}")]
    Truncated { expected: usize, actual: usize },

    /// Malformed or truncated TIFF.
    #[error("TIFF decoding failed: {0}")]
    Tiff(#[from] tiff::TiffError),

    /// Malformed or truncated PNG, JPEG, ...
    #[error("image decoding failed: {0}")]
    Image(#[from] image::ImageError),
}

/// Which of the two fusion inputs a decode failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RasterRole {
    /// The DSM supplying heights.
    Elevation,
    /// The image supplying texture colors.
    Color,
}

impl std::fmt::Display for RasterRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RasterRole::Elevation => f.write_str("elevation"),
            RasterRole::Color => f.write_str("color"),
        }
    }
}

/// Failure of a single fusion attempt.
///
/// A failed attempt never replaces the last successfully fused terrain.
#[derive(Error, Debug)]
pub enum FusionError {
    /// One of the inputs could not be decoded.
    #[error("failed to decode {which} raster: {source}")]
    Decode {
        which: RasterRole,
        #[source]
        source: DecodeError,
    },

    /// Elevation and color rasters differ in width or height, as `(width, height)`.
    #[error(
        "raster dimensions differ: elevation is {}×{}, color is {}×{}",
        .elevation.0, .elevation.1, .color.0, .color.1
    )]
    DimensionMismatch {
        elevation: (usize, usize),
        color: (usize, usize),
    },

    /// No elevation sample is finite and distinct from the no-data value.
    #[error("elevation raster contains no finite samples")]
    InvalidElevationData,

    /// Any other failure, tagged with the pipeline stage that raised it.
    #[error("{stage} stage failed: {message}")]
    Stage {
        stage: &'static str,
        message: String,
    },
}

impl FusionError {
    pub(crate) fn stage<T: ToString>(stage: &'static str, message: T) -> Self {
        FusionError::Stage {
            stage,
            message: message.to_string(),
        }
    }
}
