//! Error types for compositing operations.

use thiserror::Error;

/// Result type for compositing operations.
pub type ComposeResult<T> = Result<T, ComposeError>;

/// Errors that can occur in the compositing pipeline.
///
/// Every failure surfaces to the caller; a failed operation never yields a
/// silently blank image.
#[derive(Debug, Error)]
pub enum ComposeError {
    /// Image bytes could not be decoded (network truncation, unsupported
    /// format).
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    /// Source image has zero pixels.
    #[error("source image has zero pixels")]
    EmptyImage,

    /// Target dimensions must be non-zero.
    #[error("invalid target dimensions {width}x{height}")]
    InvalidTarget { width: u32, height: u32 },

    /// Explicit crop rectangle falls outside the source image.
    #[error("crop {crop_width}x{crop_height}+{x}+{y} exceeds source {src_width}x{src_height}")]
    InvalidCrop {
        x: u32,
        y: u32,
        crop_width: u32,
        crop_height: u32,
        src_width: u32,
        src_height: u32,
    },
}
