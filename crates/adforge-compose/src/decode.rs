//! Image decoding entry point for the pipeline.

use crate::error::ComposeResult;
use image::RgbaImage;

/// Decode raw image bytes (PNG/JPEG/WebP) into an RGBA buffer.
///
/// Decode failures surface as [`ComposeError::Decode`] so callers can show a
/// retryable message; a failed decode never produces a blank image.
///
/// [`ComposeError::Decode`]: crate::error::ComposeError::Decode
pub fn decode_rgba(bytes: &[u8]) -> ComposeResult<RgbaImage> {
    let dynamic = image::load_from_memory(bytes)?;
    Ok(dynamic.to_rgba8())
}
