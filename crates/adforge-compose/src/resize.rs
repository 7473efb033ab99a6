//! Aspect-ratio-aware crop and fit resizing for per-format image adaptation.

use crate::error::{ComposeError, ComposeResult};
use image::RgbaImage;
use image::imageops::{self, FilterType};

/// A crop rectangle in source-image pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

fn check_target(width: u32, height: u32) -> ComposeResult<()> {
    if width == 0 || height == 0 {
        return Err(ComposeError::InvalidTarget { width, height });
    }
    Ok(())
}

/// Compute the centered crop rectangle whose aspect ratio matches the
/// target.
///
/// When the source is proportionally wider than the target, the crop takes
/// the full height and a centered horizontal slice; otherwise the full width
/// and a centered vertical slice. The result fills the target exactly with
/// no distortion, sacrificing the minimum necessary source content.
pub fn auto_crop_rect(
    src_w: u32,
    src_h: u32,
    target_w: u32,
    target_h: u32,
) -> ComposeResult<CropRect> {
    if src_w == 0 || src_h == 0 {
        return Err(ComposeError::EmptyImage);
    }
    check_target(target_w, target_h)?;

    let src_aspect = f64::from(src_w) / f64::from(src_h);
    let target_aspect = f64::from(target_w) / f64::from(target_h);

    if src_aspect > target_aspect {
        let width = ((f64::from(src_h) * target_aspect).round() as u32).clamp(1, src_w);
        Ok(CropRect {
            x: (src_w - width) / 2,
            y: 0,
            width,
            height: src_h,
        })
    } else {
        let height = ((f64::from(src_w) / target_aspect).round() as u32).clamp(1, src_h);
        Ok(CropRect {
            x: 0,
            y: (src_h - height) / 2,
            width: src_w,
            height,
        })
    }
}

/// Crop-mode resize: crop to the target aspect (automatically when no rect
/// is given), then scale to exactly `target_w x target_h`.
pub fn resize_to_fill(
    image: &RgbaImage,
    target_w: u32,
    target_h: u32,
    crop: Option<CropRect>,
) -> ComposeResult<RgbaImage> {
    check_target(target_w, target_h)?;
    let (src_w, src_h) = image.dimensions();

    let crop = match crop {
        Some(rect) => {
            let in_bounds = rect.width > 0
                && rect.height > 0
                && rect.x.checked_add(rect.width).is_some_and(|right| right <= src_w)
                && rect.y.checked_add(rect.height).is_some_and(|bottom| bottom <= src_h);
            if !in_bounds {
                return Err(ComposeError::InvalidCrop {
                    x: rect.x,
                    y: rect.y,
                    crop_width: rect.width,
                    crop_height: rect.height,
                    src_width: src_w,
                    src_height: src_h,
                });
            }
            rect
        }
        None => auto_crop_rect(src_w, src_h, target_w, target_h)?,
    };

    let cropped = imageops::crop_imm(image, crop.x, crop.y, crop.width, crop.height).to_image();
    Ok(imageops::resize(
        &cropped,
        target_w,
        target_h,
        FilterType::Lanczos3,
    ))
}

/// Fit-mode resize: scale the entire source to fit inside the target box,
/// preserving aspect ratio. No cropping; the caller letterboxes the rest.
pub fn resize_to_fit(image: &RgbaImage, target_w: u32, target_h: u32) -> ComposeResult<RgbaImage> {
    check_target(target_w, target_h)?;
    let (src_w, src_h) = image.dimensions();
    if src_w == 0 || src_h == 0 {
        return Err(ComposeError::EmptyImage);
    }

    let ratio = (f64::from(target_w) / f64::from(src_w)).min(f64::from(target_h) / f64::from(src_h));
    let width = ((f64::from(src_w) * ratio).round() as u32).max(1);
    let height = ((f64::from(src_h) * ratio).round() as u32).max(1);
    Ok(imageops::resize(image, width, height, FilterType::Lanczos3))
}
