//! Product-on-background composition: cover-fit scaling, fractional
//! placement, and a soft drop shadow.

use crate::error::{ComposeError, ComposeResult};
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

/// Product size as a fraction of the smaller output dimension at scale 1.0.
pub const PRODUCT_BASE_FRACTION: f64 = 0.5;
/// Caller-supplied scale factor bounds.
pub const PRODUCT_MIN_SCALE: f64 = 0.1;
pub const PRODUCT_MAX_SCALE: f64 = 3.0;

/// Drop shadow tuning.
const SHADOW_BLUR_SIGMA: f32 = 8.0;
const SHADOW_OFFSET_X: i64 = 0;
const SHADOW_OFFSET_Y: i64 = 10;
const SHADOW_OPACITY: f64 = 0.45;
/// Padding around the shadow silhouette so the blur has room to bleed.
const SHADOW_MARGIN: u32 = 24;

/// Where and how large the product lands on the output canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProductPlacement {
    /// Multiplier on the base product size, clamped to
    /// [`PRODUCT_MIN_SCALE`]..=[`PRODUCT_MAX_SCALE`].
    pub scale: f64,
    /// Horizontal center as a fraction of canvas width (0.5 = centered).
    pub x: f64,
    /// Vertical center as a fraction of canvas height (0.5 = centered).
    pub y: f64,
}

impl Default for ProductPlacement {
    fn default() -> Self {
        Self {
            scale: 1.0,
            x: 0.5,
            y: 0.5,
        }
    }
}

impl ProductPlacement {
    fn clamped(self) -> Self {
        Self {
            scale: self.scale.clamp(PRODUCT_MIN_SCALE, PRODUCT_MAX_SCALE),
            x: self.x.clamp(0.0, 1.0),
            y: self.y.clamp(0.0, 1.0),
        }
    }
}

fn check_target(width: u32, height: u32) -> ComposeResult<()> {
    if width == 0 || height == 0 {
        return Err(ComposeError::InvalidTarget { width, height });
    }
    Ok(())
}

/// Scale an image uniformly by the larger of the two fit ratios so it fully
/// covers `out_w x out_h`, centered; excess is cropped by the canvas.
pub fn cover_fit(image: &RgbaImage, out_w: u32, out_h: u32) -> ComposeResult<RgbaImage> {
    check_target(out_w, out_h)?;
    let (src_w, src_h) = image.dimensions();
    if src_w == 0 || src_h == 0 {
        return Err(ComposeError::EmptyImage);
    }

    let ratio = (f64::from(out_w) / f64::from(src_w)).max(f64::from(out_h) / f64::from(src_h));
    let scaled_w = ((f64::from(src_w) * ratio).round() as u32).max(1);
    let scaled_h = ((f64::from(src_h) * ratio).round() as u32).max(1);
    let scaled = imageops::resize(image, scaled_w, scaled_h, FilterType::Lanczos3);

    let mut canvas = RgbaImage::new(out_w, out_h);
    let left = (i64::from(out_w) - i64::from(scaled_w)) / 2;
    let top = (i64::from(out_h) - i64::from(scaled_h)) / 2;
    imageops::overlay(&mut canvas, &scaled, left, top);
    Ok(canvas)
}

/// Composite a (background-removed) product onto a generated background.
///
/// The background is cover-fitted to the output canvas; the product's larger
/// dimension is sized to `PRODUCT_BASE_FRACTION x min(out_w, out_h) x scale`
/// preserving its own aspect ratio, centered at the placement's fractional
/// coordinates, with a drop shadow underneath for depth.
pub fn compose_product(
    background: &RgbaImage,
    product: &RgbaImage,
    out_w: u32,
    out_h: u32,
    placement: ProductPlacement,
) -> ComposeResult<RgbaImage> {
    check_target(out_w, out_h)?;
    let (product_w, product_h) = product.dimensions();
    if product_w == 0 || product_h == 0 {
        return Err(ComposeError::EmptyImage);
    }

    let mut canvas = cover_fit(background, out_w, out_h)?;
    let placement = placement.clamped();

    let target = PRODUCT_BASE_FRACTION * f64::from(out_w.min(out_h)) * placement.scale;
    let ratio = target / f64::from(product_w.max(product_h));
    let scaled_w = ((f64::from(product_w) * ratio).round() as u32).max(1);
    let scaled_h = ((f64::from(product_h) * ratio).round() as u32).max(1);
    let scaled = imageops::resize(product, scaled_w, scaled_h, FilterType::Lanczos3);

    let center_x = placement.x * f64::from(out_w);
    let center_y = placement.y * f64::from(out_h);
    let left = (center_x - f64::from(scaled_w) / 2.0).round() as i64;
    let top = (center_y - f64::from(scaled_h) / 2.0).round() as i64;

    let shadow = shadow_silhouette(&scaled);
    imageops::overlay(
        &mut canvas,
        &shadow,
        left - i64::from(SHADOW_MARGIN) + SHADOW_OFFSET_X,
        top - i64::from(SHADOW_MARGIN) + SHADOW_OFFSET_Y,
    );
    imageops::overlay(&mut canvas, &scaled, left, top);
    Ok(canvas)
}

/// Blurred black silhouette of the product's alpha channel, padded so the
/// blur can bleed past the product bounds.
fn shadow_silhouette(product: &RgbaImage) -> RgbaImage {
    let (w, h) = product.dimensions();
    let mut silhouette = RgbaImage::new(w + 2 * SHADOW_MARGIN, h + 2 * SHADOW_MARGIN);
    for (x, y, pixel) in product.enumerate_pixels() {
        let alpha = (f64::from(pixel[3]) * SHADOW_OPACITY).round() as u8;
        silhouette.put_pixel(x + SHADOW_MARGIN, y + SHADOW_MARGIN, Rgba([0, 0, 0, alpha]));
    }
    imageops::blur(&silhouette, SHADOW_BLUR_SIGMA)
}
