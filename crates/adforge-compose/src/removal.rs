//! Background removal: corner-sampled color estimate plus a border-seeded
//! flood fill.
//!
//! Two passes over the pixels. The first builds a flat mask of every pixel
//! within color tolerance of the background estimate; the second flood-fills
//! that mask from the image border and clears the alpha of every reached
//! pixel. Regions that match the background color but are enclosed by the
//! subject are unreachable from the border and stay opaque.

use crate::error::{ComposeError, ComposeResult};
use image::{Rgba, RgbaImage};

/// Default Euclidean RGB distance under which a pixel counts as background.
pub const DEFAULT_COLOR_TOLERANCE: f64 = 30.0;

/// Estimate the background color as the mean RGB of the four corner pixels.
pub fn estimate_background(image: &RgbaImage) -> ComposeResult<[f64; 3]> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(ComposeError::EmptyImage);
    }

    let corners = [
        (0, 0),
        (width - 1, 0),
        (0, height - 1),
        (width - 1, height - 1),
    ];
    let mut sum = [0.0f64; 3];
    for (x, y) in corners {
        let pixel = image.get_pixel(x, y);
        sum[0] += f64::from(pixel[0]);
        sum[1] += f64::from(pixel[1]);
        sum[2] += f64::from(pixel[2]);
    }
    Ok([sum[0] / 4.0, sum[1] / 4.0, sum[2] / 4.0])
}

/// Euclidean RGB distance between a pixel and the background estimate.
fn color_distance(pixel: &Rgba<u8>, estimate: [f64; 3]) -> f64 {
    let dr = f64::from(pixel[0]) - estimate[0];
    let dg = f64::from(pixel[1]) - estimate[1];
    let db = f64::from(pixel[2]) - estimate[2];
    (dr * dr + dg * dg + db * db).sqrt()
}

/// Remove the near-uniform background from a product photo.
///
/// Returns a copy of the image with every border-reachable background pixel
/// made fully transparent. `tolerance` is an Euclidean RGB distance; pass
/// [`DEFAULT_COLOR_TOLERANCE`] unless the caller has a better value.
pub fn remove_background(image: &RgbaImage, tolerance: f64) -> ComposeResult<RgbaImage> {
    let estimate = estimate_background(image)?;
    let (width, height) = image.dimensions();
    let (w, h) = (width as usize, height as usize);

    // Pass 1: candidate mask over flat pixel indices.
    let mut is_background = vec![false; w * h];
    for (x, y, pixel) in image.enumerate_pixels() {
        is_background[y as usize * w + x as usize] = color_distance(pixel, estimate) <= tolerance;
    }

    // Pass 2: flood fill seeded from every in-mask border pixel, 4-connected,
    // over a flat index stack.
    let mut reached = vec![false; w * h];
    let mut stack: Vec<usize> = Vec::new();

    let seed = |idx: usize, stack: &mut Vec<usize>, reached: &mut Vec<bool>| {
        if is_background[idx] && !reached[idx] {
            reached[idx] = true;
            stack.push(idx);
        }
    };
    for x in 0..w {
        seed(x, &mut stack, &mut reached);
        seed((h - 1) * w + x, &mut stack, &mut reached);
    }
    for y in 0..h {
        seed(y * w, &mut stack, &mut reached);
        seed(y * w + (w - 1), &mut stack, &mut reached);
    }

    while let Some(idx) = stack.pop() {
        let x = idx % w;
        let y = idx / w;
        if x > 0 {
            seed(idx - 1, &mut stack, &mut reached);
        }
        if x + 1 < w {
            seed(idx + 1, &mut stack, &mut reached);
        }
        if y > 0 {
            seed(idx - w, &mut stack, &mut reached);
        }
        if y + 1 < h {
            seed(idx + w, &mut stack, &mut reached);
        }
    }

    let cleared = reached.iter().filter(|r| **r).count();
    log::debug!(
        "background removal cleared {cleared}/{} pixels (tolerance {tolerance})",
        w * h
    );

    let mut output = image.clone();
    for (idx, hit) in reached.iter().enumerate() {
        if *hit {
            let pixel = output.get_pixel_mut((idx % w) as u32, (idx / w) as u32);
            pixel[3] = 0;
        }
    }
    Ok(output)
}
