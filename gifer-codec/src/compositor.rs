//! Pixel operations used while compositing layers

use gifer_core::Size;
use image::imageops::FilterType;
use image::{DynamicImage, RgbaImage};
use std::borrow::Cow;

/// Resizes an image to exactly `size` with a Lanczos filter
pub fn resize(image: &DynamicImage, size: Size) -> DynamicImage {
    image.resize_exact(size.width, size.height, FilterType::Lanczos3)
}

/// Converts any decoded image into an RGBA8 canvas
pub fn to_fixed_alpha(image: &DynamicImage) -> RgbaImage {
    image.to_rgba8()
}

/// Pastes one image onto another at the specified position
///
/// The overlay's alpha channel is the blend mask for all four channels;
/// canvas pixels outside the overlay's bounds are left untouched.
pub fn overlay_image(base: &mut RgbaImage, overlay: &DynamicImage, x: i32, y: i32) {
    let overlay: Cow<'_, RgbaImage> = match overlay.as_rgba8() {
        Some(rgba) => Cow::Borrowed(rgba),
        None => Cow::Owned(overlay.to_rgba8()),
    };

    let base_width = base.width() as i64;
    let base_height = base.height() as i64;
    let (x, y) = (x as i64, y as i64);

    // Calculate the region to copy
    let src_x_start = 0.max(-x);
    let src_y_start = 0.max(-y);
    let src_x_end = (overlay.width() as i64).min(base_width - x);
    let src_y_end = (overlay.height() as i64).min(base_height - y);

    if src_x_start >= src_x_end || src_y_start >= src_y_end {
        return;
    }

    for src_y in src_y_start..src_y_end {
        for src_x in src_x_start..src_x_end {
            let overlay_pixel = overlay.get_pixel(src_x as u32, src_y as u32);
            let alpha = overlay_pixel[3] as u32;
            if alpha == 0 {
                continue;
            }

            let base_pixel = base.get_pixel_mut((x + src_x) as u32, (y + src_y) as u32);
            if alpha == 255 {
                *base_pixel = *overlay_pixel;
                continue;
            }

            let inv_alpha = 255 - alpha;
            for channel in 0..4 {
                let blended = overlay_pixel[channel] as u32 * alpha + base_pixel[channel] as u32 * inv_alpha;
                base_pixel[channel] = ((blended + 127) / 255) as u8;
            }
        }
    }
}
