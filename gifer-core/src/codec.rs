//! Image codec capability consumed by the timeline

use crate::frame::{Point, Size};
use crate::Result;
use image::{DynamicImage, RgbaImage};
use std::path::Path;

/// Decoding, pixel and encoding primitives the timeline is built on
///
/// Durations handed out by [`ImageCodec::decode_animation`] are milliseconds;
/// durations handed to [`ImageCodec::encode_sequence`] are seconds.
pub trait ImageCodec {
    /// Decodes a single still image
    fn decode_still(&self, path: &Path) -> Result<DynamicImage>;

    /// Decodes an animation into ordered (sub-image, duration in ms) pairs
    fn decode_animation(&self, path: &Path) -> Result<Vec<(DynamicImage, u64)>>;

    /// Resizes an image to exactly `size`
    fn resize(&self, image: &DynamicImage, size: Size) -> DynamicImage;

    /// Converts an image into the fixed-alpha canvas format
    fn to_fixed_alpha(&self, image: &DynamicImage) -> RgbaImage;

    /// Pastes `overlay` onto `canvas` at `at`, using the overlay's alpha as the mask
    fn alpha_composite(&self, canvas: &mut RgbaImage, overlay: &DynamicImage, at: Point);

    /// Writes the (canvas, duration in seconds) sequence as an animation file
    fn encode_sequence(&self, path: &Path, frames: &[(RgbaImage, f64)]) -> Result<()>;
}

impl<C: ImageCodec + ?Sized> ImageCodec for &C {
    fn decode_still(&self, path: &Path) -> Result<DynamicImage> {
        (**self).decode_still(path)
    }

    fn decode_animation(&self, path: &Path) -> Result<Vec<(DynamicImage, u64)>> {
        (**self).decode_animation(path)
    }

    fn resize(&self, image: &DynamicImage, size: Size) -> DynamicImage {
        (**self).resize(image, size)
    }

    fn to_fixed_alpha(&self, image: &DynamicImage) -> RgbaImage {
        (**self).to_fixed_alpha(image)
    }

    fn alpha_composite(&self, canvas: &mut RgbaImage, overlay: &DynamicImage, at: Point) {
        (**self).alpha_composite(canvas, overlay, at)
    }

    fn encode_sequence(&self, path: &Path, frames: &[(RgbaImage, f64)]) -> Result<()> {
        (**self).encode_sequence(path, frames)
    }
}
