//! gifer Codec Library
//!
//! This library implements the [`ImageCodec`] capability on top of the `image`
//! crate: still and animation decoding, resizing, alpha compositing and
//! animated GIF encoding.

#[cfg(feature = "avif")]
pub mod avif_decoder;
pub mod compositor;
pub mod decoder;
pub mod gif_encoder;
pub mod progress_tracker;
#[cfg(feature = "video")]
pub mod video_reader;

use gifer_core::{ImageCodec, Point, Size};
use image::codecs::gif::Repeat;
use image::{DynamicImage, RgbaImage};
use std::path::Path;

pub use progress_tracker::ProgressTracker;

/// Result type for gifer-codec operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for gifer-codec operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("gifer core error: {0}")]
    Core(#[from] gifer_core::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[cfg(feature = "video")]
    #[error("FFmpeg error: {0}")]
    Ffmpeg(#[from] ffmpeg_next::Error),

    #[cfg(feature = "avif")]
    #[error("AVIF decode error: {0}")]
    AvifDecode(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("No frames to encode")]
    NoFrames,

    #[cfg(feature = "video")]
    #[error("No video stream found")]
    NoVideoStream,
}

/// Encoder configuration
#[derive(Debug, Clone)]
pub struct EncoderConfig {
    /// GIF quantization speed (1 = best quality, 30 = fastest)
    pub speed: i32,
    /// Number of times the animation repeats (None = forever)
    pub repeat: Option<u16>,
}

impl EncoderConfig {
    pub(crate) fn gif_repeat(&self) -> Repeat {
        match self.repeat {
            Some(count) => Repeat::Finite(count),
            None => Repeat::Infinite,
        }
    }
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            speed: 10,
            repeat: None,
        }
    }
}

/// [`ImageCodec`] backed by the `image` crate
#[derive(Debug, Clone, Default)]
pub struct StandardCodec {
    config: EncoderConfig,
}

impl StandardCodec {
    /// Creates a new codec with the given encoder configuration
    pub fn new(config: EncoderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }
}

impl ImageCodec for StandardCodec {
    fn decode_still(&self, path: &Path) -> gifer_core::Result<DynamicImage> {
        decoder::decode_still(path).map_err(|e| gifer_core::Error::decode(path, e))
    }

    fn decode_animation(&self, path: &Path) -> gifer_core::Result<Vec<(DynamicImage, u64)>> {
        decoder::decode_animation(path).map_err(|e| gifer_core::Error::decode(path, e))
    }

    fn resize(&self, image: &DynamicImage, size: Size) -> DynamicImage {
        compositor::resize(image, size)
    }

    fn to_fixed_alpha(&self, image: &DynamicImage) -> RgbaImage {
        compositor::to_fixed_alpha(image)
    }

    fn alpha_composite(&self, canvas: &mut RgbaImage, overlay: &DynamicImage, at: Point) {
        compositor::overlay_image(canvas, overlay, at.x, at.y);
    }

    fn encode_sequence(&self, path: &Path, frames: &[(RgbaImage, f64)]) -> gifer_core::Result<()> {
        gif_encoder::encode_sequence(path, frames, &self.config)
            .map_err(|e| gifer_core::Error::encode(path, e))
    }
}
