//! Still image and animation decoding

use crate::{Error, Result};
use gifer_core::LayerKind;
use image::codecs::gif::GifDecoder;
use image::codecs::png::PngDecoder;
use image::codecs::webp::WebPDecoder;
use image::{AnimationDecoder, Delay, DynamicImage, Frames, ImageFormat, ImageReader};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Decodes a single still image, guessing the format from its content
pub fn decode_still(path: &Path) -> Result<DynamicImage> {
    #[cfg(feature = "avif")]
    if has_extension(path, &["avif"]) {
        return crate::avif_decoder::decode_avif_file(path);
    }

    let image = ImageReader::open(path)?.with_guessed_format()?.decode()?;
    tracing::debug!(
        path = %path.display(),
        width = image.width(),
        height = image.height(),
        "decoded still image"
    );
    Ok(image)
}

/// Decodes an animation into (sub-image, duration in ms) pairs
///
/// GIF, APNG and animated WebP are decoded frame by frame with their own
/// delays; a non-animated PNG or WebP yields one sub-image lasting 0ms.
pub fn decode_animation(path: &Path) -> Result<Vec<(DynamicImage, u64)>> {
    #[cfg(feature = "video")]
    if has_extension(path, crate::video_reader::VIDEO_EXTENSIONS) {
        return crate::video_reader::VideoReader::open(path)?.read_frames();
    }

    let format = ImageReader::open(path)?.with_guessed_format()?.format();
    let reader = || -> Result<BufReader<File>> { Ok(BufReader::new(File::open(path)?)) };

    let frames = match format {
        Some(ImageFormat::Gif) => collect_frames(GifDecoder::new(reader()?)?.into_frames())?,
        Some(ImageFormat::Png) => {
            let decoder = PngDecoder::new(reader()?)?;
            if decoder.is_apng()? {
                collect_frames(decoder.apng()?.into_frames())?
            } else {
                vec![(DynamicImage::from_decoder(decoder)?, 0)]
            }
        }
        Some(ImageFormat::WebP) => {
            let decoder = WebPDecoder::new(reader()?)?;
            if decoder.has_animation() {
                collect_frames(decoder.into_frames())?
            } else {
                vec![(DynamicImage::from_decoder(decoder)?, 0)]
            }
        }
        other => {
            return Err(Error::UnsupportedFormat(format!(
                "{} is not an animation ({other:?})",
                path.display()
            )))
        }
    };

    tracing::debug!(
        path = %path.display(),
        frames = frames.len(),
        "decoded animation"
    );
    Ok(frames)
}

/// Infers the layer kind of a file from its content
///
/// PNG and WebP are animations only when they carry more than one frame;
/// files `image` cannot identify fall back to their extension.
pub fn detect_kind(path: &Path) -> Result<LayerKind> {
    let format = ImageReader::open(path)?.with_guessed_format()?.format();
    let reader = || -> Result<BufReader<File>> { Ok(BufReader::new(File::open(path)?)) };

    let kind = match format {
        Some(ImageFormat::Gif) => LayerKind::Animation,
        Some(ImageFormat::Png) if PngDecoder::new(reader()?)?.is_apng()? => LayerKind::Animation,
        Some(ImageFormat::WebP) if WebPDecoder::new(reader()?)?.has_animation() => LayerKind::Animation,
        Some(_) => LayerKind::Still,
        None => LayerKind::from_path(path),
    };
    Ok(kind)
}

fn collect_frames(frames: Frames<'_>) -> Result<Vec<(DynamicImage, u64)>> {
    frames
        .map(|frame| -> Result<(DynamicImage, u64)> {
            let frame = frame?;
            let duration = delay_ms(frame.delay());
            Ok((DynamicImage::ImageRgba8(frame.into_buffer()), duration))
        })
        .collect()
}

/// Converts a frame delay to whole milliseconds, rounding to nearest
pub fn delay_ms(delay: Delay) -> u64 {
    let (numer, denom) = delay.numer_denom_ms();
    let (numer, denom) = (numer as u64, denom.max(1) as u64);
    (numer + denom / 2) / denom
}

#[cfg(any(feature = "avif", feature = "video"))]
pub(crate) fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| extensions.iter().any(|candidate| candidate.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}
