//! AVIF still image decoding

use crate::{Error, Result};
use image::DynamicImage;
use std::path::Path;

/// Decodes AVIF data into an RGBA image
pub fn decode_avif(data: &[u8]) -> Result<DynamicImage> {
    let img = libavif_image::read(data).map_err(|e| Error::AvifDecode(format!("{:?}", e)))?;

    Ok(DynamicImage::ImageRgba8(img.to_rgba8()))
}

/// Reads and decodes an AVIF file
pub fn decode_avif_file(path: &Path) -> Result<DynamicImage> {
    let data = std::fs::read(path)?;
    decode_avif(&data)
}
