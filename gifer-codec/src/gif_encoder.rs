//! Animated GIF encoding

use crate::{EncoderConfig, Error, ProgressTracker, Result};
use image::codecs::gif::GifEncoder;
use image::{Delay, Frame, ImageFormat, RgbaImage};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Duration;
use tempfile::NamedTempFile;

/// Frames between two progress reports
const REPORT_INTERVAL: u64 = 25;

/// Encodes (canvas, duration in seconds) pairs into the format named by `path`
pub fn encode_sequence(path: &Path, frames: &[(RgbaImage, f64)], config: &EncoderConfig) -> Result<()> {
    match ImageFormat::from_path(path) {
        Ok(ImageFormat::Gif) => encode_gif(path, frames, config),
        _ => Err(Error::UnsupportedFormat(format!(
            "cannot write animations to {}",
            path.display()
        ))),
    }
}

/// Encodes a sequence of RGBA canvases as an animated GIF
pub fn encode_gif(path: &Path, frames: &[(RgbaImage, f64)], config: &EncoderConfig) -> Result<()> {
    if frames.is_empty() {
        return Err(Error::NoFrames);
    }

    // Frames go to a sibling temp file that only replaces `path` once complete
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut staging = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(staging.as_file_mut());
        {
            let mut encoder = GifEncoder::new_with_speed(&mut writer, config.speed.clamp(1, 30));
            encoder.set_repeat(config.gif_repeat())?;

            let tracker = ProgressTracker::new(frames.len() as u64, "Encoded frames");
            for (canvas, seconds) in frames {
                encoder.encode_frame(Frame::from_parts(canvas.clone(), 0, 0, frame_delay(*seconds)))?;
                tracker.increment_and_report(REPORT_INTERVAL);
            }
        }
        writer.flush()?;
    }
    staging.persist(path).map_err(|err| err.error)?;

    tracing::info!(path = %path.display(), frames = frames.len(), "wrote GIF");
    Ok(())
}

/// Converts a duration in seconds to a frame delay; invalid values become 0
fn frame_delay(seconds: f64) -> Delay {
    let duration = if seconds.is_finite() && seconds > 0.0 {
        Duration::try_from_secs_f64(seconds).unwrap_or(Duration::MAX)
    } else {
        Duration::ZERO
    };
    Delay::from_saturating_duration(duration)
}
