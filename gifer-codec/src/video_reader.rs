//! Video decoding into timed frames using FFmpeg

use crate::{Error, Result};
use ffmpeg_next as ffmpeg;
use image::{DynamicImage, RgbaImage};
use std::path::Path;

/// File extensions decoded through FFmpeg
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "mkv", "webm", "avi"];

/// Video reader that extracts frames with their display durations
pub struct VideoReader {
    input: ffmpeg::format::context::Input,
    video_stream_index: usize,
    decoder: ffmpeg::codec::decoder::Video,
    frame_rate: (u32, u32),
}

impl VideoReader {
    /// Opens a video file
    pub fn open(path: &Path) -> Result<Self> {
        ffmpeg::init()?;

        let input = ffmpeg::format::input(&path)?;

        let video_stream = input
            .streams()
            .best(ffmpeg::media::Type::Video)
            .ok_or(Error::NoVideoStream)?;
        let video_stream_index = video_stream.index();

        let rate = match video_stream.avg_frame_rate() {
            rate if rate.numerator() > 0 && rate.denominator() > 0 => rate,
            _ => video_stream.rate(),
        };
        if rate.numerator() <= 0 || rate.denominator() <= 0 {
            return Err(Error::UnsupportedFormat(format!(
                "{} has no usable frame rate",
                path.display()
            )));
        }
        let frame_rate = (rate.numerator() as u32, rate.denominator() as u32);

        let context = ffmpeg::codec::context::Context::from_parameters(video_stream.parameters())?;
        let decoder = context.decoder().video()?;

        Ok(Self {
            input,
            video_stream_index,
            decoder,
            frame_rate,
        })
    }

    /// Gets the frame rate as a rational number (numerator, denominator)
    pub fn frame_rate(&self) -> (u32, u32) {
        self.frame_rate
    }

    /// Instant at which the frame with the given index starts, in milliseconds
    fn frame_start_ms(&self, index: u64) -> u64 {
        let (num, den) = self.frame_rate;
        (index * 1000 * den as u64 + num as u64 / 2) / num as u64
    }

    /// Reads every frame; durations follow the stream's frame rate
    pub fn read_frames(&mut self) -> Result<Vec<(DynamicImage, u64)>> {
        let mut scaler = ffmpeg::software::scaling::Context::get(
            self.decoder.format(),
            self.decoder.width(),
            self.decoder.height(),
            ffmpeg::format::Pixel::RGBA,
            self.decoder.width(),
            self.decoder.height(),
            ffmpeg::software::scaling::Flags::BILINEAR,
        )?;

        let mut images = Vec::new();
        let mut receive_decoded_frames = |decoder: &mut ffmpeg::decoder::Video| -> Result<()> {
            let mut decoded = ffmpeg::frame::Video::empty();
            while decoder.receive_frame(&mut decoded).is_ok() {
                let mut rgba_frame = ffmpeg::frame::Video::empty();
                scaler.run(&decoded, &mut rgba_frame)?;
                images.push(to_rgba_image(&rgba_frame)?);
            }
            Ok(())
        };

        for (stream, packet) in self.input.packets() {
            if stream.index() == self.video_stream_index {
                self.decoder.send_packet(&packet)?;
                receive_decoded_frames(&mut self.decoder)?;
            }
        }

        self.decoder.send_eof()?;
        receive_decoded_frames(&mut self.decoder)?;

        let frames = images
            .into_iter()
            .enumerate()
            .map(|(index, image)| {
                let index = index as u64;
                let duration = self.frame_start_ms(index + 1) - self.frame_start_ms(index);
                (DynamicImage::ImageRgba8(image), duration)
            })
            .collect();

        Ok(frames)
    }
}

/// Copies an RGBA frame into an image buffer, dropping row padding
fn to_rgba_image(frame: &ffmpeg::frame::Video) -> Result<RgbaImage> {
    let width = frame.width();
    let height = frame.height();
    let stride = frame.stride(0);
    let row_bytes = width as usize * 4;
    let data = frame.data(0);

    let mut pixels = Vec::with_capacity(row_bytes * height as usize);
    for y in 0..height as usize {
        let offset = y * stride;
        pixels.extend_from_slice(&data[offset..offset + row_bytes]);
    }

    RgbaImage::from_raw(width, height, pixels)
        .ok_or_else(|| Error::UnsupportedFormat("truncated RGBA frame".into()))
}
