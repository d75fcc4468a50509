//! Per-layer registration options

use crate::frame::{Point, Position, Resolver, Size, SizeSpec, Window};
use crate::{Error, Result};
use std::path::Path;

/// Kind of source a layer is decoded from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum LayerKind {
    /// A single still image
    Still,
    /// A multi-frame animation with per-frame durations
    Animation,
}

/// File extensions registered as animations when the kind is not given
const ANIMATION_EXTENSIONS: &[&str] = &["gif", "apng", "webp", "mp4", "mov", "mkv", "webm", "avi"];

impl LayerKind {
    /// Infers the layer kind from a file extension
    pub fn from_path(path: &Path) -> Self {
        let is_animation = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                ANIMATION_EXTENSIONS
                    .iter()
                    .any(|candidate| candidate.eq_ignore_ascii_case(ext))
            })
            .unwrap_or(false);

        if is_animation {
            LayerKind::Animation
        } else {
            LayerKind::Still
        }
    }
}

/// Options for registering one layer
#[derive(Debug, Clone, Default)]
pub struct LayerOptions {
    /// Explicit layer number (None = next automatic layer)
    pub layer: Option<u32>,
    /// Drawn size
    pub size: SizeSpec,
    /// Placement on the canvas
    pub position: Position,
    /// Start of the visibility window in milliseconds
    pub start: u64,
    /// End of the visibility window in milliseconds (None = unbounded)
    pub end: Option<u64>,
    /// Replicate the animation until the timeline bound
    pub looped: bool,
}

impl LayerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn layer(mut self, layer: u32) -> Self {
        self.layer = Some(layer);
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.size = SizeSpec::Exact(Size::new(width, height));
        self
    }

    pub fn ratio(mut self, ratio: f64) -> Self {
        self.size = SizeSpec::Ratio(ratio);
        self
    }

    pub fn position(mut self, position: impl Into<Position>) -> Self {
        self.position = position.into();
        self
    }

    pub fn at(self, x: i32, y: i32) -> Self {
        self.position(Point::new(x, y))
    }

    pub fn resolved_by(self, resolver: Resolver) -> Self {
        self.position(resolver)
    }

    pub fn start(mut self, start: u64) -> Self {
        self.start = start;
        self
    }

    pub fn end(mut self, end: u64) -> Self {
        self.end = Some(end);
        self
    }

    pub fn looped(mut self, looped: bool) -> Self {
        self.looped = looped;
        self
    }

    /// Visibility window described by `start`/`end`
    pub fn window(&self) -> Window {
        Window::new(self.start, self.end)
    }

    /// Validates the options before any decoding happens
    ///
    /// `establishes_base` is set when this registration defines the base layer,
    /// whose length bounds the whole output.
    pub fn validate(&self, kind: LayerKind, establishes_base: bool) -> Result<()> {
        if let Some(end) = self.end {
            if end < self.start {
                return Err(Error::configuration(format!(
                    "window ends at {end}ms before it starts at {}ms",
                    self.start
                )));
            }
        }

        match self.size {
            SizeSpec::Ratio(ratio) if !(ratio.is_finite() && ratio > 0.0) => {
                return Err(Error::configuration(format!("invalid size ratio {ratio}")));
            }
            SizeSpec::Exact(size) if size.is_empty() => {
                return Err(Error::configuration(format!(
                    "invalid size {}x{}",
                    size.width, size.height
                )));
            }
            _ => {}
        }

        if !establishes_base {
            return Ok(());
        }

        if self.start > 0 {
            return Err(Error::configuration(format!(
                "base layer must start at 0, got {}ms",
                self.start
            )));
        }

        match kind {
            LayerKind::Still if self.end.is_none() => Err(Error::configuration(
                "base still image needs an end: it defines the output length",
            )),
            LayerKind::Animation if self.looped && self.end.is_none() => Err(Error::configuration(
                "looping base animation needs an end: it defines the output length",
            )),
            _ => Ok(()),
        }
    }
}
