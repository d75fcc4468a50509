//! Frame data structures for gifer timelines

use crate::{Error, Result};
use image::{DynamicImage, GenericImageView, RgbaImage};
use std::fmt;
use std::sync::Arc;

/// A 2D integer coordinate relative to the top-left corner of the canvas
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "(i32, i32)", into = "(i32, i32)"))]
pub struct Point {
    /// Horizontal offset (can be negative for partially off-canvas overlays)
    pub x: i32,
    /// Vertical offset
    pub y: i32,
}

impl Point {
    /// Creates a new point
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

impl From<Point> for (i32, i32) {
    fn from(point: Point) -> Self {
        (point.x, point.y)
    }
}

/// Pixel dimensions of an image
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "(u32, u32)", into = "(u32, u32)"))]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    /// Creates a new size
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Natural size of a decoded image
    pub fn of(image: &DynamicImage) -> Self {
        let (width, height) = image.dimensions();
        Self { width, height }
    }

    /// Scales both dimensions by `ratio`, truncating and never collapsing below one pixel
    pub fn scaled(self, ratio: f64) -> Self {
        let scale = |v: u32| ((v as f64 * ratio) as u32).max(1);
        Self {
            width: scale(self.width),
            height: scale(self.height),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl From<(u32, u32)> for Size {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

impl From<Size> for (u32, u32) {
    fn from(size: Size) -> Self {
        (size.width, size.height)
    }
}

/// How the drawn size of a layer is derived from its source
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum SizeSpec {
    /// Keep the decoded image's natural size
    #[default]
    Natural,
    /// Resize to an explicit size
    Exact(Size),
    /// Scale both natural dimensions by a ratio
    Ratio(f64),
}

impl SizeSpec {
    /// Computes the effective size for an image with the given natural size
    pub fn resolve(&self, natural: Size) -> Size {
        match *self {
            SizeSpec::Natural => natural,
            SizeSpec::Exact(size) => size,
            SizeSpec::Ratio(ratio) => natural.scaled(ratio),
        }
    }
}

/// Visibility window of a frame, in timeline milliseconds
///
/// `end == None` means the window never closes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Window {
    pub start: u64,
    pub end: Option<u64>,
}

impl Window {
    /// Creates a new window
    pub const fn new(start: u64, end: Option<u64>) -> Self {
        Self { start, end }
    }

    /// Checks if the window covers the given instant
    ///
    /// The start instant itself is excluded, except for windows opening at the
    /// timeline origin, which also cover instant 0. The end instant is included.
    pub fn contains(&self, instant: u64) -> bool {
        let opened = self.start < instant || self.start == 0;
        opened && self.end.map_or(true, |end| end >= instant)
    }
}

/// Error returned by a failing position resolver
pub type ResolverError = Box<dyn std::error::Error + Send + Sync>;

type ResolveFn = dyn Fn(&RgbaImage, &RgbaImage, u64) -> std::result::Result<Option<Point>, ResolverError>
    + Send
    + Sync;

/// User-supplied placement callback
///
/// Called with the partially composited canvas, an untouched snapshot of the
/// base layer and the current instant. Returning `Ok(None)` skips the overlay
/// at that instant only.
#[derive(Clone)]
pub struct Resolver(Arc<ResolveFn>);

impl Resolver {
    /// Wraps a placement callback
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&RgbaImage, &RgbaImage, u64) -> std::result::Result<Option<Point>, ResolverError>
            + Send
            + Sync
            + 'static,
    {
        Self(Arc::new(f))
    }

    /// Invokes the callback, tagging failures with the instant being rendered
    pub fn resolve(&self, canvas: &RgbaImage, base: &RgbaImage, instant: u64) -> Result<Option<Point>> {
        (self.0)(canvas, base, instant).map_err(|source| Error::Resolver { instant, source })
    }
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Resolver(..)")
    }
}

/// Where an overlay is drawn on the canvas
#[derive(Debug, Clone)]
pub enum Position {
    Fixed(Point),
    Resolved(Resolver),
}

impl Position {
    /// Resolves the placement for one instant; `None` means "do not draw"
    pub fn resolve(&self, canvas: &RgbaImage, base: &RgbaImage, instant: u64) -> Result<Option<Point>> {
        match self {
            Position::Fixed(point) => Ok(Some(*point)),
            Position::Resolved(resolver) => resolver.resolve(canvas, base, instant),
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Position::Fixed(Point::default())
    }
}

impl From<Point> for Position {
    fn from(point: Point) -> Self {
        Position::Fixed(point)
    }
}

impl From<(i32, i32)> for Position {
    fn from(point: (i32, i32)) -> Self {
        Position::Fixed(point.into())
    }
}

impl From<Resolver> for Position {
    fn from(resolver: Resolver) -> Self {
        Position::Resolved(resolver)
    }
}

/// A static visual element drawn on every instant its window covers
#[derive(Debug, Clone)]
pub struct Frame {
    /// Pixel data, already resized; shared between loop replicas
    pub image: Arc<DynamicImage>,
    /// Drawn size in pixels
    pub size: Size,
    /// Draw order (lower = further back)
    pub layer: u32,
    /// Placement on the canvas
    pub position: Position,
    /// Visibility window
    pub window: Window,
    /// Registration sequence number, breaks ties between equal layers
    pub order: usize,
}

impl Frame {
    /// Creates a new frame around an already sized image
    pub fn new(image: Arc<DynamicImage>, layer: u32, position: Position, window: Window, order: usize) -> Self {
        let size = Size::of(&image);
        Self {
            image,
            size,
            layer,
            position,
            window,
            order,
        }
    }
}

/// One sub-image of an animation, placed on the merged timeline
#[derive(Debug, Clone)]
pub struct DynamicFrame {
    pub frame: Frame,
    /// Instant at which this sub-image becomes active (layer start offset included)
    pub local_time: u64,
    /// How long the sub-image stays up before the animation advances
    pub display_duration: u64,
}

impl DynamicFrame {
    /// Creates a new dynamic frame
    pub fn new(frame: Frame, local_time: u64, display_duration: u64) -> Self {
        Self {
            frame,
            local_time,
            display_duration,
        }
    }

    /// Instant at which the animation would replace this sub-image
    pub fn end_time(&self) -> u64 {
        self.local_time.saturating_add(self.display_duration)
    }

    /// Checks if the sub-image is still showing at `instant`
    pub fn outlasts(&self, instant: u64) -> bool {
        self.end_time() > instant
    }

    pub fn layer(&self) -> u32 {
        self.frame.layer
    }
}
