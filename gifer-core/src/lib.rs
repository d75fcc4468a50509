//! gifer Core Library
//!
//! This library provides the layered timeline model used to merge still images
//! and animations into a single output animation: layer registration, breakpoint
//! scheduling, frame expansion and per-instant compositing.

pub mod codec;
pub mod frame;
pub mod layer;
pub mod schedule;
pub mod timeline;

use std::path::{Path, PathBuf};

pub use codec::ImageCodec;
pub use frame::{DynamicFrame, Frame, Point, Position, Resolver, ResolverError, Size, SizeSpec, Window};
pub use layer::{LayerKind, LayerOptions};
pub use schedule::Schedule;
pub use timeline::{RenderSummary, Timeline, TimelineConfig};

/// Milliseconds per second; timeline instants are milliseconds, output durations seconds
pub const TIME_UNIT_SCALE: f64 = 1000.0;

/// Result type for gifer-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for gifer-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Failed to decode {}: {reason}", .path.display())]
    Decode { path: PathBuf, reason: String },

    #[error("Position resolver failed at {instant}ms: {source}")]
    Resolver {
        instant: u64,
        #[source]
        source: ResolverError,
    },

    #[error("Failed to encode {}: {reason}", .path.display())]
    Encode { path: PathBuf, reason: String },

    #[error("Timeline has nothing to render")]
    EmptyTimeline,
}

impl Error {
    /// Builds an [`Error::Configuration`]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Builds an [`Error::Decode`] for the given source file
    pub fn decode(path: &Path, reason: impl std::fmt::Display) -> Self {
        Self::Decode {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    /// Builds an [`Error::Encode`] for the given output file
    pub fn encode(path: &Path, reason: impl std::fmt::Display) -> Self {
        Self::Encode {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }
}
