//! JSON layer manifests
//!
//! A manifest is a JSON array of layer objects, drawn in order:
//!
//! ```json
//! [
//!     { "file_path": "bg.gif" },
//!     { "file_path": "cat.gif", "size": [100, 100], "position": [150, 150], "from": 1000, "to": 2500 },
//!     { "file_path": "logo.png", "ratio": 0.2, "layer": 3, "loop": true }
//! ]
//! ```

use anyhow::{Context, Result};
use gifer_codec::decoder::detect_kind;
use gifer_core::{LayerKind, LayerOptions, Point, Size, SizeSpec};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// One layer of a manifest
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayerEntry {
    /// Source file, relative to the manifest's directory unless absolute
    pub file_path: PathBuf,
    /// Explicit source kind (detected from the file otherwise)
    #[serde(default)]
    pub kind: Option<LayerKind>,
    #[serde(default)]
    pub layer: Option<u32>,
    #[serde(default)]
    pub size: Option<Size>,
    #[serde(default)]
    pub ratio: Option<f64>,
    #[serde(default)]
    pub position: Option<Point>,
    #[serde(default, alias = "start")]
    pub from: Option<u64>,
    #[serde(default, alias = "end")]
    pub to: Option<u64>,
    #[serde(default, rename = "loop")]
    pub looped: bool,
}

impl LayerEntry {
    /// Explicit kind, or the kind detected from the file's content
    pub fn kind(&self) -> Result<LayerKind> {
        match self.kind {
            Some(kind) => Ok(kind),
            None => detect_kind(&self.file_path)
                .with_context(|| format!("Failed to read {}", self.file_path.display())),
        }
    }

    /// Registration options; a ratio given alongside a size scales that size
    pub fn options(&self) -> LayerOptions {
        let size = match (self.size, self.ratio) {
            (Some(size), Some(ratio)) => SizeSpec::Exact(size.scaled(ratio)),
            (Some(size), None) => SizeSpec::Exact(size),
            (None, Some(ratio)) => SizeSpec::Ratio(ratio),
            (None, None) => SizeSpec::Natural,
        };

        LayerOptions {
            layer: self.layer,
            size,
            position: self.position.unwrap_or_default().into(),
            start: self.from.unwrap_or(0),
            end: self.to,
            looped: self.looped,
        }
    }
}

/// Layers of a manifest, with file paths resolved
#[derive(Debug, Clone)]
pub struct Manifest {
    pub layers: Vec<LayerEntry>,
}

impl Manifest {
    /// Parses a manifest; relative file paths resolve against `base_dir`
    pub fn parse(json: &str, base_dir: &Path) -> Result<Self> {
        let mut layers: Vec<LayerEntry> = serde_json::from_str(json).context("Invalid layer manifest")?;
        for entry in &mut layers {
            if entry.file_path.is_relative() {
                entry.file_path = base_dir.join(&entry.file_path);
            }
        }

        Ok(Self { layers })
    }

    /// Reads and parses a manifest file
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest {}", path.display()))?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
        Self::parse(&json, base_dir)
    }
}
