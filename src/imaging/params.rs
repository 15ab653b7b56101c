//! Parameter types for image operations.
//!
//! These structs describe *what* to produce, not *how*. A [`PipeDescriptor`]
//! is the contract between the planner (which derives it from a target and a
//! format) and the [`backend`](super::backend) (which does the pixel work).
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality (1–100, default 90). Clamped on construction.
//! - [`ResizeInstruction`]: Scale one edge to a value, keeping the aspect ratio.
//! - [`EncodeOptions`]: Per-format encoder settings from the `format_options` table.
//! - [`PipeDescriptor`]: Everything needed to write one output file.

use crate::formats::OutputFormat;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// Which edge a keep-aspect resize pins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Width,
    Height,
}

/// Scale the pinned edge to `value` pixels; the other edge follows the source aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResizeInstruction {
    pub dimension: Dimension,
    pub value: u32,
}

/// Encoder settings for one output format.
///
/// Every field is optional; an empty table means codec defaults. Options a
/// format has no use for are ignored by the backend (e.g. `compression` for
/// JPEG).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EncodeOptions {
    /// Lossy quality, 1-100 (JPEG, AVIF).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<u32>,
    /// PNG compression effort, 0 (fastest) to 9 (best).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compression: Option<u8>,
    /// Request lossless output (WebP). The pure-Rust WebP encoder is lossless only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lossless: Option<bool>,
    /// AVIF encoder speed, 1 (slowest) to 10 (fastest).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<u8>,
}

impl EncodeOptions {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn quality(&self) -> Quality {
        self.quality.map(Quality::new).unwrap_or_default()
    }
}

/// The fully resolved plan for one output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipeDescriptor {
    /// Name of the target this pipe was derived from.
    pub target: String,
    pub output_path: PathBuf,
    pub resize: Option<ResizeInstruction>,
    pub format: OutputFormat,
    pub encode: EncodeOptions,
}
