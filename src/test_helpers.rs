//! Shared test utilities for the imp test suite.
//!
//! Builders for targets and resolved configs, and a synthetic image writer
//! for tests that go through the real codec.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let config = resolved_config(
//!     &["in/photo.png"],
//!     "out",
//!     targets(&[
//!         ("full", no_scale("", &["png"])),
//!         ("small", keep_aspect(Some(400), None, "-400w", &["webp"])),
//!     ]),
//! );
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use image::{ImageEncoder, RgbaImage};
use indexmap::IndexMap;

use crate::config::{LoggingConfig, ProcessingConfig, ResolvedConfig, ScaleMode, TargetSpec};

// =========================================================================
// Targets
// =========================================================================

fn formats(list: &[&str]) -> Vec<String> {
    list.iter().map(|f| f.to_string()).collect()
}

/// A `no-scale` target.
pub fn no_scale(suffix: &str, format_list: &[&str]) -> TargetSpec {
    TargetSpec {
        mode: ScaleMode::NoScale,
        filename_suffix: suffix.to_string(),
        formats: formats(format_list),
        width: None,
        height: None,
    }
}

/// A `keep-aspect` target with the given (possibly invalid) dimensions.
pub fn keep_aspect(
    width: Option<u32>,
    height: Option<u32>,
    suffix: &str,
    format_list: &[&str],
) -> TargetSpec {
    TargetSpec {
        mode: ScaleMode::KeepAspect,
        filename_suffix: suffix.to_string(),
        formats: formats(format_list),
        width,
        height,
    }
}

/// Build an ordered target table.
pub fn targets(entries: &[(&str, TargetSpec)]) -> IndexMap<String, TargetSpec> {
    entries
        .iter()
        .map(|(name, spec)| (name.to_string(), spec.clone()))
        .collect()
}

/// A resolved config with no format options and default ambient settings.
pub fn resolved_config(
    inputs: &[&str],
    output_dir: impl Into<PathBuf>,
    targets: IndexMap<String, TargetSpec>,
) -> ResolvedConfig {
    ResolvedConfig {
        input_files: inputs.iter().map(PathBuf::from).collect(),
        output_dir: output_dir.into(),
        targets,
        format_options: HashMap::new(),
        logging: LoggingConfig::default(),
        processing: ProcessingConfig::default(),
        source: PathBuf::from("imp.toml"),
    }
}

// =========================================================================
// Images
// =========================================================================

/// Write a small gradient PNG with the given dimensions.
pub fn create_test_png(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    let img = RgbaImage::from_fn(width, height, |x, y| {
        image::Rgba([(x % 256) as u8, (y % 256) as u8, 128, 255])
    });
    let file = std::fs::File::create(path).unwrap();
    let writer = std::io::BufWriter::new(file);
    image::codecs::png::PngEncoder::new(writer)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgba8)
        .unwrap();
}
