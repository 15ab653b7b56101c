//! Pipe planning: from targets to concrete output files.
//!
//! For one input file, every (target, format) pair becomes a
//! [`PipeDescriptor`] describing exactly one output file. Planning is pure
//! (no filesystem access, no decoding), so everything here is unit testable.
//!
//! ## Failure classes
//!
//! | Error | Class | Effect on [`build_pipes`] |
//! |---|---|---|
//! | [`PlanError::UnsupportedFormat`] | recoverable | warn, skip the pipe, continue |
//! | [`PlanError::InvalidModeConfiguration`] | fatal | abort, no partial set |
//! | [`PlanError::UnknownMode`] | fatal | abort, no partial set |
//!
//! A typo in one format must not block every other output, while a target
//! whose mode cannot be interpreted is broken for every format it lists.
//!
//! ## Naming
//!
//! ```text
//! <output_dir>/<input base name><filename_suffix>.<extension>
//! photo.jpg + target { suffix: "-400w", formats: [webp] } → out/photo-400w.webp
//! ```
//!
//! Two pairs that resolve to the same path are allowed (the last one
//! rendered wins); [`build_pipes`] logs a warning for each collision.

use crate::config::{ScaleMode, TargetSpec};
use crate::formats::OutputFormat;
use crate::imaging::{Dimension, EncodeOptions, PipeDescriptor, ResizeInstruction};
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    #[error("Target \"{target}\": unsupported output format \"{format}\"")]
    UnsupportedFormat { target: String, format: String },
    #[error("Target \"{target}\": \"keep-aspect\" needs exactly one non-zero width or height")]
    InvalidModeConfiguration { target: String },
    #[error("Target \"{target}\": unknown mode \"{mode}\"")]
    UnknownMode { target: String, mode: String },
}

impl PlanError {
    /// Whether the builder may skip this pipe and carry on.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, PlanError::UnsupportedFormat { .. })
    }
}

/// A (target, format) pair left out of a pipe set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedPipe {
    pub target: String,
    pub format: String,
}

/// All pipes for one input file, in target-then-format order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipeSet {
    pub pipes: Vec<PipeDescriptor>,
    /// Pairs omitted because their format is unsupported.
    pub skipped: Vec<SkippedPipe>,
}

impl PipeSet {
    pub fn len(&self) -> usize {
        self.pipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pipes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PipeDescriptor> {
        self.pipes.iter()
    }

    /// Output paths claimed by more than one pipe, in first-claim order.
    pub fn collisions(&self) -> Vec<&Path> {
        let mut seen = HashSet::new();
        let mut reported = HashSet::new();
        let mut collisions = Vec::new();
        for pipe in &self.pipes {
            let path = pipe.output_path.as_path();
            if !seen.insert(path) && reported.insert(path) {
                collisions.push(path);
            }
        }
        collisions
    }
}

/// The file name stem used for outputs: the input's file name without its extension.
pub fn input_base_name(input: &Path) -> String {
    input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Derive the output path for one pipe.
pub fn output_path(
    output_dir: &Path,
    base_name: &str,
    suffix: &str,
    format: OutputFormat,
) -> PathBuf {
    output_dir.join(format!("{base_name}{suffix}.{}", format.extension()))
}

fn resolve_resize(name: &str, target: &TargetSpec) -> Result<Option<ResizeInstruction>, PlanError> {
    match &target.mode {
        ScaleMode::NoScale => Ok(None),
        ScaleMode::KeepAspect => match (target.width, target.height) {
            (Some(value), None) if value > 0 => Ok(Some(ResizeInstruction {
                dimension: Dimension::Width,
                value,
            })),
            (None, Some(value)) if value > 0 => Ok(Some(ResizeInstruction {
                dimension: Dimension::Height,
                value,
            })),
            _ => Err(PlanError::InvalidModeConfiguration {
                target: name.to_string(),
            }),
        },
        ScaleMode::Unknown(mode) => Err(PlanError::UnknownMode {
            target: name.to_string(),
            mode: mode.clone(),
        }),
    }
}

/// Plan a single pipe for one target and one requested format.
///
/// The format is checked first, so an unsupported format is reported as
/// recoverable even when the target's mode is also broken; the builder then
/// hits the fatal error on the target's next valid format.
pub fn plan_pipe(
    target_name: &str,
    target: &TargetSpec,
    format: &str,
    base_name: &str,
    output_dir: &Path,
    format_options: &HashMap<OutputFormat, EncodeOptions>,
) -> Result<PipeDescriptor, PlanError> {
    let output_format = OutputFormat::parse(format).ok_or_else(|| PlanError::UnsupportedFormat {
        target: target_name.to_string(),
        format: format.to_string(),
    })?;

    let output_path = output_path(output_dir, base_name, &target.filename_suffix, output_format);
    let encode = format_options
        .get(&output_format)
        .cloned()
        .unwrap_or_default();
    let resize = resolve_resize(target_name, target)?;

    Ok(PipeDescriptor {
        target: target_name.to_string(),
        output_path,
        resize,
        format: output_format,
        encode,
    })
}

/// Build the pipe set for one input file.
///
/// Targets are visited in declaration order and formats in listed order.
/// Unsupported formats are logged and recorded in [`PipeSet::skipped`]; any
/// other planning error aborts the whole build. An empty result is not an
/// error here.
pub fn build_pipes(
    targets: &IndexMap<String, TargetSpec>,
    format_options: &HashMap<OutputFormat, EncodeOptions>,
    base_name: &str,
    output_dir: &Path,
) -> Result<PipeSet, PlanError> {
    let mut set = PipeSet::default();

    for (name, target) in targets {
        for format in &target.formats {
            match plan_pipe(name, target, format, base_name, output_dir, format_options) {
                Ok(pipe) => set.pipes.push(pipe),
                Err(err) if err.is_recoverable() => {
                    log::warn!("{err}; skipping");
                    set.skipped.push(SkippedPipe {
                        target: name.clone(),
                        format: format.clone(),
                    });
                }
                Err(err) => return Err(err),
            }
        }
    }

    for path in set.collisions() {
        log::warn!(
            "Several pipes write {}; the last one to finish wins",
            path.display()
        );
    }

    Ok(set)
}
