//! Configuration loading and resolution.
//!
//! A run is described by a TOML file plus command-line overrides. The file is
//! either named explicitly (`--config-file`) or discovered by walking up from
//! the working directory until one of [`CONFIG_FILE_NAMES`] exists.
//!
//! ## Config File
//!
//! ```toml
//! input_files = ["photos/dawn.jpg", "photos/portraits/"]
//! output_dir = "dist/img"
//!
//! [targets.full]
//! mode = "no-scale"
//! formats = ["jpeg", "webp"]
//!
//! [targets.small]
//! mode = "keep-aspect"
//! width = 400
//! filename_suffix = "-400w"
//! formats = ["avif", "jpeg"]
//!
//! [format_options.jpeg]
//! quality = 80
//!
//! [logging]
//! level = "info"
//!
//! [processing]
//! max_processes = 4
//! ```
//!
//! ## Precedence
//!
//! Positional inputs and `--output-dir` replace `input_files` / `output_dir`
//! from the file. Everything else comes from the file only. Directories in
//! the input list are expanded to the decodable images they contain.
//!
//! Unknown keys are rejected to catch typos early. Unknown *modes* and
//! *formats* are not rejected here: the planner classifies them per pipe.

use crate::formats::OutputFormat;
use crate::imaging::{EncodeOptions, has_supported_extension};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// File names probed, in order, in each directory during discovery.
pub const CONFIG_FILE_NAMES: &[&str] = &["imp.toml", ".imp.toml", ".imprc.toml"];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error(
        "Could not find configuration file (looked for {} from {})",
        CONFIG_FILE_NAMES.join(", "),
        .0.display()
    )]
    NotFound(PathBuf),
    #[error("Configuration file must not be empty: {}", .0.display())]
    Empty(PathBuf),
    #[error("Missing configuration value: {0}")]
    Missing(&'static str),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// How a target scales the source image.
///
/// Deserializes from any string so that a misspelled mode survives config
/// loading and is reported by the planner against the offending target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ScaleMode {
    /// Write the source at its original size.
    NoScale,
    /// Pin one edge (`width` or `height`) and scale the other proportionally.
    KeepAspect,
    Unknown(String),
}

impl From<String> for ScaleMode {
    fn from(s: String) -> Self {
        match s.as_str() {
            "no-scale" | "do-not-scale" => ScaleMode::NoScale,
            "keep-aspect" => ScaleMode::KeepAspect,
            _ => ScaleMode::Unknown(s),
        }
    }
}

impl From<ScaleMode> for String {
    fn from(mode: ScaleMode) -> Self {
        match mode {
            ScaleMode::NoScale => "no-scale".to_string(),
            ScaleMode::KeepAspect => "keep-aspect".to_string(),
            ScaleMode::Unknown(s) => s,
        }
    }
}

/// One named output variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetSpec {
    pub mode: ScaleMode,
    /// Appended to the input file's base name. May be empty.
    #[serde(default)]
    pub filename_suffix: String,
    /// Requested output format identifiers, in output order.
    pub formats: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

/// Logging settings from the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// One of `off`, `error`, `warn`, `info`, `debug`, `trace`.
    /// `--debug` on the command line still wins.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of worker threads.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

/// The config file as written, before command-line overrides.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub input_files: Vec<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub targets: Option<IndexMap<String, TargetSpec>>,
    #[serde(default)]
    pub format_options: HashMap<String, EncodeOptions>,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub processing: ProcessingConfig,
}

/// Values taken from the command line.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub config_file: Option<PathBuf>,
    pub inputs: Vec<PathBuf>,
    pub output_dir: Option<PathBuf>,
}

/// Fully merged configuration consumed by the batch runner.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedConfig {
    pub input_files: Vec<PathBuf>,
    pub output_dir: PathBuf,
    /// Targets in declaration order.
    pub targets: IndexMap<String, TargetSpec>,
    pub format_options: HashMap<OutputFormat, EncodeOptions>,
    pub logging: LoggingConfig,
    pub processing: ProcessingConfig,
    /// Where the config was read from.
    pub source: PathBuf,
}

/// Walk up from `start` and return the first config file found.
pub fn discover_config_file(start: &Path) -> Option<PathBuf> {
    start.ancestors().find_map(|dir| {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|candidate| candidate.is_file())
    })
}

/// Read and parse a config file.
pub fn load_config_file(path: &Path) -> Result<ConfigFile, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if content.trim().is_empty() {
        return Err(ConfigError::Empty(path.to_path_buf()));
    }
    let file: ConfigFile = toml::from_str(&content)?;
    log::debug!("Read configuration from: \"{}\"", path.display());
    Ok(file)
}

/// Locate, load and merge the configuration for a run.
pub fn resolve(cli: &CliOverrides, cwd: &Path) -> Result<ResolvedConfig, ConfigError> {
    let path = match &cli.config_file {
        Some(explicit) => explicit.clone(),
        None => discover_config_file(cwd).ok_or_else(|| ConfigError::NotFound(cwd.to_path_buf()))?,
    };
    let file = load_config_file(&path)?;
    merge(file, cli, path)
}

/// Apply command-line overrides on top of a parsed config file, then validate.
pub fn merge(
    file: ConfigFile,
    cli: &CliOverrides,
    source: PathBuf,
) -> Result<ResolvedConfig, ConfigError> {
    let targets = file.targets.ok_or(ConfigError::Missing("targets"))?;

    let inputs = if cli.inputs.is_empty() {
        file.input_files
    } else {
        cli.inputs.clone()
    };
    let input_files = expand_inputs(&inputs)?;
    if input_files.is_empty() {
        return Err(ConfigError::Missing("input_files"));
    }

    let output_dir = cli
        .output_dir
        .clone()
        .or(file.output_dir)
        .ok_or(ConfigError::Missing("output_dir"))?;

    let format_options = canonical_format_options(file.format_options)?;

    let config = ResolvedConfig {
        input_files,
        output_dir,
        targets,
        format_options,
        logging: file.logging,
        processing: file.processing,
        source,
    };
    config.validate()?;
    Ok(config)
}

/// Key format options by canonical format, so `jpg` and `jpeg` share one entry.
fn canonical_format_options(
    raw: HashMap<String, EncodeOptions>,
) -> Result<HashMap<OutputFormat, EncodeOptions>, ConfigError> {
    let mut options = HashMap::new();
    for (id, opts) in raw {
        let format = OutputFormat::parse(&id).ok_or_else(|| {
            ConfigError::Validation(format!("format_options: unsupported format '{id}'"))
        })?;
        if options.insert(format, opts).is_some() {
            return Err(ConfigError::Validation(format!(
                "format_options: '{format}' is configured more than once"
            )));
        }
    }
    Ok(options)
}

/// Replace directories with the decodable images directly inside them.
///
/// Plain file paths are kept as given, even if they do not exist; reading
/// them is the executor's job and fails per file.
pub fn expand_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, ConfigError> {
    let mut files = Vec::new();
    for input in inputs {
        if !input.is_dir() {
            files.push(input.clone());
            continue;
        }
        let mut found: Vec<PathBuf> = Vec::new();
        for entry in walkdir::WalkDir::new(input).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| ConfigError::Io {
                path: input.clone(),
                source: e.into(),
            })?;
            if entry.file_type().is_file() && has_supported_extension(entry.path()) {
                found.push(entry.into_path());
            }
        }
        found.sort();
        log::debug!("Expanded {} to {} input file(s)", input.display(), found.len());
        files.extend(found);
    }
    Ok(files)
}

impl ResolvedConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (format, opts) in &self.format_options {
            if let Some(q) = opts.quality
                && !(1..=100).contains(&q)
            {
                return Err(ConfigError::Validation(format!(
                    "format_options.{format}.quality must be 1-100"
                )));
            }
            if let Some(c) = opts.compression
                && c > 9
            {
                return Err(ConfigError::Validation(format!(
                    "format_options.{format}.compression must be 0-9"
                )));
            }
            if let Some(s) = opts.speed
                && !(1..=10).contains(&s)
            {
                return Err(ConfigError::Validation(format!(
                    "format_options.{format}.speed must be 1-10"
                )));
            }
        }
        if let Some(level) = &self.logging.level
            && log::LevelFilter::from_str(level).is_err()
        {
            return Err(ConfigError::Validation(format!(
                "logging.level '{level}' is not a log level"
            )));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Returns a fully-commented sample config with all keys and explanations.
///
/// Used by `--gen-config`.
pub fn stock_config_toml() -> &'static str {
    r##"# imp configuration
# =================
# Save as imp.toml in your project. imp looks for imp.toml, .imp.toml or
# .imprc.toml in the working directory and every parent directory, unless
# --config-file is given. Unknown keys cause an error.

# Images to process. Directories contribute the images directly inside them.
# Positional arguments on the command line replace this list.
input_files = ["images/"]

# Where output files are written. --output-dir replaces this value.
output_dir = "dist"

# ---------------------------------------------------------------------------
# Targets
# ---------------------------------------------------------------------------
# Each target produces one file per format for every input image, named
#   <output_dir>/<input base name><filename_suffix>.<extension>
#
# mode = "no-scale"      keep the original dimensions
# mode = "keep-aspect"   set exactly one of width / height; the other edge
#                        follows the source aspect ratio
#
# Formats: avif, gif, heif, jpeg (jpg), png, tiff (tif), webp.
# Unknown formats are skipped with a warning.

[targets.full]
mode = "no-scale"
filename_suffix = ""
formats = ["jpeg", "webp"]

[targets.small]
mode = "keep-aspect"
width = 400
filename_suffix = "-400w"
formats = ["avif", "jpeg"]

# ---------------------------------------------------------------------------
# Encoder options, per format. All keys are optional.
# ---------------------------------------------------------------------------
# quality      1-100, lossy formats (jpeg, avif). Default 90.
# compression  0-9, png.
# lossless     webp (the built-in encoder is always lossless).
# speed        1-10, avif. Default 6.

[format_options.jpeg]
quality = 85

[format_options.avif]
quality = 70
speed = 6

# ---------------------------------------------------------------------------
# Logging
# ---------------------------------------------------------------------------
[logging]
# off, error, warn, info, debug, trace. --debug wins over this value.
level = "info"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
