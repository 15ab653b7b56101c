//! Pure Rust image processing backend.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP, GIF) | `image::load_from_memory` |
//! | Resize | `image::DynamicImage::resize_exact` with `Lanczos3` |
//! | Encode → AVIF | `image::codecs::avif::AvifEncoder` (rav1e) |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` |
//! | Encode → PNG | `image::codecs::png::PngEncoder` |
//! | Encode → WebP | `image::codecs::webp::WebPEncoder` (lossless) |
//! | Encode → GIF, TIFF | `image::DynamicImage::write_to` |
//! | Encode → HEIF | not available |

use super::backend::{BackendError, ImageBackend};
use super::calculations::calculate_keep_aspect_dimensions;
use super::params::{EncodeOptions, PipeDescriptor};
use crate::formats::OutputFormat;
use image::codecs::png::{CompressionType, FilterType as PngFilter};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::sync::LazyLock;

/// Default rav1e speed; matches a reasonable throughput/size tradeoff.
const DEFAULT_AVIF_SPEED: u8 = 6;

/// Extensions whose decoders are compiled in and known to work.
///
/// AVIF is excluded: the `image` crate's `"avif"` feature only enables the
/// encoder, so AVIF files are valid outputs but not inputs.
const INPUT_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
    ("gif", ImageFormat::Gif),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    INPUT_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Returns the set of image file extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// Whether a path has a decodable image extension (case-insensitive).
pub fn has_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| {
            supported_input_extensions()
                .iter()
                .any(|s| e.eq_ignore_ascii_case(s))
        })
}

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply the pipe's resize instruction, if any.
fn apply_resize<'a>(
    img: &'a DynamicImage,
    pipe: &PipeDescriptor,
) -> std::borrow::Cow<'a, DynamicImage> {
    match pipe.resize {
        Some(resize) => {
            let (w, h) = calculate_keep_aspect_dimensions((img.width(), img.height()), resize);
            std::borrow::Cow::Owned(img.resize_exact(w, h, FilterType::Lanczos3))
        }
        None => std::borrow::Cow::Borrowed(img),
    }
}

fn png_compression(level: Option<u8>) -> CompressionType {
    match level {
        Some(0..=3) => CompressionType::Fast,
        Some(7..) => CompressionType::Best,
        _ => CompressionType::Default,
    }
}

fn encode_error(format: OutputFormat, err: image::ImageError) -> BackendError {
    BackendError::Encode(format!("{format} encode failed: {err}"))
}

/// Encode `img` as `format` and write it to `path`.
fn save_image(
    img: &DynamicImage,
    path: &Path,
    format: OutputFormat,
    opts: &EncodeOptions,
) -> Result<(), BackendError> {
    if format.image_format().is_none() {
        return Err(BackendError::UnsupportedEncoder(format));
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    let quality = opts.quality().value() as u8;

    let written = match format {
        OutputFormat::Avif => {
            let speed = opts.speed.unwrap_or(DEFAULT_AVIF_SPEED).clamp(1, 10);
            let encoder = image::codecs::avif::AvifEncoder::new_with_speed_quality(
                writer, speed, quality,
            );
            img.write_with_encoder(encoder)
        }
        OutputFormat::Jpeg => {
            // JPEG has no alpha channel
            let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
            let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(writer, quality);
            rgb.write_with_encoder(encoder)
        }
        OutputFormat::Png => {
            let encoder = image::codecs::png::PngEncoder::new_with_quality(
                writer,
                png_compression(opts.compression),
                PngFilter::Adaptive,
            );
            img.write_with_encoder(encoder)
        }
        OutputFormat::Webp => {
            let rgba = DynamicImage::ImageRgba8(img.to_rgba8());
            let encoder = image::codecs::webp::WebPEncoder::new_lossless(writer);
            rgba.write_with_encoder(encoder)
        }
        OutputFormat::Gif => {
            DynamicImage::ImageRgba8(img.to_rgba8()).write_to(&mut writer, ImageFormat::Gif)
        }
        OutputFormat::Tiff => img.write_to(&mut writer, ImageFormat::Tiff),
        OutputFormat::Heif => return Err(BackendError::UnsupportedEncoder(format)),
    };
    written.map_err(|e| encode_error(format, e))
}

impl ImageBackend for RustBackend {
    type Source = DynamicImage;

    fn open(&self, path: &Path) -> Result<DynamicImage, BackendError> {
        let bytes = std::fs::read(path)?;
        image::load_from_memory(&bytes).map_err(|e| {
            BackendError::Decode(format!("Failed to decode {}: {}", path.display(), e))
        })
    }

    fn render(&self, source: &DynamicImage, pipe: &PipeDescriptor) -> Result<(), BackendError> {
        let img = apply_resize(source, pipe);
        save_image(&img, &pipe.output_path, pipe.format, &pipe.encode)
    }
}
