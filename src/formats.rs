//! Output format catalog.
//!
//! A fixed table mapping the format identifiers accepted in a target's
//! `formats` list to a file extension and, where the pure-Rust codec stack
//! has an encoder, to an [`image::ImageFormat`].
//!
//! | Identifier | Aliases | Extension | Encoder |
//! |---|---|---|---|
//! | `avif` | | `avif` | rav1e (via `image`) |
//! | `gif` | | `gif` | `image` |
//! | `heif` | `heic` | `heif` | none |
//! | `jpeg` | `jpg` | `jpg` | `image` |
//! | `png` | | `png` | `image` |
//! | `tiff` | `tif` | `tiff` | `image` |
//! | `webp` | | `webp` | `image` (lossless only) |
//!
//! HEIF is a recognized target so that a config naming it plans normally,
//! but rendering a HEIF pipe fails in the backend.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A supported output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Avif,
    Gif,
    Heif,
    Jpeg,
    Png,
    Tiff,
    Webp,
}

const CATALOG: &[(&str, OutputFormat)] = &[
    ("avif", OutputFormat::Avif),
    ("gif", OutputFormat::Gif),
    ("heif", OutputFormat::Heif),
    ("heic", OutputFormat::Heif),
    ("jpeg", OutputFormat::Jpeg),
    ("jpg", OutputFormat::Jpeg),
    ("png", OutputFormat::Png),
    ("tiff", OutputFormat::Tiff),
    ("tif", OutputFormat::Tiff),
    ("webp", OutputFormat::Webp),
];

impl OutputFormat {
    pub const ALL: [OutputFormat; 7] = [
        OutputFormat::Avif,
        OutputFormat::Gif,
        OutputFormat::Heif,
        OutputFormat::Jpeg,
        OutputFormat::Png,
        OutputFormat::Tiff,
        OutputFormat::Webp,
    ];

    /// Look up a format identifier. Returns `None` for anything not in the catalog.
    ///
    /// Identifiers are matched exactly (lower-case), so `"PNG"` is unsupported
    /// just like `"pngs"`.
    pub fn parse(id: &str) -> Option<Self> {
        CATALOG
            .iter()
            .find(|(name, _)| *name == id)
            .map(|(_, format)| *format)
    }

    /// File extension (without the dot) used for output files.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Avif => "avif",
            OutputFormat::Gif => "gif",
            OutputFormat::Heif => "heif",
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Png => "png",
            OutputFormat::Tiff => "tiff",
            OutputFormat::Webp => "webp",
        }
    }

    /// Canonical identifier, as written in config files.
    pub fn id(self) -> &'static str {
        match self {
            OutputFormat::Avif => "avif",
            OutputFormat::Gif => "gif",
            OutputFormat::Heif => "heif",
            OutputFormat::Jpeg => "jpeg",
            OutputFormat::Png => "png",
            OutputFormat::Tiff => "tiff",
            OutputFormat::Webp => "webp",
        }
    }

    /// Codec format for the `image` crate, if an encoder is compiled in.
    pub fn image_format(self) -> Option<image::ImageFormat> {
        match self {
            OutputFormat::Avif => Some(image::ImageFormat::Avif),
            OutputFormat::Gif => Some(image::ImageFormat::Gif),
            OutputFormat::Heif => None,
            OutputFormat::Jpeg => Some(image::ImageFormat::Jpeg),
            OutputFormat::Png => Some(image::ImageFormat::Png),
            OutputFormat::Tiff => Some(image::ImageFormat::Tiff),
            OutputFormat::Webp => Some(image::ImageFormat::WebP),
        }
    }
}

/// Whether `id` names a supported output format.
pub fn is_supported(id: &str) -> bool {
    OutputFormat::parse(id).is_some()
}

/// Extension for a format identifier, or `None` if unsupported.
pub fn extension_for(id: &str) -> Option<&'static str> {
    OutputFormat::parse(id).map(OutputFormat::extension)
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_covers_required_formats() {
        for id in ["avif", "gif", "heif", "jpeg", "png", "tiff", "webp"] {
            assert!(is_supported(id), "{id} should be supported");
        }
    }

    #[test]
    fn every_supported_format_has_an_extension() {
        for (id, _) in CATALOG {
            let ext = extension_for(id).unwrap();
            assert!(!ext.is_empty());
        }
        for format in OutputFormat::ALL {
            assert!(!format.extension().is_empty());
        }
    }

    #[test]
    fn typos_are_unsupported() {
        assert!(!is_supported("pngs"));
        assert!(!is_supported("PNG"));
        assert!(!is_supported(""));
        assert_eq!(extension_for("pngs"), None);
    }

    #[test]
    fn aliases_resolve_to_canonical_format() {
        assert_eq!(OutputFormat::parse("jpg"), Some(OutputFormat::Jpeg));
        assert_eq!(OutputFormat::parse("tif"), Some(OutputFormat::Tiff));
        assert_eq!(OutputFormat::parse("heic"), Some(OutputFormat::Heif));
    }

    #[test]
    fn canonical_id_roundtrips_through_parse() {
        for format in OutputFormat::ALL {
            assert_eq!(OutputFormat::parse(format.id()), Some(format));
        }
    }

    #[test]
    fn heif_has_no_encoder() {
        assert_eq!(OutputFormat::Heif.image_format(), None);
        assert_eq!(
            OutputFormat::Png.image_format(),
            Some(image::ImageFormat::Png)
        );
    }
}
