//! Image processing in pure Rust, no system codecs.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::load_from_memory` |
//! | **Keep-aspect resize** | Lanczos3 via `resize_exact` |
//! | **Encode** | `image` codecs (AVIF via rav1e) |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing one output file
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]

pub mod backend;
mod calculations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, ImageBackend};
pub use calculations::calculate_keep_aspect_dimensions;
pub use params::{Dimension, EncodeOptions, PipeDescriptor, Quality, ResizeInstruction};
pub use rust_backend::{RustBackend, has_supported_extension, supported_input_extensions};
