//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

use super::params::{Dimension, ResizeInstruction};

/// Calculate output dimensions for a keep-aspect resize.
///
/// The pinned edge becomes exactly `resize.value`; the other edge is scaled
/// by the same ratio and rounded, never below 1px. Sources smaller than the
/// requested size are enlarged.
///
/// # Arguments
/// * `source` - Original image dimensions (width, height)
/// * `resize` - Which edge to pin, and to what size
///
/// # Returns
/// * `(width, height)` - Output dimensions
///
/// # Examples
/// ```
/// # use imp::imaging::{calculate_keep_aspect_dimensions, Dimension, ResizeInstruction};
/// let to_width = ResizeInstruction { dimension: Dimension::Width, value: 1000 };
/// assert_eq!(calculate_keep_aspect_dimensions((2000, 1500), to_width), (1000, 750));
///
/// let to_height = ResizeInstruction { dimension: Dimension::Height, value: 300 };
/// assert_eq!(calculate_keep_aspect_dimensions((800, 600), to_height), (400, 300));
/// ```
pub fn calculate_keep_aspect_dimensions(
    source: (u32, u32),
    resize: ResizeInstruction,
) -> (u32, u32) {
    let (src_w, src_h) = source;
    let target = resize.value.max(1);

    match resize.dimension {
        Dimension::Width => {
            let ratio = target as f64 / src_w.max(1) as f64;
            (target, scaled(src_h, ratio))
        }
        Dimension::Height => {
            let ratio = target as f64 / src_h.max(1) as f64;
            (scaled(src_w, ratio), target)
        }
    }
}

fn scaled(edge: u32, ratio: f64) -> u32 {
    ((edge as f64 * ratio).round() as u32).max(1)
}
