//! Fitting a source image into the working canvas.
//!
//! Scales the source so its longest side is at most the configured
//! working resolution, preserving aspect ratio. Images already within
//! bounds keep their dimensions. Resizing always produces a new buffer;
//! the source bitmap is never touched.

use std::fmt;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::types::{Dimensions, RgbaImage};

/// Resampling filter used when shrinking to the working resolution.
///
/// Ordered from fastest/lowest-quality to slowest/highest-quality.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResampleFilter {
    /// Nearest-neighbor: fastest, blocky artifacts.
    Nearest,
    /// Bilinear interpolation: fast, decent quality.
    #[default]
    Triangle,
    /// Bicubic (Catmull-Rom): moderate speed, good quality.
    CatmullRom,
    /// Lanczos with 3 lobes: slowest, sharpest for photos.
    Lanczos3,
}

impl ResampleFilter {
    /// Convert to the `image` crate's `FilterType`.
    const fn to_image_filter(self) -> image::imageops::FilterType {
        match self {
            Self::Nearest => image::imageops::FilterType::Nearest,
            Self::Triangle => image::imageops::FilterType::Triangle,
            Self::CatmullRom => image::imageops::FilterType::CatmullRom,
            Self::Lanczos3 => image::imageops::FilterType::Lanczos3,
        }
    }
}

impl fmt::Display for ResampleFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nearest => f.write_str("Nearest"),
            Self::Triangle => f.write_str("Triangle"),
            Self::CatmullRom => f.write_str("CatmullRom"),
            Self::Lanczos3 => f.write_str("Lanczos3"),
        }
    }
}

/// Compute working-canvas dimensions for a source of size `source`.
///
/// The longer side (width for landscape and square images, height for
/// portrait) becomes `max_dimension` when it exceeds it; the other side
/// is scaled by the same factor and rounded, never below 1.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::suboptimal_flops
)]
pub fn fit_within(source: Dimensions, max_dimension: u32) -> Dimensions {
    let max_dimension = max_dimension.max(1);
    if source.long_side() <= max_dimension {
        return source;
    }

    let scale_other = |other: u32, governing: u32| -> u32 {
        let scaled = f64::from(other) * f64::from(max_dimension) / f64::from(governing);
        (scaled.round() as u32).max(1)
    };

    if source.width >= source.height {
        Dimensions::new(max_dimension, scale_other(source.height, source.width))
    } else {
        Dimensions::new(scale_other(source.width, source.height), max_dimension)
    }
}

/// Resize `image` to exactly `target` and convert to RGBA.
///
/// Returns an unscaled RGBA copy when `target` already matches the
/// image size.
#[must_use]
pub fn resize_to(image: &DynamicImage, target: Dimensions, filter: ResampleFilter) -> RgbaImage {
    if image.width() == target.width && image.height() == target.height {
        return image.to_rgba8();
    }
    image
        .resize_exact(target.width, target.height, filter.to_image_filter())
        .to_rgba8()
}
