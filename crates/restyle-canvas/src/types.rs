//! Shared types for the restyle mask authoring pipeline.

use serde::{Deserialize, Serialize};

use crate::fit::ResampleFilter;

/// Re-export `RgbaImage` so downstream crates can reference the
/// working canvas without depending on `image` directly.
pub use image::RgbaImage;

/// Re-export `GrayImage` for coverage previews.
pub use image::GrayImage;

/// A 2D point in working-canvas pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position (pixels from left edge).
    pub x: f64,
    /// Vertical position (pixels from top edge).
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Whether both coordinates are finite.
    #[must_use]
    pub const fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Create new dimensions.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Length of the longer side.
    #[must_use]
    pub const fn long_side(self) -> u32 {
        if self.width >= self.height {
            self.width
        } else {
            self.height
        }
    }

    /// Returns `true` if either side is zero.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// How stroke coverage is turned into alpha in the punched image.
///
/// Strokes are painted anti-aliased with a semi-opaque brush, so the
/// stroke surface carries partial coverage at edges and where strokes
/// overlap. [`MaskEdge::Binary`] thresholds that coverage so the output
/// alpha is exactly `0` or exactly the base alpha.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaskEdge {
    /// Any coverage at all erases the pixel completely.
    #[default]
    Binary,
    /// Plain destination-out: `alpha = base_alpha * (1 - coverage)`.
    Soft,
}

/// Configuration for the mask authoring canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    /// Longest side of the working canvas in pixels.
    pub max_dimension: u32,

    /// Resampling filter used when the source is larger than the
    /// working resolution.
    pub filter: ResampleFilter,

    /// Coverage-to-alpha policy applied at finalize time.
    pub mask_edge: MaskEdge,
}

impl CanvasConfig {
    /// Default working resolution (longest side).
    pub const DEFAULT_MAX_DIMENSION: u32 = 600;
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            max_dimension: Self::DEFAULT_MAX_DIMENSION,
            filter: ResampleFilter::default(),
            mask_edge: MaskEdge::default(),
        }
    }
}

/// Brush diameter bounds and default, matching the brush-size slider.
pub mod brush {
    /// Smallest selectable brush diameter in pixels.
    pub const MIN_DIAMETER: f32 = 10.0;
    /// Largest selectable brush diameter in pixels.
    pub const MAX_DIAMETER: f32 = 100.0;
    /// Initial brush diameter in pixels.
    pub const DEFAULT_DIAMETER: f32 = 40.0;

    /// Stroke paint: white at 70% opacity.
    pub const COLOR_RGBA: [u8; 4] = [255, 255, 255, 179];

    /// Clamp a requested diameter into the selectable range.
    ///
    /// Non-finite values fall back to [`DEFAULT_DIAMETER`].
    #[must_use]
    pub fn clamp_diameter(diameter: f32) -> f32 {
        if diameter.is_finite() {
            diameter.clamp(MIN_DIAMETER, MAX_DIAMETER)
        } else {
            DEFAULT_DIAMETER
        }
    }
}

/// Errors that can occur while authoring a mask.
#[derive(Debug, thiserror::Error)]
pub enum CanvasError {
    /// The input image bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// The source image could not be decoded.
    #[error("failed to decode image: {0}")]
    InvalidImage(#[from] image::ImageError),

    /// The source image decoded to a zero-sized bitmap.
    #[error("image has zero width or height")]
    ZeroDimensions,

    /// Finalization was attempted on surfaces that are not ready.
    #[error("cannot composite mask: {0}")]
    Composite(String),

    /// Encoding the punched image failed.
    #[error("failed to encode image: {0}")]
    Encode(String),

    /// A `data:` URL could not be parsed.
    #[error("invalid data URL: {0}")]
    InvalidDataUrl(String),
}

impl CanvasError {
    /// Whether this error means the source image itself was unusable.
    #[must_use]
    pub const fn is_invalid_image(&self) -> bool {
        matches!(
            self,
            Self::EmptyInput | Self::InvalidImage(_) | Self::ZeroDimensions
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn long_side_picks_larger_axis() {
        assert_eq!(Dimensions::new(800, 600).long_side(), 800);
        assert_eq!(Dimensions::new(300, 900).long_side(), 900);
        assert_eq!(Dimensions::new(512, 512).long_side(), 512);
    }

    #[test]
    fn empty_dimensions() {
        assert!(Dimensions::new(0, 10).is_empty());
        assert!(Dimensions::new(10, 0).is_empty());
        assert!(!Dimensions::new(1, 1).is_empty());
    }

    #[test]
    fn canvas_config_defaults() {
        let config = CanvasConfig::default();
        assert_eq!(config.max_dimension, 600);
        assert_eq!(config.filter, ResampleFilter::Triangle);
        assert_eq!(config.mask_edge, MaskEdge::Binary);
    }

    #[test]
    fn canvas_config_partial_json_uses_defaults() {
        let config: CanvasConfig = serde_json::from_str(r#"{"max_dimension": 256}"#).unwrap();
        assert_eq!(config.max_dimension, 256);
        assert_eq!(config.mask_edge, MaskEdge::Binary);
    }

    #[test]
    fn brush_diameter_is_clamped() {
        assert!((brush::clamp_diameter(5.0) - 10.0).abs() < f32::EPSILON);
        assert!((brush::clamp_diameter(250.0) - 100.0).abs() < f32::EPSILON);
        assert!((brush::clamp_diameter(42.0) - 42.0).abs() < f32::EPSILON);
        assert!((brush::clamp_diameter(f32::NAN) - 40.0).abs() < f32::EPSILON);
    }

    #[test]
    fn invalid_image_classification() {
        assert!(CanvasError::EmptyInput.is_invalid_image());
        assert!(CanvasError::ZeroDimensions.is_invalid_image());
        assert!(!CanvasError::Composite("x".into()).is_invalid_image());
    }

    #[test]
    fn error_display() {
        assert_eq!(
            CanvasError::Composite("stroke surface is empty".into()).to_string(),
            "cannot composite mask: stroke surface is empty",
        );
        assert_eq!(CanvasError::EmptyInput.to_string(), "input image data is empty");
    }
}
