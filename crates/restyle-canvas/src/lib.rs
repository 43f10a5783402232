//! restyle-canvas: Pure mask authoring (sans-IO).
//!
//! Turns a source portrait plus freehand brush strokes into a
//! "punched" PNG that is fully transparent wherever the user painted:
//! decode -> fit to working resolution -> paint strokes -> composite
//! with destination-out -> encode.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! byte slices and returns structured data. Orchestrating the AI
//! collaborators lives in `restyle-studio`.

pub mod codec;
pub mod composite;
pub mod decode;
pub mod fit;
pub mod stroke;
pub mod surface;
pub mod types;

pub use composite::{PuncturedImage, finalize};
pub use fit::ResampleFilter;
pub use stroke::{PointerEvent, StrokeTracker, TrackerState};
pub use surface::{WorkingCanvasPair, apply_stroke, initialize};
pub use types::{CanvasConfig, CanvasError, Dimensions, MaskEdge, Point, RgbaImage, brush};

/// Author a punched image in one call.
///
/// Decodes `image_bytes`, fits it to the working resolution, replays
/// `events` through a [`StrokeTracker`] starting at `brush_diameter`,
/// and finalizes with the configured [`MaskEdge`] policy.
///
/// # Errors
///
/// Returns [`CanvasError::EmptyInput`], [`CanvasError::InvalidImage`] or
/// [`CanvasError::ZeroDimensions`] if the source cannot be decoded, and
/// [`CanvasError::Encode`] if the result cannot be encoded.
pub fn punch(
    image_bytes: &[u8],
    events: &[PointerEvent],
    brush_diameter: f32,
    config: &CanvasConfig,
) -> Result<PuncturedImage, CanvasError> {
    let mut canvas = initialize(image_bytes, config)?;
    let mut tracker = StrokeTracker::new(brush_diameter);
    for event in events {
        tracker.handle(*event, &mut canvas);
    }
    finalize(&canvas, config.mask_edge)
}
