//! The working canvas pair: an immutable base surface plus a stroke
//! surface that accumulates brush marks.
//!
//! Both surfaces always share the same dimensions. A new source image
//! never resizes an existing pair in place; [`initialize`] builds a
//! fresh pair instead.
//!
//! Strokes are rasterised with `tiny-skia` (anti-aliased, round caps
//! and joins) using the semi-opaque white brush paint. Painting is
//! source-over, so drawing the same points twice increases coverage.
//! Coverage intensity only matters under [`MaskEdge::Soft`]; the
//! default binary policy treats any coverage as "painted".
//!
//! [`MaskEdge::Soft`]: crate::types::MaskEdge::Soft

use image::DynamicImage;
use tiny_skia::{FillRule, LineCap, LineJoin, Paint, PathBuilder, Pixmap, Stroke, Transform};

use crate::fit::{fit_within, resize_to};
use crate::types::{CanvasConfig, CanvasError, Dimensions, GrayImage, Point, RgbaImage, brush};

/// A base surface and a stroke surface bound to one source image.
///
/// Cloning is a deep copy of both rasters.
#[derive(Debug, Clone)]
pub struct WorkingCanvasPair {
    /// The resized source image. Never mutated after construction.
    base: RgbaImage,
    /// Brush marks only (premultiplied RGBA).
    strokes: Pixmap,
}

/// Decode `source_bytes` and build a working canvas pair.
///
/// # Errors
///
/// Returns [`CanvasError::EmptyInput`], [`CanvasError::InvalidImage`]
/// or [`CanvasError::ZeroDimensions`] if the source cannot be decoded.
pub fn initialize(
    source_bytes: &[u8],
    config: &CanvasConfig,
) -> Result<WorkingCanvasPair, CanvasError> {
    let image = crate::decode::decode(source_bytes)?;
    initialize_image(&image, config)
}

/// Build a working canvas pair from an already-decoded image.
///
/// # Errors
///
/// Returns [`CanvasError::ZeroDimensions`] if the image has no pixels.
pub fn initialize_image(
    image: &DynamicImage,
    config: &CanvasConfig,
) -> Result<WorkingCanvasPair, CanvasError> {
    let source = Dimensions::new(image.width(), image.height());
    if source.is_empty() {
        return Err(CanvasError::ZeroDimensions);
    }
    let target = fit_within(source, config.max_dimension);
    let base = resize_to(image, target, config.filter);
    tracing::debug!(
        source_width = source.width,
        source_height = source.height,
        width = target.width,
        height = target.height,
        filter = %config.filter,
        "initialized working canvas"
    );
    WorkingCanvasPair::from_base(base)
}

impl WorkingCanvasPair {
    /// Wrap an already-sized base image with an empty stroke surface.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::ZeroDimensions`] if `base` has no pixels.
    pub fn from_base(base: RgbaImage) -> Result<Self, CanvasError> {
        let strokes = Pixmap::new(base.width(), base.height()).ok_or(CanvasError::ZeroDimensions)?;
        Ok(Self { base, strokes })
    }

    /// Dimensions shared by both surfaces.
    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.base.width(), self.base.height())
    }

    /// The resized source image.
    #[must_use]
    pub const fn base(&self) -> &RgbaImage {
        &self.base
    }

    /// Stroke coverage of pixel `(x, y)` (0 = untouched, 255 = fully
    /// covered). Out-of-bounds coordinates report `0`.
    #[must_use]
    pub fn coverage_at(&self, x: u32, y: u32) -> u8 {
        self.strokes.pixel(x, y).map_or(0, |p| p.alpha())
    }

    /// Stroke coverage as a single-channel image, for previews.
    #[must_use]
    pub fn coverage_mask(&self) -> GrayImage {
        let (w, h) = (self.strokes.width(), self.strokes.height());
        GrayImage::from_raw(w, h, self.coverage_bytes().collect())
            .unwrap_or_else(|| GrayImage::new(w, h))
    }

    /// Raw premultiplied stroke alpha, one byte per pixel, row-major.
    pub(crate) fn coverage_bytes(&self) -> impl Iterator<Item = u8> + '_ {
        self.strokes.data().chunks_exact(4).map(|px| px[3])
    }

    /// Whether any brush mark has been applied since the last clear.
    #[must_use]
    pub fn has_strokes(&self) -> bool {
        self.coverage_bytes().any(|a| a > 0)
    }

    /// Erase every brush mark, keeping the base surface.
    pub fn clear_strokes(&mut self) {
        self.strokes.fill(tiny_skia::Color::TRANSPARENT);
    }
}

/// Paint a continuous round-capped, round-joined line through `points`
/// onto the stroke surface only.
///
/// A single point paints a round dot of the brush diameter. Empty input,
/// non-positive or non-finite diameters, and non-finite points are
/// ignored.
#[allow(clippy::cast_possible_truncation)]
pub fn apply_stroke(pair: &mut WorkingCanvasPair, points: &[Point], brush_diameter: f32) {
    if !(brush_diameter.is_finite() && brush_diameter > 0.0) {
        return;
    }
    let points: Vec<Point> = points.iter().copied().filter(|p| p.is_finite()).collect();
    let Some(first) = points.first() else {
        return;
    };

    let mut paint = Paint::default();
    let [r, g, b, a] = brush::COLOR_RGBA;
    paint.set_color_rgba8(r, g, b, a);
    paint.anti_alias = true;

    if points.len() == 1 {
        let radius = brush_diameter / 2.0;
        let Some(dot) = PathBuilder::from_circle(first.x as f32, first.y as f32, radius) else {
            return;
        };
        pair.strokes.fill_path(
            &dot,
            &paint,
            FillRule::Winding,
            Transform::identity(),
            None,
        );
        tracing::trace!(x = first.x, y = first.y, brush_diameter, "painted dot");
        return;
    }

    let mut pb = PathBuilder::new();
    pb.move_to(first.x as f32, first.y as f32);
    for p in &points[1..] {
        pb.line_to(p.x as f32, p.y as f32);
    }
    let Some(path) = pb.finish() else {
        return;
    };

    let stroke = Stroke {
        width: brush_diameter,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Stroke::default()
    };
    pair.strokes
        .stroke_path(&path, &paint, &stroke, Transform::identity(), None);
    tracing::trace!(points = points.len(), brush_diameter, "painted stroke");
}
