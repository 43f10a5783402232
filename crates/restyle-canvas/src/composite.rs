//! Punched-image composite: erase the base wherever strokes cover it.
//!
//! [`finalize`] allocates a fresh buffer, copies the base surface into
//! it, then applies the stroke surface with destination-out blending.
//! It never mutates the pair, so calling it twice without new strokes
//! yields byte-identical output.

use crate::codec::{PNG_MIME, encode_png, to_data_url};
use crate::surface::WorkingCanvasPair;
use crate::types::{CanvasError, Dimensions, MaskEdge, RgbaImage};

/// The finalized, encoded punched image handed to generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PuncturedImage {
    png: Vec<u8>,
    dimensions: Dimensions,
}

impl PuncturedImage {
    /// The encoded PNG bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.png
    }

    /// Consume and return the encoded PNG bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.png
    }

    /// Dimensions of the punched image (the working resolution).
    #[must_use]
    pub const fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// MIME type of the encoded bytes.
    #[must_use]
    pub const fn mime(&self) -> &'static str {
        PNG_MIME
    }

    /// The punched image as a `data:image/png;base64,...` URL.
    #[must_use]
    pub fn data_url(&self) -> String {
        to_data_url(PNG_MIME, &self.png)
    }
}

/// Composite base and strokes into an unencoded RGBA image.
///
/// # Errors
///
/// Returns [`CanvasError::Composite`] if either surface is zero-sized or
/// the surfaces disagree on dimensions.
pub fn composite(pair: &WorkingCanvasPair, edge: MaskEdge) -> Result<RgbaImage, CanvasError> {
    let dims = pair.dimensions();
    if dims.is_empty() {
        return Err(CanvasError::Composite("canvas surfaces are not initialized".into()));
    }

    let mut out = pair.base().clone();
    let pixel_count = (dims.width as usize) * (dims.height as usize);
    let mut erased = 0usize;
    let mut covered = 0usize;
    for (pixel, coverage) in out.pixels_mut().zip(pair.coverage_bytes()) {
        covered += 1;
        if coverage == 0 {
            continue;
        }
        let alpha = match edge {
            MaskEdge::Binary => 0,
            MaskEdge::Soft => destination_out(pixel.0[3], coverage),
        };
        if alpha == 0 {
            pixel.0 = [0, 0, 0, 0];
            erased += 1;
        } else {
            pixel.0[3] = alpha;
        }
    }
    if covered != pixel_count {
        return Err(CanvasError::Composite(format!(
            "stroke surface has {covered} pixels, base has {pixel_count}"
        )));
    }
    tracing::debug!(
        width = dims.width,
        height = dims.height,
        erased,
        ?edge,
        "composited punched image"
    );
    Ok(out)
}

/// Composite the pair and encode it as a lossless PNG.
///
/// # Errors
///
/// Returns [`CanvasError::Composite`] if the surfaces are not ready and
/// [`CanvasError::Encode`] if PNG encoding fails.
pub fn finalize(pair: &WorkingCanvasPair, edge: MaskEdge) -> Result<PuncturedImage, CanvasError> {
    let punched = composite(pair, edge)?;
    let png = encode_png(&punched)?;
    Ok(PuncturedImage {
        png,
        dimensions: pair.dimensions(),
    })
}

/// `dst_alpha * (1 - src_alpha)` in 8-bit fixed point, rounded.
#[allow(clippy::cast_possible_truncation)]
const fn destination_out(dst_alpha: u8, src_alpha: u8) -> u8 {
    let product = (dst_alpha as u16) * (255 - src_alpha as u16);
    ((product + 127) / 255) as u8
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::codec::decode_png;
    use crate::surface::apply_stroke;
    use crate::types::Point;

    fn opaque_pair(w: u32, h: u32) -> WorkingCanvasPair {
        WorkingCanvasPair::from_base(RgbaImage::from_pixel(
            w,
            h,
            image::Rgba([180, 120, 90, 255]),
        ))
        .unwrap()
    }

    /// A 64x64 canvas with a horizontal 10px stroke along y = 20.
    fn stroked_pair() -> WorkingCanvasPair {
        let mut pair = opaque_pair(64, 64);
        apply_stroke(
            &mut pair,
            &[Point::new(10.0, 20.0), Point::new(50.0, 20.0)],
            10.0,
        );
        pair
    }

    #[test]
    fn painted_region_is_transparent_and_rest_is_opaque() {
        let pair = stroked_pair();
        let punched = finalize(&pair, MaskEdge::Binary).unwrap();
        let img = decode_png(punched.as_bytes()).unwrap();

        // The band x in 12..48, y in 17..23 sits well inside the stroke.
        for y in 17..23 {
            for x in 12..48 {
                assert_eq!(img.get_pixel(x, y).0[3], 0, "({x},{y}) should be erased");
            }
        }
        // Everything below y = 30 and left of x = 3 is untouched.
        for y in 0..64 {
            for x in 0..64 {
                if y >= 30 || x < 3 {
                    assert_eq!(
                        img.get_pixel(x, y).0,
                        [180, 120, 90, 255],
                        "({x},{y}) should be untouched"
                    );
                }
            }
        }
    }

    #[test]
    fn binary_alpha_has_only_two_values() {
        let mut pair = stroked_pair();
        // Overlap a second, crossing stroke.
        apply_stroke(
            &mut pair,
            &[Point::new(30.0, 5.0), Point::new(30.0, 60.0)],
            7.0,
        );
        let img = composite(&pair, MaskEdge::Binary).unwrap();
        assert!(img.pixels().all(|p| p.0[3] == 0 || p.0[3] == 255));
    }

    #[test]
    fn soft_edges_keep_partial_alpha() {
        let pair = stroked_pair();
        let img = composite(&pair, MaskEdge::Soft).unwrap();
        // A single 70% brush pass leaves roughly 30% of the base alpha.
        let center = img.get_pixel(30, 20).0[3];
        assert!(center > 0 && center < 255, "center alpha = {center}");
        assert_eq!(img.get_pixel(30, 50).0[3], 255);
    }

    #[test]
    fn finalize_is_pure() {
        let pair = stroked_pair();
        let first = finalize(&pair, MaskEdge::Binary).unwrap();
        let second = finalize(&pair, MaskEdge::Binary).unwrap();
        assert_eq!(first, second);
        assert!(pair.has_strokes(), "finalize must not clear strokes");
    }

    #[test]
    fn finalize_without_strokes_keeps_base() {
        let pair = opaque_pair(8, 8);
        let punched = finalize(&pair, MaskEdge::Binary).unwrap();
        let img = decode_png(punched.as_bytes()).unwrap();
        assert_eq!(img.as_raw(), pair.base().as_raw());
        assert_eq!(punched.dimensions(), Dimensions::new(8, 8));
    }

    #[test]
    fn punched_data_url_is_png() {
        let punched = finalize(&opaque_pair(2, 2), MaskEdge::Binary).unwrap();
        assert!(punched.data_url().starts_with("data:image/png;base64,"));
        assert_eq!(punched.mime(), "image/png");
    }

    #[test]
    fn destination_out_math() {
        assert_eq!(destination_out(255, 0), 255);
        assert_eq!(destination_out(255, 255), 0);
        assert_eq!(destination_out(255, 179), 76);
        assert_eq!(destination_out(0, 100), 0);
    }
}
