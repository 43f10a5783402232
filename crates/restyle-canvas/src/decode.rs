//! Source image decoding.
//!
//! Accepts raw image bytes (PNG, JPEG, BMP, WebP) and produces a
//! [`DynamicImage`] ready to be fitted to the working canvas.
//!
//! This is the first step of mask authoring: raw bytes in, bitmap out.

use image::DynamicImage;

use crate::types::{CanvasError, Dimensions};

/// Decode raw image bytes.
///
/// Supports whatever formats the `image` crate was built with (PNG,
/// JPEG, BMP, WebP).
///
/// # Errors
///
/// Returns [`CanvasError::EmptyInput`] if `bytes` is empty.
/// Returns [`CanvasError::InvalidImage`] if the image format is
/// unrecognized or the data is corrupt.
/// Returns [`CanvasError::ZeroDimensions`] if the decoded bitmap has
/// no pixels.
pub fn decode(bytes: &[u8]) -> Result<DynamicImage, CanvasError> {
    if bytes.is_empty() {
        return Err(CanvasError::EmptyInput);
    }

    let img = image::load_from_memory(bytes)?;
    if Dimensions::new(img.width(), img.height()).is_empty() {
        return Err(CanvasError::ZeroDimensions);
    }
    tracing::debug!(
        width = img.width(),
        height = img.height(),
        "decoded source image"
    );
    Ok(img)
}
