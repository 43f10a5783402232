//! PNG encoding and `data:` URL framing.
//!
//! The punched image crosses the orchestration boundary as a lossless
//! RGBA PNG, so alpha survives exactly. The AI collaborators exchange
//! images as `data:<mime>;base64,<payload>` strings.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::ImageEncoder;

use crate::types::{CanvasError, RgbaImage};

/// MIME type of the punched image.
pub const PNG_MIME: &str = "image/png";

/// Encode an RGBA image as PNG bytes.
///
/// # Errors
///
/// Returns [`CanvasError::Encode`] if PNG encoding fails.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, CanvasError> {
    let mut png_bytes = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
    encoder
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            image::ExtendedColorType::Rgba8,
        )
        .map_err(|e| CanvasError::Encode(e.to_string()))?;
    Ok(png_bytes)
}

/// Decode PNG bytes into an RGBA image.
///
/// # Errors
///
/// Returns [`CanvasError::EmptyInput`] for empty input or
/// [`CanvasError::InvalidImage`] if the bytes are not a valid PNG.
pub fn decode_png(bytes: &[u8]) -> Result<RgbaImage, CanvasError> {
    if bytes.is_empty() {
        return Err(CanvasError::EmptyInput);
    }
    let img = image::load_from_memory_with_format(bytes, image::ImageFormat::Png)?;
    Ok(img.to_rgba8())
}

/// Frame `bytes` as a base64 `data:` URL.
#[must_use]
pub fn to_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

/// Split a base64 `data:` URL into its MIME type and decoded payload.
///
/// # Errors
///
/// Returns [`CanvasError::InvalidDataUrl`] if the scheme, the `;base64`
/// marker or the payload is malformed.
pub fn parse_data_url(url: &str) -> Result<(String, Vec<u8>), CanvasError> {
    let rest = url
        .trim()
        .strip_prefix("data:")
        .ok_or_else(|| CanvasError::InvalidDataUrl("missing data: scheme".into()))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| CanvasError::InvalidDataUrl("missing ',' separator".into()))?;
    let mime = meta
        .strip_suffix(";base64")
        .ok_or_else(|| CanvasError::InvalidDataUrl("only base64 payloads are supported".into()))?;
    if mime.is_empty() {
        return Err(CanvasError::InvalidDataUrl("empty MIME type".into()));
    }
    let bytes = STANDARD
        .decode(payload)
        .map_err(|e| CanvasError::InvalidDataUrl(e.to_string()))?;
    Ok((mime.to_owned(), bytes))
}
