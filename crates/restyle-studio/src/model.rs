//! Analysis and hairstyle model shared by the orchestrator and the
//! display layer.
//!
//! All types here are immutable once built. Attaching a generated image
//! to a suggestion produces a new value; the orchestrator re-derives the
//! whole [`AnalysisResult`] after every step and publishes it behind an
//! `Arc`, so readers never see a half-updated sequence.

use std::sync::Arc;

use restyle_canvas::codec::{parse_data_url, to_data_url};
use restyle_canvas::{CanvasError, PuncturedImage};
use serde::{Deserialize, Serialize};

use crate::error::StudioError;

/// An encoded image (PNG, JPEG, ...) together with its MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    mime: String,
    bytes: Vec<u8>,
}

impl EncodedImage {
    /// Wrap encoded bytes.
    #[must_use]
    pub fn new(mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            mime: mime.into(),
            bytes,
        }
    }

    /// Wrap PNG bytes.
    #[must_use]
    pub fn png(bytes: Vec<u8>) -> Self {
        Self::new(restyle_canvas::codec::PNG_MIME, bytes)
    }

    /// Parse a base64 `data:` URL.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::InvalidDataUrl`] if the URL is malformed.
    pub fn from_data_url(url: &str) -> Result<Self, CanvasError> {
        let (mime, bytes) = parse_data_url(url)?;
        Ok(Self { mime, bytes })
    }

    /// MIME type, e.g. `image/png`.
    #[must_use]
    pub fn mime(&self) -> &str {
        &self.mime
    }

    /// The encoded bytes.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Frame as a base64 `data:` URL.
    #[must_use]
    pub fn data_url(&self) -> String {
        to_data_url(&self.mime, &self.bytes)
    }
}

impl From<PuncturedImage> for EncodedImage {
    fn from(punched: PuncturedImage) -> Self {
        let mime = punched.mime();
        Self::new(mime, punched.into_bytes())
    }
}

/// One candidate hairstyle as described by the analysis step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleDescriptor {
    /// Short label, used in progress messages and download filenames.
    pub name: String,
    /// Why the style suits the analysed face.
    pub description: String,
    /// Suggested hair length, e.g. "Short" or "Shoulder-length".
    pub length_recommendation: String,
}

/// A style descriptor plus its generated image, once available.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HairstyleSuggestion {
    /// What the analysis step suggested.
    #[serde(flatten)]
    pub style: StyleDescriptor,
    /// Set exactly once, when this style's generation step completes.
    #[serde(skip)]
    generated_image: Option<Arc<EncodedImage>>,
}

impl HairstyleSuggestion {
    /// A suggestion with no generated image yet.
    #[must_use]
    pub const fn new(style: StyleDescriptor) -> Self {
        Self {
            style,
            generated_image: None,
        }
    }

    /// The style's display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.style.name
    }

    /// The generated image, if this style has been rendered.
    #[must_use]
    pub fn generated_image(&self) -> Option<&Arc<EncodedImage>> {
        self.generated_image.as_ref()
    }

    /// Whether a generated image is attached.
    #[must_use]
    pub const fn is_generated(&self) -> bool {
        self.generated_image.is_some()
    }

    /// Return a copy with `image` attached.
    ///
    /// Returns `None` if an image is already attached; an attachment is
    /// never replaced.
    #[must_use]
    pub fn with_generated_image(&self, image: Arc<EncodedImage>) -> Option<Self> {
        if self.generated_image.is_some() {
            return None;
        }
        Some(Self {
            style: self.style.clone(),
            generated_image: Some(image),
        })
    }
}

impl From<StyleDescriptor> for HairstyleSuggestion {
    fn from(style: StyleDescriptor) -> Self {
        Self::new(style)
    }
}

/// Face analysis plus the ordered hairstyle suggestions.
///
/// Deserializes from the analysis collaborator's JSON shape:
///
/// ```json
/// {
///   "face_shape": "Oval",
///   "forehead_size": "Medium",
///   "jawline": "Soft",
///   "hair_texture": "Wavy",
///   "hairstyles": [
///     { "name": "Soft Waves", "description": "...", "length_recommendation": "Medium" }
///   ]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Detected face shape.
    pub face_shape: String,
    /// Relative forehead size.
    pub forehead_size: String,
    /// Jawline description.
    pub jawline: String,
    /// Current hair texture.
    pub hair_texture: String,
    /// Suggestions in generation order. The length never changes after
    /// the analysis step.
    pub hairstyles: Vec<HairstyleSuggestion>,
}

impl AnalysisResult {
    /// Parse the analysis collaborator's JSON response.
    ///
    /// # Errors
    ///
    /// Returns [`StudioError::InvalidAnalysis`] if the JSON does not
    /// match the expected shape or fails [`validate`](Self::validate).
    pub fn from_json(json: &str) -> Result<Self, StudioError> {
        let result: Self = serde_json::from_str(json)
            .map_err(|e| StudioError::InvalidAnalysis(format!("malformed analysis JSON: {e}")))?;
        result.validate()?;
        Ok(result)
    }

    /// Check the collaborator contract: at least one style, every name
    /// non-blank, no generated image attached yet.
    ///
    /// # Errors
    ///
    /// Returns [`StudioError::InvalidAnalysis`] describing the first
    /// violation.
    pub fn validate(&self) -> Result<(), StudioError> {
        if self.hairstyles.is_empty() {
            return Err(StudioError::InvalidAnalysis(
                "no hairstyles were suggested".into(),
            ));
        }
        if let Some(index) = self
            .hairstyles
            .iter()
            .position(|s| s.name().trim().is_empty())
        {
            return Err(StudioError::InvalidAnalysis(format!(
                "hairstyle {index} has an empty name"
            )));
        }
        if let Some(index) = self
            .hairstyles
            .iter()
            .position(HairstyleSuggestion::is_generated)
        {
            return Err(StudioError::InvalidAnalysis(format!(
                "hairstyle {index} already has a generated image"
            )));
        }
        Ok(())
    }

    /// Number of suggestions with a generated image attached.
    #[must_use]
    pub fn generated_count(&self) -> usize {
        self.hairstyles.iter().filter(|s| s.is_generated()).count()
    }

    /// Whether every suggestion has a generated image.
    #[must_use]
    pub fn is_fully_generated(&self) -> bool {
        self.hairstyles.iter().all(HairstyleSuggestion::is_generated)
    }

    /// Re-derive the result with `image` attached to suggestion `index`.
    ///
    /// Every other suggestion is carried over unchanged. Returns `None`
    /// if `index` is out of range or already has an image.
    #[must_use]
    pub fn with_generated(&self, index: usize, image: Arc<EncodedImage>) -> Option<Self> {
        let attached = self.hairstyles.get(index)?.with_generated_image(image)?;
        let hairstyles = self
            .hairstyles
            .iter()
            .enumerate()
            .map(|(i, s)| if i == index { attached.clone() } else { s.clone() })
            .collect();
        Some(Self {
            face_shape: self.face_shape.clone(),
            forehead_size: self.forehead_size.clone(),
            jawline: self.jawline.clone(),
            hair_texture: self.hair_texture.clone(),
            hairstyles,
        })
    }
}
