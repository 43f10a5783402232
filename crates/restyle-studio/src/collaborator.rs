//! Contracts for the external AI collaborators.
//!
//! The orchestrator only knows these two traits. Implementations own
//! their transport, retries and timeouts; the orchestrator awaits each
//! call exactly once and never has two in flight.

use std::sync::Arc;

use async_trait::async_trait;

use crate::model::{AnalysisResult, EncodedImage};

/// A descriptive failure from a collaborator, shown to the user as-is.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct CollaboratorError {
    message: String,
}

impl CollaboratorError {
    /// Create an error with the given message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<String> for CollaboratorError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

impl From<&str> for CollaboratorError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// Face analysis: original portrait in, attributes plus an ordered list
/// of style descriptors out.
///
/// The result must contain at least one style, and every style name
/// must be usable as a progress-message token and filename fragment.
#[async_trait]
pub trait Analyzer: Send + Sync {
    /// Analyse the original, un-punched portrait.
    async fn analyze(&self, original: &EncodedImage) -> Result<AnalysisResult, CollaboratorError>;
}

/// Region-constrained generation: punched image plus a style name in,
/// one generated image out.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Render `style_name` into the transparent region of `punched`.
    async fn generate(
        &self,
        punched: &EncodedImage,
        style_name: &str,
    ) -> Result<EncodedImage, CollaboratorError>;
}

#[async_trait]
impl<T: Analyzer + ?Sized> Analyzer for Arc<T> {
    async fn analyze(&self, original: &EncodedImage) -> Result<AnalysisResult, CollaboratorError> {
        (**self).analyze(original).await
    }
}

#[async_trait]
impl<T: Generator + ?Sized> Generator for Arc<T> {
    async fn generate(
        &self,
        punched: &EncodedImage,
        style_name: &str,
    ) -> Result<EncodedImage, CollaboratorError> {
        (**self).generate(punched, style_name).await
    }
}
