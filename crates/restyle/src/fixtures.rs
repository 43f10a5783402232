//! Collaborators backed by a directory of canned responses.
//!
//! Layout:
//!
//! ```text
//! <dir>/analysis.json      analysis response (collaborator JSON shape)
//! <dir>/<style-slug>.png   generated image for each style
//! ```
//!
//! Useful for exercising a full run offline and for reproducing a
//! collaborator's output exactly.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use restyle_studio::{
    AnalysisResult, Analyzer, CollaboratorError, EncodedImage, Generator, style_slug,
};

/// Name of the analysis response file.
pub const ANALYSIS_FILE: &str = "analysis.json";

/// Serves analysis and generation responses from files in `root`.
#[derive(Debug, Clone)]
pub struct FixtureDir {
    root: PathBuf,
}

impl FixtureDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Path of the canned image for `style_name`.
    pub fn style_path(&self, style_name: &str) -> PathBuf {
        self.root.join(format!("{}.png", style_slug(style_name)))
    }
}

async fn read(path: &Path) -> Result<Vec<u8>, CollaboratorError> {
    tokio::fs::read(path)
        .await
        .map_err(|e| CollaboratorError::new(format!("error reading {}: {e}", path.display())))
}

#[async_trait]
impl Analyzer for FixtureDir {
    async fn analyze(&self, _original: &EncodedImage) -> Result<AnalysisResult, CollaboratorError> {
        let path = self.root.join(ANALYSIS_FILE);
        let bytes = read(&path).await?;
        let json = String::from_utf8(bytes)
            .map_err(|e| CollaboratorError::new(format!("{} is not UTF-8: {e}", path.display())))?;
        AnalysisResult::from_json(&json).map_err(|e| CollaboratorError::new(e.to_string()))
    }
}

#[async_trait]
impl Generator for FixtureDir {
    async fn generate(
        &self,
        _punched: &EncodedImage,
        style_name: &str,
    ) -> Result<EncodedImage, CollaboratorError> {
        let path = self.style_path(style_name);
        tracing::debug!(style = style_name, path = %path.display(), "serving fixture");
        read(&path).await.map(EncodedImage::png)
    }
}
