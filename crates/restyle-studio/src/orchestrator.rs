//! Generation orchestration: analyze once, then generate each suggested
//! style in order, publishing progress after every step.
//!
//! # Steps
//!
//! 1. `AwaitingMask -> Generating` (the punched image has arrived).
//! 2. **Analyze**: one call with the original portrait.
//! 3. **Generate**: for `i in 0..N`, announce "look i+1 of N", call the
//!    generator with the punched image and style `i`'s name, attach the
//!    result and publish the re-derived analysis.
//! 4. `Generating -> Complete`.
//!
//! Exactly one collaborator call is in flight at a time; each `await`
//! is a suspension point and the next call starts only after the
//! previous one resolved. Any collaborator failure aborts the rest of
//! the run and moves it to `Failed` with the error message verbatim.
//! There is no retry and no resume. No timeout is imposed here either:
//! a collaborator that never resolves leaves the run in `Generating`,
//! so collaborators own their own deadlines.
//!
//! Every write goes through [`ProgressModel`] under the run's
//! [`RunId`]; if the model was reset while a call was in flight, the
//! late result is discarded and the run ends with
//! [`StudioError::Superseded`].

use std::sync::Arc;

use web_time::Instant;

use crate::collaborator::{Analyzer, Generator};
use crate::error::StudioError;
use crate::model::{AnalysisResult, EncodedImage};
use crate::progress::{ProgressModel, RunId, RunState};

/// Progress message shown while the analysis step runs.
pub const ANALYZING_MESSAGE: &str = "Analyzing your facial architecture...";

/// Progress message shown before generating style `index` of `total`.
#[must_use]
pub fn generating_message(index: usize, total: usize, style_name: &str) -> String {
    format!("Generating look {} of {total}: {style_name}", index + 1)
}

/// Drives one run from a punched image to a fully generated analysis.
#[derive(Debug, Clone)]
pub struct Orchestrator<A, G> {
    analyzer: A,
    generator: G,
}

impl<A: Analyzer, G: Generator> Orchestrator<A, G> {
    /// Create an orchestrator over the two collaborators.
    #[must_use]
    pub const fn new(analyzer: A, generator: G) -> Self {
        Self {
            analyzer,
            generator,
        }
    }

    /// The analysis collaborator.
    #[must_use]
    pub const fn analyzer(&self) -> &A {
        &self.analyzer
    }

    /// The generation collaborator.
    #[must_use]
    pub const fn generator(&self) -> &G {
        &self.generator
    }

    /// Run analysis and every generation step for `run`.
    ///
    /// `original` is the uploaded portrait; `punched` is the finalized
    /// mask image. Returns the fully generated analysis on success.
    ///
    /// # Errors
    ///
    /// - [`StudioError::InvalidTransition`] if the run is not awaiting a
    ///   mask; nothing is published in that case.
    /// - [`StudioError::Analysis`], [`StudioError::InvalidAnalysis`] or
    ///   [`StudioError::Generation`] when a step fails; the run is moved
    ///   to [`RunState::Failed`] first.
    /// - [`StudioError::Superseded`] if the model was reset mid-run.
    #[tracing::instrument(name = "run", skip_all, fields(run = %run))]
    pub async fn run(
        &self,
        run: RunId,
        original: &EncodedImage,
        punched: &EncodedImage,
        progress: &ProgressModel,
    ) -> Result<Arc<AnalysisResult>, StudioError> {
        progress.transition(run, RunState::Generating)?;
        let started = Instant::now();

        match self.drive(run, original, punched, progress).await {
            Ok(result) => {
                progress.transition(run, RunState::Complete)?;
                tracing::info!(
                    styles = result.hairstyles.len(),
                    elapsed_ms = started.elapsed().as_millis(),
                    "run complete"
                );
                Ok(result)
            }
            Err(err @ StudioError::Superseded(_)) => {
                tracing::warn!("run superseded by reset; discarding result");
                Err(err)
            }
            Err(err) => {
                tracing::warn!(error = %err, "run failed");
                match progress.fail(run, err.user_message()) {
                    Ok(()) | Err(StudioError::Superseded(_)) => {}
                    Err(other) => tracing::warn!(error = %other, "could not record failure"),
                }
                Err(err)
            }
        }
    }

    async fn drive(
        &self,
        run: RunId,
        original: &EncodedImage,
        punched: &EncodedImage,
        progress: &ProgressModel,
    ) -> Result<Arc<AnalysisResult>, StudioError> {
        progress.set_message(run, ANALYZING_MESSAGE)?;
        let step_started = Instant::now();
        let analysis = self
            .analyzer
            .analyze(original)
            .await
            .map_err(StudioError::Analysis)?;
        progress.ensure_current(run)?;
        analysis.validate()?;

        let total = analysis.hairstyles.len();
        tracing::info!(
            styles = total,
            face_shape = %analysis.face_shape,
            elapsed_ms = step_started.elapsed().as_millis(),
            "analysis complete"
        );
        let mut current = Arc::new(analysis);
        progress.publish_analysis(run, Arc::clone(&current))?;

        for index in 0..total {
            let name = current.hairstyles[index].name().to_owned();
            progress.set_message(run, generating_message(index, total, &name))?;

            let step_started = Instant::now();
            let image = self
                .generator
                .generate(punched, &name)
                .await
                .map_err(|source| StudioError::Generation {
                    style: name.clone(),
                    source,
                })?;
            progress.ensure_current(run)?;

            // `validate` rejected pre-attached images, so every index is
            // still empty here and this error is unreachable.
            let next = current
                .with_generated(index, Arc::new(image))
                .ok_or(StudioError::NotReady("style already has a generated image"))?;
            current = Arc::new(next);
            progress.publish_analysis(run, Arc::clone(&current))?;
            tracing::info!(
                index,
                total,
                style = %name,
                elapsed_ms = step_started.elapsed().as_millis(),
                "style generated"
            );
        }

        Ok(current)
    }
}
