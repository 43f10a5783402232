//! One user's pass through the studio: upload, paint, generate, reset.
//!
//! [`Session`] owns the local authoring state (source image, working
//! canvas, stroke tracker, punched image) and keeps it in step with the
//! shared [`ProgressModel`]. The display layer may hold its own handle to
//! the model and reset it at any time; the session notices the new run id
//! on its next call and drops everything it held for the old run.

use std::sync::Arc;

use restyle_canvas::surface::initialize;
use restyle_canvas::{CanvasError, PointerEvent, StrokeTracker, WorkingCanvasPair, finalize};

use crate::collaborator::{Analyzer, Generator};
use crate::config::StudioConfig;
use crate::error::StudioError;
use crate::model::{AnalysisResult, EncodedImage};
use crate::orchestrator::Orchestrator;
use crate::progress::{ProgressModel, RunId, RunState};

/// Authoring state for the current run.
#[derive(Debug)]
pub struct Session {
    config: StudioConfig,
    progress: ProgressModel,
    run: RunId,
    source: Option<EncodedImage>,
    canvas: Option<WorkingCanvasPair>,
    tracker: StrokeTracker,
    punched: Option<EncodedImage>,
}

impl Session {
    /// A session with its own fresh progress model.
    #[must_use]
    pub fn new(config: StudioConfig) -> Self {
        Self::with_progress(config, ProgressModel::new())
    }

    /// A session writing to an existing progress model.
    #[must_use]
    pub fn with_progress(config: StudioConfig, progress: ProgressModel) -> Self {
        let run = progress.current_run();
        let tracker = StrokeTracker::new(config.default_brush);
        Self {
            config,
            progress,
            run,
            source: None,
            canvas: None,
            tracker,
            punched: None,
        }
    }

    /// The shared progress model.
    #[must_use]
    pub const fn progress(&self) -> &ProgressModel {
        &self.progress
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &StudioConfig {
        &self.config
    }

    /// The uploaded portrait, if any.
    #[must_use]
    pub const fn source(&self) -> Option<&EncodedImage> {
        self.source.as_ref()
    }

    /// The working canvas, once a portrait is loaded.
    #[must_use]
    pub const fn canvas(&self) -> Option<&WorkingCanvasPair> {
        self.canvas.as_ref()
    }

    /// The stroke tracker.
    #[must_use]
    pub const fn tracker(&self) -> &StrokeTracker {
        &self.tracker
    }

    /// The finalized punched image, once [`finish_mask`](Self::finish_mask)
    /// has succeeded.
    #[must_use]
    pub const fn punched(&self) -> Option<&EncodedImage> {
        self.punched.as_ref()
    }

    /// Load a portrait and start mask authoring.
    ///
    /// # Errors
    ///
    /// - [`StudioError::InvalidTransition`] unless the run is awaiting
    ///   input.
    /// - [`StudioError::Canvas`] if the bytes are not a usable image. The
    ///   error is recorded on the progress model and the run stays in
    ///   [`RunState::AwaitingInput`].
    pub fn upload(&mut self, bytes: Vec<u8>, mime: &str) -> Result<(), StudioError> {
        self.sync();
        let state = self.progress.state();
        if !state.can_transition_to(RunState::AwaitingMask) {
            return Err(StudioError::InvalidTransition {
                from: state,
                to: RunState::AwaitingMask,
            });
        }

        let canvas = match initialize(&bytes, &self.config.canvas) {
            Ok(canvas) => canvas,
            Err(err) => {
                let err = StudioError::from(err);
                tracing::warn!(error = %err, "rejected upload");
                self.progress.note_error(self.run, err.user_message())?;
                return Err(err);
            }
        };

        let dims = canvas.dimensions();
        self.progress.transition(self.run, RunState::AwaitingMask)?;
        tracing::info!(
            run = %self.run,
            mime,
            width = dims.width,
            height = dims.height,
            "portrait loaded"
        );
        self.source = Some(EncodedImage::new(mime, bytes));
        self.canvas = Some(canvas);
        self.tracker = StrokeTracker::new(self.config.default_brush);
        self.punched = None;
        Ok(())
    }

    /// [`upload`](Self::upload) from a base64 `data:` URL, as produced by
    /// a file reader or a camera capture.
    ///
    /// # Errors
    ///
    /// As [`upload`](Self::upload), plus [`StudioError::Canvas`] for a
    /// malformed URL.
    pub fn upload_data_url(&mut self, url: &str) -> Result<(), StudioError> {
        let image = EncodedImage::from_data_url(url)?;
        let mime = image.mime().to_owned();
        self.upload(image.bytes().to_vec(), &mime)
    }

    /// Feed a pointer event to the stroke tracker.
    ///
    /// # Errors
    ///
    /// Returns [`StudioError::NotReady`] unless the mask is being
    /// authored.
    pub fn pointer(&mut self, event: PointerEvent) -> Result<(), StudioError> {
        self.ensure_editable()?;
        let canvas = self
            .canvas
            .as_mut()
            .ok_or(StudioError::NotReady("no portrait uploaded"))?;
        self.tracker.handle(event, canvas);
        Ok(())
    }

    /// Change the brush diameter (clamped to the slider range). Applies to
    /// the next painted segment, mid-stroke included.
    pub fn set_brush_diameter(&mut self, diameter: f32) {
        self.tracker.set_brush_diameter(diameter);
    }

    /// Erase every brush mark on the working canvas.
    ///
    /// # Errors
    ///
    /// Returns [`StudioError::NotReady`] unless the mask is being
    /// authored.
    pub fn clear_strokes(&mut self) -> Result<(), StudioError> {
        self.ensure_editable()?;
        if let Some(canvas) = self.canvas.as_mut() {
            canvas.clear_strokes();
        }
        self.tracker.cancel();
        Ok(())
    }

    /// Finalize the mask into the punched image handed to the generator.
    ///
    /// The run stays in [`RunState::AwaitingMask`]; generation moves it
    /// forward.
    ///
    /// # Errors
    ///
    /// - [`StudioError::InvalidTransition`] unless the mask is being
    ///   authored.
    /// - [`StudioError::Canvas`] if compositing or encoding fails; a
    ///   generic message is recorded on the progress model.
    pub fn finish_mask(&mut self) -> Result<&EncodedImage, StudioError> {
        self.sync();
        let state = self.progress.state();
        if !state.can_transition_to(RunState::Generating) {
            return Err(StudioError::InvalidTransition {
                from: state,
                to: RunState::Generating,
            });
        }

        self.tracker.cancel();
        let finalized = self
            .canvas
            .as_ref()
            .ok_or_else(|| CanvasError::Composite("no working canvas".into()))
            .and_then(|canvas| finalize(canvas, self.config.canvas.mask_edge));
        match finalized {
            Ok(punched) => {
                tracing::info!(run = %self.run, bytes = punched.as_bytes().len(), "mask finalized");
                Ok(self.punched.insert(punched.into()))
            }
            Err(err) => {
                let err = StudioError::from(err);
                tracing::warn!(error = %err, "mask finalization failed");
                self.progress.note_error(self.run, err.user_message())?;
                Err(err)
            }
        }
    }

    /// Run analysis and generation for the current portrait and mask.
    ///
    /// # Errors
    ///
    /// - [`StudioError::NotReady`] if no portrait or punched image exists.
    /// - Anything [`Orchestrator::run`] returns. On
    ///   [`StudioError::Superseded`] the session's local state for the
    ///   old run is dropped.
    pub async fn generate<A: Analyzer, G: Generator>(
        &mut self,
        orchestrator: &Orchestrator<A, G>,
    ) -> Result<Arc<AnalysisResult>, StudioError> {
        self.sync();
        let source = self
            .source
            .as_ref()
            .ok_or(StudioError::NotReady("no portrait uploaded"))?;
        let punched = self
            .punched
            .as_ref()
            .ok_or(StudioError::NotReady("mask not finalized"))?;

        let outcome = orchestrator
            .run(self.run, source, punched, &self.progress)
            .await;
        if matches!(outcome, Err(StudioError::Superseded(_))) {
            self.sync();
        }
        outcome
    }

    /// Discard the current run and everything authored for it.
    pub fn reset(&mut self) -> RunId {
        let run = self.progress.reset();
        self.adopt(run);
        run
    }

    /// Record a camera or device failure. The run state is unchanged so
    /// the user can retry or upload instead.
    pub fn report_device_error(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(%message, "device unavailable");
        self.progress.set_device_error(Some(message));
    }

    /// Clear a previously reported device failure.
    pub fn clear_device_error(&self) {
        self.progress.set_device_error(None);
    }

    fn ensure_editable(&mut self) -> Result<(), StudioError> {
        self.sync();
        if self.progress.state() == RunState::AwaitingMask && self.punched.is_none() {
            Ok(())
        } else {
            Err(StudioError::NotReady("mask is not being edited"))
        }
    }

    /// Drop local state if the progress model moved on to a new run.
    fn sync(&mut self) {
        let current = self.progress.current_run();
        if current != self.run {
            tracing::debug!(old = %self.run, new = %current, "session follows reset");
            self.adopt(current);
        }
    }

    fn adopt(&mut self, run: RunId) {
        self.run = run;
        self.source = None;
        self.canvas = None;
        self.punched = None;
        self.tracker = StrokeTracker::new(self.config.default_brush);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use async_trait::async_trait;
    use restyle_canvas::codec::{decode_png, encode_png};
    use restyle_canvas::{Point, RgbaImage};

    use super::*;
    use crate::collaborator::CollaboratorError;
    use crate::error::GENERIC_FAILURE_MESSAGE;

    fn portrait() -> Vec<u8> {
        encode_png(&RgbaImage::from_pixel(80, 60, image::Rgba([90, 70, 50, 255]))).unwrap()
    }

    fn loaded() -> Session {
        let mut session = Session::new(StudioConfig::default());
        session.upload(portrait(), "image/png").unwrap();
        session
    }

    struct OneStyle;

    #[async_trait]
    impl Analyzer for OneStyle {
        async fn analyze(&self, _: &EncodedImage) -> Result<AnalysisResult, CollaboratorError> {
            AnalysisResult::from_json(
                r#"{"face_shape":"Oval","forehead_size":"Medium","jawline":"Soft",
                    "hair_texture":"Wavy","hairstyles":[
                    {"name":"Bob","description":"","length_recommendation":"Short"}]}"#,
            )
            .map_err(|e| CollaboratorError::new(e.to_string()))
        }
    }

    struct Echo;

    #[async_trait]
    impl Generator for Echo {
        async fn generate(
            &self,
            punched: &EncodedImage,
            _: &str,
        ) -> Result<EncodedImage, CollaboratorError> {
            Ok(punched.clone())
        }
    }

    #[test]
    fn upload_moves_to_awaiting_mask() {
        let session = loaded();
        assert_eq!(session.progress().state(), RunState::AwaitingMask);
        let dims = session.canvas().unwrap().dimensions();
        assert_eq!((dims.width, dims.height), (80, 60));
        assert_eq!(session.source().unwrap().mime(), "image/png");
    }

    #[test]
    fn invalid_upload_stays_awaiting_input() {
        let mut session = Session::new(StudioConfig::default());
        let err = session.upload(b"not an image".to_vec(), "image/png").unwrap_err();
        assert!(matches!(err, StudioError::Canvas(ref e) if e.is_invalid_image()));

        let snap = session.progress().snapshot();
        assert_eq!(snap.state, RunState::AwaitingInput);
        assert!(snap.error.is_some());
        assert!(session.canvas().is_none());

        // A valid upload afterwards still works and clears the error.
        session.upload(portrait(), "image/png").unwrap();
        assert!(session.progress().snapshot().error.is_none());
    }

    #[test]
    fn second_upload_is_out_of_order() {
        let mut session = loaded();
        let err = session.upload(portrait(), "image/png").unwrap_err();
        assert!(matches!(
            err,
            StudioError::InvalidTransition {
                from: RunState::AwaitingMask,
                to: RunState::AwaitingMask
            }
        ));
    }

    #[test]
    fn upload_from_data_url() {
        let url = EncodedImage::png(portrait()).data_url();
        let mut session = Session::new(StudioConfig::default());
        session.upload_data_url(&url).unwrap();
        assert_eq!(session.progress().state(), RunState::AwaitingMask);
    }

    #[test]
    fn painting_before_upload_is_rejected() {
        let mut session = Session::new(StudioConfig::default());
        let err = session
            .pointer(PointerEvent::Down(Point::new(1.0, 1.0)))
            .unwrap_err();
        assert!(matches!(err, StudioError::NotReady(_)));
    }

    #[test]
    fn finish_mask_punches_painted_region() {
        let mut session = loaded();
        session.set_brush_diameter(10.0);
        session.pointer(PointerEvent::Down(Point::new(10.0, 30.0))).unwrap();
        session.pointer(PointerEvent::Move(Point::new(70.0, 30.0))).unwrap();
        session.pointer(PointerEvent::Up).unwrap();

        let punched = session.finish_mask().unwrap().clone();
        assert_eq!(punched.mime(), "image/png");
        let img = decode_png(punched.bytes()).unwrap();
        assert_eq!(img.get_pixel(40, 30)[3], 0);
        assert_eq!(img.get_pixel(40, 5)[3], 255);

        // The mask is frozen once finalized.
        assert!(session.pointer(PointerEvent::Down(Point::new(5.0, 5.0))).is_err());
        assert_eq!(session.progress().state(), RunState::AwaitingMask);
    }

    #[test]
    fn clear_strokes_erases_marks() {
        let mut session = loaded();
        session.pointer(PointerEvent::Down(Point::new(20.0, 20.0))).unwrap();
        assert!(session.canvas().unwrap().has_strokes());
        session.clear_strokes().unwrap();
        assert!(!session.canvas().unwrap().has_strokes());
        assert!(!session.tracker().is_painting());
    }

    #[test]
    fn finish_mask_before_upload_is_out_of_order() {
        let mut session = Session::new(StudioConfig::default());
        assert!(matches!(
            session.finish_mask(),
            Err(StudioError::InvalidTransition {
                from: RunState::AwaitingInput,
                ..
            })
        ));
    }

    #[test]
    fn composite_failures_show_generic_message() {
        let mut session = loaded();
        session.canvas = None;
        let err = session.finish_mask().unwrap_err();
        assert!(matches!(err, StudioError::Canvas(CanvasError::Composite(_))));
        assert_eq!(
            session.progress().snapshot().error.as_deref(),
            Some(GENERIC_FAILURE_MESSAGE)
        );
    }

    #[tokio::test]
    async fn generate_requires_punched_image() {
        let mut session = loaded();
        let orchestrator = Orchestrator::new(OneStyle, Echo);
        assert!(matches!(
            session.generate(&orchestrator).await,
            Err(StudioError::NotReady(_))
        ));
    }

    #[tokio::test]
    async fn full_pass_then_reset() {
        let mut session = loaded();
        session.pointer(PointerEvent::Down(Point::new(40.0, 10.0))).unwrap();
        session.finish_mask().unwrap();

        let orchestrator = Orchestrator::new(OneStyle, Echo);
        let result = session.generate(&orchestrator).await.unwrap();
        assert!(result.is_fully_generated());
        assert_eq!(session.progress().state(), RunState::Complete);

        let first = session.progress().current_run();
        let next = session.reset();
        assert_ne!(first, next);
        assert!(session.source().is_none());
        assert!(session.canvas().is_none());
        assert!(session.punched().is_none());
        assert_eq!(session.progress().snapshot(), crate::ProgressSnapshot::initial(next));
    }

    #[test]
    fn external_reset_drops_local_state() {
        let mut session = loaded();
        let handle = session.progress().clone();
        handle.reset();

        let err = session
            .pointer(PointerEvent::Down(Point::new(1.0, 1.0)))
            .unwrap_err();
        assert!(matches!(err, StudioError::NotReady(_)));
        assert!(session.canvas().is_none());
        session.upload(portrait(), "image/png").unwrap();
    }

    #[test]
    fn device_errors_do_not_change_state() {
        let session = loaded();
        session.report_device_error("Could not access camera");
        let snap = session.progress().snapshot();
        assert_eq!(snap.state, RunState::AwaitingMask);
        assert_eq!(snap.device_error.as_deref(), Some("Could not access camera"));
        session.clear_device_error();
        assert!(session.progress().snapshot().device_error.is_none());
    }
}
