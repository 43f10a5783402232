//! Errors surfaced by the studio.
//!
//! Collaborator failures are carried verbatim: their `Display` is the
//! collaborator's own message, which is what the display layer shows.

use restyle_canvas::CanvasError;

use crate::collaborator::CollaboratorError;
use crate::progress::{RunId, RunState};

/// Message shown when mask finalization fails unexpectedly.
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong while preparing your image.";

/// Errors that can occur while authoring a mask or driving a run.
#[derive(Debug, thiserror::Error)]
pub enum StudioError {
    /// Mask authoring failed (undecodable source, composite, encode).
    #[error(transparent)]
    Canvas(#[from] CanvasError),

    /// The analysis collaborator failed.
    #[error(transparent)]
    Analysis(CollaboratorError),

    /// The analysis collaborator returned a result that breaks its
    /// contract (no styles, blank names, malformed JSON).
    #[error("analysis returned an unusable result: {0}")]
    InvalidAnalysis(String),

    /// The generation collaborator failed for one style.
    #[error("{source}")]
    Generation {
        /// Name of the style being generated.
        style: String,
        /// The collaborator's error.
        source: CollaboratorError,
    },

    /// An operation was attempted in a state that does not allow it.
    #[error("cannot move from {from} to {to}")]
    InvalidTransition {
        /// State at the time of the call.
        from: RunState,
        /// State the call would have moved to.
        to: RunState,
    },

    /// A precondition of the current step is missing.
    #[error("not ready: {0}")]
    NotReady(&'static str),

    /// The run was reset while this work was in flight; its result was
    /// discarded.
    #[error("run {0} was superseded by a reset")]
    Superseded(RunId),
}

impl StudioError {
    /// The message to show the user for this error.
    ///
    /// Composite failures are contract violations, so they are reported
    /// with a generic message instead of internal detail.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Canvas(CanvasError::Composite(_)) => GENERIC_FAILURE_MESSAGE.to_owned(),
            other => other.to_string(),
        }
    }
}
