//! Run state and the progress model shared with the display layer.
//!
//! [`ProgressModel`] is the single piece of mutable state shared between
//! the orchestrator (sole writer) and the display layer (readers). It is
//! backed by a `tokio::sync::watch` channel: every write computes a
//! complete [`ProgressSnapshot`] first and then swaps it in, so a reader
//! only ever sees whole snapshots.
//!
//! Every write is keyed to a [`RunId`]. A reset bumps the id, and any
//! write still carrying the old id is dropped. This is what keeps the
//! late resolution of a call dispatched before a reset from leaking into
//! the fresh run.

use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;

use crate::error::StudioError;
use crate::model::AnalysisResult;

/// Lifecycle of a single user run.
///
/// ```text
/// AwaitingInput ─upload─► AwaitingMask ─punched image─► Generating ─┬─► Complete
///       ▲                                                           └─► Failed
///       └──────────────────────── reset (from any state) ◄───────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunState {
    /// Waiting for a portrait to be uploaded or captured.
    AwaitingInput,
    /// A portrait is loaded; the user is painting the mask.
    AwaitingMask,
    /// Analysis and per-style generation are in progress.
    Generating,
    /// Every style has a generated image.
    Complete,
    /// A collaborator call failed; only a reset leaves this state.
    Failed,
}

impl RunState {
    /// All states in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::AwaitingInput,
        Self::AwaitingMask,
        Self::Generating,
        Self::Complete,
        Self::Failed,
    ];

    /// Display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::AwaitingInput => "AwaitingInput",
            Self::AwaitingMask => "AwaitingMask",
            Self::Generating => "Generating",
            Self::Complete => "Complete",
            Self::Failed => "Failed",
        }
    }

    /// Whether `self -> next` is a forward transition. Resets are not
    /// transitions; see [`ProgressModel::reset`].
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::AwaitingInput, Self::AwaitingMask)
                | (Self::AwaitingMask, Self::Generating)
                | (Self::Generating, Self::Complete | Self::Failed)
        )
    }

    /// Whether the run has finished, successfully or not.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Failed)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Identity of one run; bumped on every reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RunId(u64);

impl RunId {
    /// The id of the first run in a fresh model.
    pub const FIRST: Self = Self(0);

    /// The id following this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Everything the display layer reads, as one consistent value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressSnapshot {
    /// Which run this snapshot belongs to.
    pub run_id: RunId,
    /// Current lifecycle state.
    pub state: RunState,
    /// Latest partial or final analysis, if the analysis step finished.
    pub analysis: Option<Arc<AnalysisResult>>,
    /// Human-readable description of the current step.
    pub message: String,
    /// Last error, shown verbatim with a reset action.
    pub error: Option<String>,
    /// Camera or other device acquisition problem. Does not affect
    /// `state`; the display offers a retry.
    pub device_error: Option<String>,
}

impl ProgressSnapshot {
    /// The blank snapshot a run starts from.
    #[must_use]
    pub const fn initial(run_id: RunId) -> Self {
        Self {
            run_id,
            state: RunState::AwaitingInput,
            analysis: None,
            message: String::new(),
            error: None,
            device_error: None,
        }
    }

    /// Number of styles with a generated image.
    #[must_use]
    pub fn generated_count(&self) -> usize {
        self.analysis
            .as_ref()
            .map_or(0, |a| a.generated_count())
    }
}

/// Single-writer, many-reader progress state.
///
/// Cloning yields another handle to the same model.
#[derive(Debug, Clone)]
pub struct ProgressModel {
    tx: Arc<watch::Sender<ProgressSnapshot>>,
}

impl Default for ProgressModel {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressModel {
    /// A model in [`RunState::AwaitingInput`] for [`RunId::FIRST`].
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(ProgressSnapshot::initial(RunId::FIRST));
        Self { tx: Arc::new(tx) }
    }

    /// Observe every published snapshot.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ProgressSnapshot> {
        self.tx.subscribe()
    }

    /// A copy of the latest snapshot.
    #[must_use]
    pub fn snapshot(&self) -> ProgressSnapshot {
        self.tx.borrow().clone()
    }

    /// The id of the current run.
    #[must_use]
    pub fn current_run(&self) -> RunId {
        self.tx.borrow().run_id
    }

    /// The current lifecycle state.
    #[must_use]
    pub fn state(&self) -> RunState {
        self.tx.borrow().state
    }

    /// Discard everything and start a new run in
    /// [`RunState::AwaitingInput`]. Returns the new run's id.
    ///
    /// Does not cancel in-flight collaborator calls; their results are
    /// dropped when they try to publish under the old id.
    pub fn reset(&self) -> RunId {
        let mut next = RunId::FIRST;
        self.tx.send_modify(|current| {
            next = current.run_id.next();
            *current = ProgressSnapshot::initial(next);
        });
        tracing::info!(run = %next, "progress reset");
        next
    }

    /// Fail with [`StudioError::Superseded`] if `run` is no longer current.
    ///
    /// # Errors
    ///
    /// Returns [`StudioError::Superseded`] for a stale `run`.
    pub fn ensure_current(&self, run: RunId) -> Result<(), StudioError> {
        if self.current_run() == run {
            Ok(())
        } else {
            Err(StudioError::Superseded(run))
        }
    }

    /// Move the run forward to `to`, clearing any message-level error.
    ///
    /// # Errors
    ///
    /// Returns [`StudioError::Superseded`] for a stale `run` and
    /// [`StudioError::InvalidTransition`] if the move is not allowed
    /// from the current state.
    pub fn transition(&self, run: RunId, to: RunState) -> Result<(), StudioError> {
        self.update(run, |current| {
            if !current.state.can_transition_to(to) {
                return Err(StudioError::InvalidTransition {
                    from: current.state,
                    to,
                });
            }
            Ok(ProgressSnapshot {
                state: to,
                error: None,
                ..current.clone()
            })
        })
    }

    /// Replace the current-step message.
    ///
    /// # Errors
    ///
    /// Returns [`StudioError::Superseded`] for a stale `run`.
    pub fn set_message(&self, run: RunId, message: impl Into<String>) -> Result<(), StudioError> {
        let message = message.into();
        self.update(run, |current| {
            Ok(ProgressSnapshot {
                message,
                ..current.clone()
            })
        })
    }

    /// Publish a new partial or final analysis.
    ///
    /// # Errors
    ///
    /// Returns [`StudioError::Superseded`] for a stale `run`.
    pub fn publish_analysis(
        &self,
        run: RunId,
        analysis: Arc<AnalysisResult>,
    ) -> Result<(), StudioError> {
        self.update(run, |current| {
            Ok(ProgressSnapshot {
                analysis: Some(analysis),
                ..current.clone()
            })
        })
    }

    /// Move a generating run to [`RunState::Failed`] with `message`.
    ///
    /// The last published analysis is kept so already-generated styles
    /// stay visible.
    ///
    /// # Errors
    ///
    /// Returns [`StudioError::Superseded`] for a stale `run` and
    /// [`StudioError::InvalidTransition`] if the run is not generating.
    pub fn fail(&self, run: RunId, message: impl Into<String>) -> Result<(), StudioError> {
        let message = message.into();
        self.update(run, |current| {
            if !current.state.can_transition_to(RunState::Failed) {
                return Err(StudioError::InvalidTransition {
                    from: current.state,
                    to: RunState::Failed,
                });
            }
            Ok(ProgressSnapshot {
                state: RunState::Failed,
                error: Some(message),
                ..current.clone()
            })
        })
    }

    /// Record an error without changing state (e.g. an undecodable
    /// upload, which never starts a run).
    ///
    /// # Errors
    ///
    /// Returns [`StudioError::Superseded`] for a stale `run`.
    pub fn note_error(&self, run: RunId, message: impl Into<String>) -> Result<(), StudioError> {
        let message = message.into();
        self.update(run, |current| {
            Ok(ProgressSnapshot {
                error: Some(message),
                ..current.clone()
            })
        })
    }

    /// Record or clear a device acquisition problem on the current run.
    pub fn set_device_error(&self, message: Option<String>) {
        self.tx.send_modify(|current| current.device_error = message);
    }

    /// Apply `f` to the current snapshot and publish its result, if `run`
    /// is still current and `f` succeeds. Nothing is published otherwise.
    fn update<F>(&self, run: RunId, f: F) -> Result<(), StudioError>
    where
        F: FnOnce(&ProgressSnapshot) -> Result<ProgressSnapshot, StudioError>,
    {
        let mut outcome = Ok(());
        self.tx.send_if_modified(|current| {
            if current.run_id != run {
                outcome = Err(StudioError::Superseded(run));
                return false;
            }
            match f(current) {
                Ok(next) => {
                    *current = next;
                    true
                }
                Err(err) => {
                    outcome = Err(err);
                    false
                }
            }
        });
        if let Err(StudioError::Superseded(stale)) = &outcome {
            tracing::warn!(run = %stale, "dropping write from superseded run");
        }
        outcome
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn all_contains_every_variant() {
        let mut seen = std::collections::HashSet::new();
        for state in RunState::ALL {
            assert!(seen.insert(state), "duplicate state {state}");
        }
        assert_eq!(seen.len(), 5);
    }

    #[test]
    fn forward_transitions_only() {
        use RunState::{AwaitingInput, AwaitingMask, Complete, Failed, Generating};
        let allowed = [
            (AwaitingInput, AwaitingMask),
            (AwaitingMask, Generating),
            (Generating, Complete),
            (Generating, Failed),
        ];
        for from in RunState::ALL {
            for to in RunState::ALL {
                assert_eq!(
                    from.can_transition_to(to),
                    allowed.contains(&(from, to)),
                    "{from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn terminal_states() {
        assert!(RunState::Complete.is_terminal());
        assert!(RunState::Failed.is_terminal());
        assert!(!RunState::Generating.is_terminal());
    }

    #[test]
    fn starts_awaiting_input() {
        let model = ProgressModel::new();
        let snap = model.snapshot();
        assert_eq!(snap, ProgressSnapshot::initial(RunId::FIRST));
        assert_eq!(snap.generated_count(), 0);
    }

    #[test]
    fn transition_is_validated() {
        let model = ProgressModel::new();
        let run = model.current_run();
        let err = model.transition(run, RunState::Generating).unwrap_err();
        assert!(matches!(
            err,
            StudioError::InvalidTransition {
                from: RunState::AwaitingInput,
                to: RunState::Generating
            }
        ));
        model.transition(run, RunState::AwaitingMask).unwrap();
        assert_eq!(model.state(), RunState::AwaitingMask);
    }

    #[test]
    fn fail_requires_generating() {
        let model = ProgressModel::new();
        let run = model.current_run();
        assert!(model.fail(run, "boom").is_err());

        model.transition(run, RunState::AwaitingMask).unwrap();
        model.transition(run, RunState::Generating).unwrap();
        model.fail(run, "boom").unwrap();
        let snap = model.snapshot();
        assert_eq!(snap.state, RunState::Failed);
        assert_eq!(snap.error.as_deref(), Some("boom"));
        // Failed is terminal until reset.
        assert!(model.transition(run, RunState::Generating).is_err());
    }

    #[test]
    fn reset_bumps_run_and_drops_stale_writes() {
        let model = ProgressModel::new();
        let old = model.current_run();
        model.set_message(old, "working").unwrap();

        let new = model.reset();
        assert_ne!(old, new);
        assert_eq!(model.snapshot(), ProgressSnapshot::initial(new));

        assert!(matches!(
            model.set_message(old, "late result"),
            Err(StudioError::Superseded(_))
        ));
        assert!(model.ensure_current(old).is_err());
        assert!(model.ensure_current(new).is_ok());
        assert_eq!(model.snapshot().message, "");
    }

    #[test]
    fn subscribers_see_whole_snapshots() {
        let model = ProgressModel::new();
        let mut rx = model.subscribe();
        let run = model.current_run();

        model.set_message(run, "Analyzing").unwrap();
        assert!(rx.has_changed().unwrap());
        let seen = rx.borrow_and_update().clone();
        assert_eq!(seen.message, "Analyzing");
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn rejected_writes_do_not_notify() {
        let model = ProgressModel::new();
        let mut rx = model.subscribe();
        rx.borrow_and_update();
        let run = model.current_run();
        assert!(model.transition(run, RunState::Complete).is_err());
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn device_error_leaves_state_alone() {
        let model = ProgressModel::new();
        model.set_device_error(Some("camera permission denied".into()));
        let snap = model.snapshot();
        assert_eq!(snap.state, RunState::AwaitingInput);
        assert_eq!(snap.device_error.as_deref(), Some("camera permission denied"));
        model.set_device_error(None);
        assert!(model.snapshot().device_error.is_none());
    }

    #[test]
    fn clones_share_state() {
        let model = ProgressModel::new();
        let other = model.clone();
        other.reset();
        assert_eq!(model.current_run(), other.current_run());
    }
}
