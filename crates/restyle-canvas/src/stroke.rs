//! Stroke input tracking: turn a stream of pointer events into brush
//! strokes on a [`WorkingCanvasPair`].
//!
//! The tracker is a two-state machine:
//!
//! ```text
//!          Down(p)                     Up / Leave
//!   Idle ───────────► Painting{last} ─────────────► Idle
//!                       │  ▲
//!                       └──┘ Move(p): segment last → p, last = p
//! ```
//!
//! Every `Move` paints the segment from the previously recorded point,
//! so the stroke stays continuous however sparsely the device samples.
//! A `Leave` terminates the stroke; moving back over the canvas does not
//! resume painting until a new `Down` arrives.

use serde::{Deserialize, Serialize};

use crate::surface::{WorkingCanvasPair, apply_stroke};
use crate::types::{Point, brush};

/// A device-independent pointer event in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerEvent {
    /// Gesture start (mouse button pressed, finger touched).
    Down(Point),
    /// Pointer moved.
    Move(Point),
    /// Gesture end (button released, finger lifted).
    Up,
    /// Pointer left the drawable surface.
    Leave,
}

/// Whether a stroke is in progress.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrackerState {
    /// No gesture in progress.
    Idle,
    /// A stroke is in progress; `last` is the most recent point painted.
    Painting {
        /// End point of the most recently painted segment.
        last: Point,
    },
}

/// Converts pointer gestures into calls to [`apply_stroke`].
#[derive(Debug, Clone)]
pub struct StrokeTracker {
    state: TrackerState,
    brush_diameter: f32,
}

impl Default for StrokeTracker {
    fn default() -> Self {
        Self::new(brush::DEFAULT_DIAMETER)
    }
}

impl StrokeTracker {
    /// Create an idle tracker with the given brush diameter (clamped to
    /// the selectable range).
    #[must_use]
    pub fn new(brush_diameter: f32) -> Self {
        Self {
            state: TrackerState::Idle,
            brush_diameter: brush::clamp_diameter(brush_diameter),
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> TrackerState {
        self.state
    }

    /// Returns `true` while a stroke is in progress.
    #[must_use]
    pub const fn is_painting(&self) -> bool {
        matches!(self.state, TrackerState::Painting { .. })
    }

    /// Current brush diameter in pixels.
    #[must_use]
    pub const fn brush_diameter(&self) -> f32 {
        self.brush_diameter
    }

    /// Change the brush diameter. Takes effect on the next segment,
    /// including mid-stroke.
    pub fn set_brush_diameter(&mut self, diameter: f32) {
        self.brush_diameter = brush::clamp_diameter(diameter);
    }

    /// Feed one pointer event, painting onto `canvas` as needed.
    pub fn handle(&mut self, event: PointerEvent, canvas: &mut WorkingCanvasPair) {
        match (self.state, event) {
            (_, PointerEvent::Down(p)) => {
                apply_stroke(canvas, &[p], self.brush_diameter);
                self.state = TrackerState::Painting { last: p };
            }
            (TrackerState::Painting { last }, PointerEvent::Move(p)) => {
                apply_stroke(canvas, &[last, p], self.brush_diameter);
                self.state = TrackerState::Painting { last: p };
            }
            (TrackerState::Idle, PointerEvent::Move(_)) => {}
            (_, PointerEvent::Up | PointerEvent::Leave) => {
                self.state = TrackerState::Idle;
            }
        }
    }

    /// Abandon any stroke in progress without painting.
    pub const fn cancel(&mut self) {
        self.state = TrackerState::Idle;
    }
}
