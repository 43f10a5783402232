//! Recorded pointer input for replaying a mask from the command line.
//!
//! A script is a JSON array of steps:
//!
//! ```json
//! [
//!   {"brush": 24},
//!   {"down": {"x": 120, "y": 40}},
//!   {"move": {"x": 180, "y": 42}},
//!   "up"
//! ]
//! ```

use std::path::Path;

use restyle_canvas::{Point, PointerEvent};
use serde::Deserialize;

/// One recorded input step.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Gesture start.
    Down(Point),
    /// Pointer movement.
    Move(Point),
    /// Gesture end.
    Up,
    /// Pointer left the canvas.
    Leave,
    /// Brush slider change.
    Brush(f32),
}

impl Step {
    /// The pointer event this step carries, if any.
    pub const fn pointer_event(self) -> Option<PointerEvent> {
        match self {
            Self::Down(p) => Some(PointerEvent::Down(p)),
            Self::Move(p) => Some(PointerEvent::Move(p)),
            Self::Up => Some(PointerEvent::Up),
            Self::Leave => Some(PointerEvent::Leave),
            Self::Brush(_) => None,
        }
    }
}

/// Parse a script from JSON text.
pub fn parse(json: &str) -> Result<Vec<Step>, String> {
    serde_json::from_str(json).map_err(|e| format!("invalid stroke script: {e}"))
}

/// Read and parse a script file.
pub fn load(path: &Path) -> Result<Vec<Step>, String> {
    let json = std::fs::read_to_string(path)
        .map_err(|e| format!("error reading {}: {e}", path.display()))?;
    parse(&json)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_step_kind() {
        let steps = parse(
            r#"[{"brush": 24}, {"down": {"x": 1, "y": 2}}, {"move": {"x": 3.5, "y": 4}}, "up", "leave"]"#,
        )
        .unwrap();
        assert_eq!(
            steps,
            [
                Step::Brush(24.0),
                Step::Down(Point::new(1.0, 2.0)),
                Step::Move(Point::new(3.5, 4.0)),
                Step::Up,
                Step::Leave,
            ]
        );
        assert_eq!(steps[0].pointer_event(), None);
        assert_eq!(steps[3].pointer_event(), Some(PointerEvent::Up));
    }

    #[test]
    fn rejects_unknown_step() {
        let err = parse(r#"["jump"]"#).unwrap_err();
        assert!(err.starts_with("invalid stroke script"));
    }
}
