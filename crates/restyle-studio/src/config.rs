//! Studio configuration.

use restyle_canvas::{CanvasConfig, brush};
use serde::{Deserialize, Serialize};

/// Settings for a [`Session`](crate::Session).
///
/// Missing fields in JSON take their defaults:
///
/// ```
/// let config: restyle_studio::StudioConfig =
///     serde_json::from_str(r#"{"default_brush": 64}"#).unwrap();
/// assert_eq!(config.canvas.max_dimension, 600);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudioConfig {
    /// Working canvas and mask settings.
    pub canvas: CanvasConfig,
    /// Brush diameter a fresh session starts with; clamped to the
    /// slider range.
    pub default_brush: f32,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            canvas: CanvasConfig::default(),
            default_brush: brush::DEFAULT_DIAMETER,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use restyle_canvas::MaskEdge;

    use super::*;

    #[test]
    fn partial_json_uses_defaults() {
        let config: StudioConfig =
            serde_json::from_str(r#"{"canvas": {"mask_edge": "Soft"}}"#).unwrap();
        assert_eq!(config.canvas.mask_edge, MaskEdge::Soft);
        assert_eq!(config.canvas.max_dimension, 600);
        assert_eq!(config.default_brush, brush::DEFAULT_DIAMETER);
    }

    #[test]
    fn empty_object_is_default() {
        let config: StudioConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, StudioConfig::default());
    }
}
