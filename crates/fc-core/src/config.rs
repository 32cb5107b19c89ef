//! Canvas configuration.

use kurbo::{Point, Size};
use serde::Deserialize;

/// Tunables for the canvas engine.
///
/// Every field has a default, so a host may pass a partial JSON object
/// (`{"zoom_max": 4.0}`) and inherit the rest.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    /// Card width in world units.
    pub node_width: f64,
    /// Card height in world units.
    pub node_height: f64,
    pub zoom_min: f64,
    pub zoom_max: f64,
    /// Zoom change per wheel `deltaY` unit. Negative deltas zoom in.
    pub wheel_sensitivity: f64,
    /// Screen point (from the viewport's top-left) where new nodes appear.
    pub spawn_anchor: (f64, f64),
    /// Horizontal control-point offset as a fraction of the anchor gap.
    pub curve_tension: f64,
    /// Port hit radius in world units.
    pub port_radius: f64,
    /// Background grid pitch in world units.
    pub grid_spacing: f64,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            node_width: 320.0,
            node_height: 440.0,
            zoom_min: 0.15,
            zoom_max: 2.5,
            wheel_sensitivity: 0.001,
            spawn_anchor: (200.0, 200.0),
            curve_tension: 0.45,
            port_radius: 12.0,
            grid_spacing: 48.0,
        }
    }
}

impl CanvasConfig {
    /// Parse a (possibly partial) JSON config, then sanitize it.
    ///
    /// # Errors
    /// Returns the serde error message on malformed JSON.
    pub fn from_json(json: &str) -> Result<Self, String> {
        let config: CanvasConfig = serde_json::from_str(json).map_err(|e| e.to_string())?;
        Ok(config.sanitized())
    }

    /// Clamp values that would break the transform (zero or inverted zoom bounds).
    pub fn sanitized(mut self) -> Self {
        let defaults = CanvasConfig::default();
        if self.zoom_min.is_nan() || self.zoom_min <= 0.0 {
            log::warn!("zoom_min {} is not positive, using default", self.zoom_min);
            self.zoom_min = defaults.zoom_min;
        }
        if self.zoom_max.is_nan() || self.zoom_max < self.zoom_min {
            log::warn!(
                "zoom_max {} is below zoom_min {}, using zoom_min",
                self.zoom_max,
                self.zoom_min
            );
            self.zoom_max = self.zoom_min;
        }
        if self.node_width.is_nan()
            || self.node_height.is_nan()
            || self.node_width <= 0.0
            || self.node_height <= 0.0
        {
            self.node_width = defaults.node_width;
            self.node_height = defaults.node_height;
        }
        self
    }

    pub fn node_size(&self) -> Size {
        Size::new(self.node_width, self.node_height)
    }

    pub fn spawn_anchor(&self) -> Point {
        Point::new(self.spawn_anchor.0, self.spawn_anchor.1)
    }

    pub fn clamp_zoom(&self, zoom: f64) -> f64 {
        zoom.clamp(self.zoom_min, self.zoom_max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = CanvasConfig::from_json(r#"{"zoom_max": 4.0}"#).unwrap();
        assert_eq!(config.zoom_max, 4.0);
        assert_eq!(config.zoom_min, 0.15);
        assert_eq!(config.node_width, 320.0);
    }

    #[test]
    fn bad_zoom_bounds_are_sanitized() {
        let config = CanvasConfig::from_json(r#"{"zoom_min": 0.0, "zoom_max": -1.0}"#).unwrap();
        assert_eq!(config.zoom_min, 0.15);
        assert_eq!(config.zoom_max, 0.15);
    }

    #[test]
    fn nan_bounds_and_sizes_fall_back() {
        let config = CanvasConfig {
            zoom_min: f64::NAN,
            zoom_max: f64::NAN,
            node_width: f64::NAN,
            ..CanvasConfig::default()
        }
        .sanitized();
        assert_eq!(config.zoom_min, 0.15);
        assert_eq!(config.zoom_max, 0.15);
        assert_eq!(config.node_width, 320.0);
        assert_eq!(config.node_height, 440.0);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(CanvasConfig::from_json("{zoom").is_err());
    }
}
