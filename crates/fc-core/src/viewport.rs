//! Screen ↔ world coordinate transform.
//!
//! `screen = world * zoom + pan`. Every consumer (node placement, port
//! anchors, edge geometry, hit testing) goes through this one type so the
//! drawn position and the hit-testable position never drift apart.

use crate::config::CanvasConfig;
use kurbo::{Point, Rect, Vec2};

/// Pan offset (screen pixels) and zoom factor of the open canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pan: Vec2,
    zoom: f64,
    zoom_min: f64,
    zoom_max: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(&CanvasConfig::default())
    }
}

impl Viewport {
    /// Identity viewport bounded by the config's zoom range. Unusable
    /// bounds are sanitized first.
    pub fn new(config: &CanvasConfig) -> Self {
        let config = config.clone().sanitized();
        Self {
            pan: Vec2::ZERO,
            zoom: 1.0_f64.clamp(config.zoom_min, config.zoom_max),
            zoom_min: config.zoom_min,
            zoom_max: config.zoom_max,
        }
    }

    pub fn pan(&self) -> Vec2 {
        self.pan
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn zoom_range(&self) -> (f64, f64) {
        (self.zoom_min, self.zoom_max)
    }

    pub fn world_to_screen(&self, p: Point) -> Point {
        Point::new(p.x * self.zoom + self.pan.x, p.y * self.zoom + self.pan.y)
    }

    pub fn screen_to_world(&self, p: Point) -> Point {
        Point::new((p.x - self.pan.x) / self.zoom, (p.y - self.pan.y) / self.zoom)
    }

    /// A pointer delta in screen pixels expressed in world units.
    /// Pan does not scale, so only zoom applies.
    pub fn screen_delta_to_world(&self, d: Vec2) -> Vec2 {
        d / self.zoom
    }

    /// Scale a world length to screen pixels.
    pub fn scale(&self, world_len: f64) -> f64 {
        world_len * self.zoom
    }

    pub fn world_rect_to_screen(&self, r: Rect) -> Rect {
        Rect::from_points(
            self.world_to_screen(r.origin()),
            self.world_to_screen(Point::new(r.x1, r.y1)),
        )
    }

    pub fn set_pan(&mut self, pan: Vec2) {
        self.pan = pan;
    }

    /// Set zoom, clamped to the configured range. Pan is left as is.
    pub fn set_zoom(&mut self, zoom: f64) {
        if zoom.is_finite() {
            self.zoom = zoom.clamp(self.zoom_min, self.zoom_max);
        }
    }

    /// Apply one wheel event: `zoom += delta_y * -sensitivity`, clamped.
    /// Returns `true` if the zoom changed.
    pub fn zoom_by_wheel(&mut self, delta_y: f64, sensitivity: f64) -> bool {
        let before = self.zoom;
        self.set_zoom(self.zoom + delta_y * -sensitivity);
        self.zoom != before
    }

    /// Back to 100% without moving the pan.
    pub fn reset_zoom(&mut self) {
        self.set_zoom(1.0);
    }

    /// Back to the identity transform.
    pub fn reset(&mut self) {
        self.pan = Vec2::ZERO;
        self.reset_zoom();
    }

    /// Rounded percentage for the toolbar readout (`100` at zoom 1.0).
    pub fn zoom_percent(&self) -> u32 {
        (self.zoom * 100.0).round() as u32
    }

    /// Zoom as a fraction of the maximum, for the toolbar gauge.
    pub fn zoom_fraction(&self) -> f64 {
        self.zoom / self.zoom_max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9
    }

    #[test]
    fn inverted_zoom_bounds_do_not_panic() {
        let config = CanvasConfig {
            zoom_min: 2.0,
            zoom_max: 0.5,
            ..CanvasConfig::default()
        };
        let mut vp = Viewport::new(&config);
        assert_eq!(vp.zoom(), 2.0);
        vp.set_zoom(0.1);
        assert_eq!(vp.zoom(), 2.0);
    }

    #[test]
    fn roundtrip_identity_over_grid() {
        let mut vp = Viewport::default();
        for &(px, py) in &[(0.0, 0.0), (-350.5, 12.25), (1e4, -7.0)] {
            for &zoom in &[0.15, 0.5, 1.0, 1.7, 2.5] {
                vp.set_pan(Vec2::new(px, py));
                vp.set_zoom(zoom);
                for &(x, y) in &[(0.0, 0.0), (320.0, 220.0), (-1234.5, 987.125)] {
                    let p = Point::new(x, y);
                    let back = vp.screen_to_world(vp.world_to_screen(p));
                    assert!(approx(back, p), "{p:?} -> {back:?} at pan={px},{py} zoom={zoom}");
                }
            }
        }
    }

    #[test]
    fn world_to_screen_applies_zoom_then_pan() {
        let mut vp = Viewport::default();
        vp.set_pan(Vec2::new(10.0, -20.0));
        vp.set_zoom(2.0);
        assert_eq!(vp.world_to_screen(Point::new(5.0, 5.0)), Point::new(20.0, -10.0));
    }

    #[test]
    fn wheel_zoom_is_clamped() {
        let mut vp = Viewport::default();
        for _ in 0..100 {
            vp.zoom_by_wheel(-5000.0, 0.001);
        }
        assert_eq!(vp.zoom(), 2.5);
        vp.zoom_by_wheel(1e9, 0.001);
        assert_eq!(vp.zoom(), 0.15);
        assert!(!vp.zoom_by_wheel(100.0, 0.001), "already at min");
    }

    #[test]
    fn wheel_zoom_offsets_additively() {
        let mut vp = Viewport::default();
        vp.zoom_by_wheel(-100.0, 0.001);
        assert!((vp.zoom() - 1.1).abs() < 1e-12);
    }

    #[test]
    fn non_finite_zoom_is_ignored() {
        let mut vp = Viewport::default();
        vp.set_zoom(f64::NAN);
        assert_eq!(vp.zoom(), 1.0);
    }

    #[test]
    fn reset_zoom_keeps_pan() {
        let mut vp = Viewport::default();
        vp.set_pan(Vec2::new(40.0, 50.0));
        vp.set_zoom(2.0);
        vp.reset_zoom();
        assert_eq!(vp.zoom(), 1.0);
        assert_eq!(vp.pan(), Vec2::new(40.0, 50.0));
        vp.reset();
        assert_eq!(vp.pan(), Vec2::ZERO);
    }

    #[test]
    fn toolbar_readouts() {
        let mut vp = Viewport::default();
        vp.set_zoom(1.25);
        assert_eq!(vp.zoom_percent(), 125);
        assert!((vp.zoom_fraction() - 0.5).abs() < 1e-12);
    }
}
