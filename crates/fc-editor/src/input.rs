//! Input abstraction layer.
//!
//! Normalizes mouse, touch, and pen pointer events into a unified
//! `InputEvent` enum consumed by the interaction session. Positions are
//! screen pixels relative to the canvas container.

use fc_core::Point;

/// Which button started a press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointerButton {
    #[default]
    Primary,
    Middle,
    Secondary,
}

impl PointerButton {
    /// Map a DOM `MouseEvent.button` value. Touch and pen contacts report 0.
    pub fn from_dom(button: i16) -> Self {
        match button {
            1 => Self::Middle,
            2 => Self::Secondary,
            _ => Self::Primary,
        }
    }
}

/// A normalized input event from any pointing device.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Pointer pressed (mouse down, touch start, pen contact).
    PointerDown { pos: Point, button: PointerButton },

    /// Pointer moved anywhere in the window while the canvas is mounted.
    PointerMove { pos: Point },

    /// Pointer released, wherever it happens.
    PointerUp { pos: Point },

    /// Pointer left the canvas container.
    PointerLeave,

    /// The window or canvas lost focus mid-gesture.
    Blur,

    /// Wheel over the canvas; positive `delta_y` scrolls down (zooms out).
    Wheel { pos: Point, delta_y: f64 },
}

impl InputEvent {
    pub fn pointer_down(x: f64, y: f64) -> Self {
        Self::PointerDown {
            pos: Point::new(x, y),
            button: PointerButton::Primary,
        }
    }

    pub fn pointer_move(x: f64, y: f64) -> Self {
        Self::PointerMove { pos: Point::new(x, y) }
    }

    pub fn pointer_up(x: f64, y: f64) -> Self {
        Self::PointerUp { pos: Point::new(x, y) }
    }

    /// Extract position if this is a positioned event.
    pub fn position(&self) -> Option<Point> {
        match self {
            Self::PointerDown { pos, .. }
            | Self::PointerMove { pos }
            | Self::PointerUp { pos }
            | Self::Wheel { pos, .. } => Some(*pos),
            Self::PointerLeave | Self::Blur => None,
        }
    }

    /// Events that end a gesture unconditionally.
    pub fn ends_gesture(&self) -> bool {
        matches!(self, Self::PointerUp { .. } | Self::PointerLeave | Self::Blur)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dom_buttons_map_to_pointer_buttons() {
        assert_eq!(PointerButton::from_dom(0), PointerButton::Primary);
        assert_eq!(PointerButton::from_dom(1), PointerButton::Middle);
        assert_eq!(PointerButton::from_dom(2), PointerButton::Secondary);
        // back/forward side buttons
        assert_eq!(PointerButton::from_dom(3), PointerButton::Primary);
    }

    #[test]
    fn leave_and_blur_end_gestures_without_position() {
        for event in [InputEvent::PointerLeave, InputEvent::Blur] {
            assert!(event.ends_gesture());
            assert_eq!(event.position(), None);
        }
        assert!(InputEvent::pointer_up(1.0, 2.0).ends_gesture());
        assert!(!InputEvent::pointer_move(1.0, 2.0).ends_gesture());
    }
}
