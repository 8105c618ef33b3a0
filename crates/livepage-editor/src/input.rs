//! Input abstraction layer.
//!
//! Normalizes pointer, wheel and keyboard events from the host into a
//! unified `InputEvent` enum consumed by the manipulator. Coordinates are
//! screen pixels as reported by the host.

use kurbo::Point;

/// Which pointer button an event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointerButton {
    #[default]
    Primary,
    /// Wheel button; pans the workspace.
    Middle,
    Secondary,
}

/// Modifier keys held during an input event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub alt: bool,
    pub ctrl: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        shift: false,
        alt: false,
        ctrl: false,
        meta: false,
    };
}

/// A normalized input event.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    PointerDown {
        x: f64,
        y: f64,
        button: PointerButton,
        modifiers: Modifiers,
    },

    PointerMove {
        x: f64,
        y: f64,
        modifiers: Modifiers,
    },

    PointerUp {
        x: f64,
        y: f64,
        button: PointerButton,
    },

    /// Press and release on the same spot.
    Click { x: f64, y: f64 },

    /// Wheel scroll; positive `delta_y` scrolls down.
    Wheel { delta_y: f64 },

    /// Pointer left the workspace.
    PointerLeave,

    Key {
        key: String,
        modifiers: Modifiers,
    },
}

impl InputEvent {
    pub fn pointer_down(x: f64, y: f64, button: PointerButton) -> Self {
        Self::PointerDown {
            x,
            y,
            button,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn pointer_move(x: f64, y: f64) -> Self {
        Self::PointerMove {
            x,
            y,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn pointer_up(x: f64, y: f64, button: PointerButton) -> Self {
        Self::PointerUp { x, y, button }
    }

    /// Extract position if this is a positioned pointer event.
    pub fn position(&self) -> Option<Point> {
        match self {
            Self::PointerDown { x, y, .. }
            | Self::PointerMove { x, y, .. }
            | Self::PointerUp { x, y, .. }
            | Self::Click { x, y } => Some(Point::new(*x, *y)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions() {
        assert_eq!(
            InputEvent::pointer_move(3.0, 4.0).position(),
            Some(Point::new(3.0, 4.0))
        );
        assert_eq!(InputEvent::PointerLeave.position(), None);
        assert_eq!(InputEvent::Wheel { delta_y: 1.0 }.position(), None);
    }
}
