//! Input abstraction layer.
//!
//! Normalizes pointer and keyboard events into a unified `InputEvent`
//! enum. Coordinates arrive already transformed into diagram space by
//! the windowing shell.

use zxs_core::Pos;

/// Modifier keys held during an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub const SHIFT: Modifiers = Modifiers {
        shift: true,
        ..Modifiers::NONE
    };
}

/// A normalized input event from the shell.
#[derive(Debug, Clone)]
pub enum InputEvent {
    /// Pointer pressed (mouse down, touch start).
    PointerDown { pos: Pos, modifiers: Modifiers },

    /// Pointer moved while tracked.
    PointerMove { pos: Pos, modifiers: Modifiers },

    /// Pointer released.
    PointerUp { pos: Pos, modifiers: Modifiers },

    /// Keyboard event. `key` is the `KeyboardEvent.key`-style value
    /// (e.g. `"z"`, `"Delete"`, `"Escape"`).
    Key { key: String, modifiers: Modifiers },
}

impl InputEvent {
    pub fn pointer_down(x: f64, y: f64) -> Self {
        Self::PointerDown {
            pos: Pos::new(x, y),
            modifiers: Modifiers::NONE,
        }
    }

    pub fn pointer_move(x: f64, y: f64) -> Self {
        Self::PointerMove {
            pos: Pos::new(x, y),
            modifiers: Modifiers::NONE,
        }
    }

    pub fn pointer_up(x: f64, y: f64) -> Self {
        Self::PointerUp {
            pos: Pos::new(x, y),
            modifiers: Modifiers::NONE,
        }
    }

    pub fn key(key: &str) -> Self {
        Self::Key {
            key: key.to_string(),
            modifiers: Modifiers::NONE,
        }
    }

    pub fn with_modifiers(self, modifiers: Modifiers) -> Self {
        match self {
            Self::PointerDown { pos, .. } => Self::PointerDown { pos, modifiers },
            Self::PointerMove { pos, .. } => Self::PointerMove { pos, modifiers },
            Self::PointerUp { pos, .. } => Self::PointerUp { pos, modifiers },
            Self::Key { key, .. } => Self::Key { key, modifiers },
        }
    }

    /// Extract the position if this is a pointer event.
    pub fn position(&self) -> Option<Pos> {
        match self {
            Self::PointerDown { pos, .. }
            | Self::PointerMove { pos, .. }
            | Self::PointerUp { pos, .. } => Some(*pos),
            Self::Key { .. } => None,
        }
    }
}
