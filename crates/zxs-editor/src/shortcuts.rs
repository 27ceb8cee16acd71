//! Keyboard shortcut mapping.
//!
//! Maps key + modifier combos to semantic `Action`s. Tool keys follow
//! the classic tikzit-style bindings: `s` select, `v` vertex, `e` edge.

use crate::input::Modifiers;

/// Actions that keyboard shortcuts can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    // ── Tool switching ──
    ToolSelect,
    ToolVertex,
    ToolEdge,

    // ── Edit ──
    Undo,
    Redo,
    Delete,
    SelectAll,

    // ── UI ──
    Deselect,
}

/// Resolves key events into actions.
///
/// Platform-aware: `meta` is ⌘ on macOS, `ctrl` serves the same role
/// elsewhere; either counts as the command modifier.
pub struct ShortcutMap;

impl ShortcutMap {
    /// Resolve a key event to an action. `key` is the
    /// `KeyboardEvent.key` value. Returns `None` for unbound combos.
    pub fn resolve(key: &str, modifiers: Modifiers) -> Option<Action> {
        let cmd = modifiers.ctrl || modifiers.meta;

        // Most specific combos first.
        if cmd && modifiers.shift {
            return match key {
                "z" | "Z" => Some(Action::Redo),
                _ => None,
            };
        }

        if cmd {
            return match key {
                "z" | "Z" => Some(Action::Undo),
                "y" | "Y" => Some(Action::Redo),
                "a" | "A" => Some(Action::SelectAll),
                _ => None,
            };
        }

        match key {
            "s" | "S" => Some(Action::ToolSelect),
            "v" | "V" => Some(Action::ToolVertex),
            "e" | "E" => Some(Action::ToolEdge),
            "Delete" | "Backspace" => Some(Action::Delete),
            "Escape" => Some(Action::Deselect),
            _ => None,
        }
    }
}
