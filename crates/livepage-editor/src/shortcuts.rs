//! Keyboard shortcut mapping.
//!
//! Maps key + modifier combos to `EditorCommand`s so every host binds the
//! same keys:
//! - ⌘Z / ⌘⇧Z / ⌘Y = undo / redo
//! - ⌘= / ⌘- = zoom one button step
//! - V R T I = tools, G = grid, ⇧G = snap
//! - 1 2 3 = desktop / tablet / mobile
//! - Escape = deselect

use crate::commands::EditorCommand;
use crate::input::Modifiers;
use crate::tools::ToolKind;
use crate::viewport::ViewportMode;

/// Resolves key events into editor commands.
///
/// Platform-aware: on macOS `meta` is ⌘, elsewhere `ctrl` plays the same
/// role.
pub struct ShortcutMap;

impl ShortcutMap {
    /// Resolve a key event to a command.
    ///
    /// `key` is the `KeyboardEvent.key` value (e.g. `"z"`, `"Escape"`).
    /// Returns `None` if the key combo has no binding.
    pub fn resolve(
        key: &str,
        ctrl: bool,
        shift: bool,
        _alt: bool,
        meta: bool,
    ) -> Option<EditorCommand> {
        let cmd = ctrl || meta;

        // ── Modifier combos first (most specific) ──
        if cmd && shift {
            return match key {
                "z" | "Z" => Some(EditorCommand::Redo),
                _ => None,
            };
        }

        if cmd {
            return match key {
                "z" | "Z" => Some(EditorCommand::Undo),
                "y" | "Y" => Some(EditorCommand::Redo),
                "=" | "+" => Some(EditorCommand::ZoomIn),
                "-" => Some(EditorCommand::ZoomOut),
                _ => None,
            };
        }

        if shift {
            return match key {
                "g" | "G" => Some(EditorCommand::ToggleSnap),
                _ => None,
            };
        }

        // ── Single keys (no modifiers) ──
        let tool = |tool| Some(EditorCommand::SetTool { tool });
        let viewport = |mode| Some(EditorCommand::SetViewport { mode });
        match key {
            "v" | "V" => tool(ToolKind::Select),
            "r" | "R" => tool(ToolKind::Rectangle),
            "t" | "T" => tool(ToolKind::Text),
            "i" | "I" => tool(ToolKind::Image),
            "g" | "G" => Some(EditorCommand::ToggleGrid),
            "1" => viewport(ViewportMode::Desktop),
            "2" => viewport(ViewportMode::Tablet),
            "3" => viewport(ViewportMode::Mobile),
            "Escape" => Some(EditorCommand::Deselect),
            _ => None,
        }
    }

    /// [`resolve`](Self::resolve) with a [`Modifiers`] set.
    pub fn resolve_with(key: &str, modifiers: Modifiers) -> Option<EditorCommand> {
        Self::resolve(
            key,
            modifiers.ctrl,
            modifiers.shift,
            modifiers.alt,
            modifiers.meta,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_tool_shortcuts() {
        assert_eq!(
            ShortcutMap::resolve("v", false, false, false, false),
            Some(EditorCommand::SetTool {
                tool: ToolKind::Select
            })
        );
        assert_eq!(
            ShortcutMap::resolve("r", false, false, false, false),
            Some(EditorCommand::SetTool {
                tool: ToolKind::Rectangle
            })
        );
        assert_eq!(
            ShortcutMap::resolve("T", false, false, false, false),
            Some(EditorCommand::SetTool {
                tool: ToolKind::Text
            })
        );
        assert_eq!(
            ShortcutMap::resolve("i", false, false, false, false),
            Some(EditorCommand::SetTool {
                tool: ToolKind::Image
            })
        );
    }

    #[test]
    fn resolve_undo_redo() {
        // Cmd+Z → Undo
        assert_eq!(
            ShortcutMap::resolve("z", false, false, false, true),
            Some(EditorCommand::Undo)
        );
        // Ctrl+Z → Undo
        assert_eq!(
            ShortcutMap::resolve("z", true, false, false, false),
            Some(EditorCommand::Undo)
        );
        // Cmd+Shift+Z → Redo
        assert_eq!(
            ShortcutMap::resolve("Z", false, true, false, true),
            Some(EditorCommand::Redo)
        );
        // Cmd+Y → Redo
        assert_eq!(
            ShortcutMap::resolve("y", false, false, false, true),
            Some(EditorCommand::Redo)
        );
    }

    #[test]
    fn resolve_grid_and_snap() {
        assert_eq!(
            ShortcutMap::resolve("g", false, false, false, false),
            Some(EditorCommand::ToggleGrid)
        );
        assert_eq!(
            ShortcutMap::resolve("G", false, true, false, false),
            Some(EditorCommand::ToggleSnap)
        );
    }

    #[test]
    fn resolve_zoom() {
        assert_eq!(
            ShortcutMap::resolve("=", false, false, false, true),
            Some(EditorCommand::ZoomIn)
        );
        assert_eq!(
            ShortcutMap::resolve("+", true, false, false, false),
            Some(EditorCommand::ZoomIn)
        );
        assert_eq!(
            ShortcutMap::resolve("-", false, false, false, true),
            Some(EditorCommand::ZoomOut)
        );
    }

    #[test]
    fn resolve_viewports() {
        assert_eq!(
            ShortcutMap::resolve("2", false, false, false, false),
            Some(EditorCommand::SetViewport {
                mode: ViewportMode::Tablet
            })
        );
        assert_eq!(
            ShortcutMap::resolve("3", false, false, false, false),
            Some(EditorCommand::SetViewport {
                mode: ViewportMode::Mobile
            })
        );
    }

    #[test]
    fn resolve_escape() {
        assert_eq!(
            ShortcutMap::resolve("Escape", false, false, false, false),
            Some(EditorCommand::Deselect)
        );
    }

    #[test]
    fn resolve_unknown_key() {
        assert_eq!(ShortcutMap::resolve("q", false, false, false, false), None);
        assert_eq!(ShortcutMap::resolve("7", false, false, false, false), None);
        assert_eq!(ShortcutMap::resolve("g", false, false, false, true), None);
    }

    #[test]
    fn resolve_modifier_precedence() {
        assert_eq!(ShortcutMap::resolve("z", false, false, false, false), None);
        assert_eq!(
            ShortcutMap::resolve_with(
                "z",
                Modifiers {
                    meta: true,
                    ..Modifiers::NONE
                }
            ),
            Some(EditorCommand::Undo)
        );
    }
}
