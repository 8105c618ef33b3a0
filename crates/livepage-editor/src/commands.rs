//! Editor commands.
//!
//! Everything the UI-wiring layer can ask of the editor outside pointer
//! input. Toolbar buttons, menus and keyboard shortcuts all resolve to an
//! `EditorCommand`, which `CanvasEditor::dispatch` applies.

use crate::tools::ToolKind;
use crate::viewport::ViewportMode;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "kebab-case")]
pub enum EditorCommand {
    /// Move the workspace by a screen-pixel delta.
    Pan { dx: f64, dy: f64 },
    /// Add `delta` to the scale factor.
    Zoom { delta: f64 },
    /// One zoom-button step.
    ZoomIn,
    ZoomOut,
    ToggleGrid,
    ToggleSnap,
    SetViewport { mode: ViewportMode },
    /// The workspace was resized by the host.
    ResizeContainer { width: f64, height: f64 },
    Undo,
    Redo,
    Deselect,
    /// Select the element behind a layer row.
    SelectLayer { index: usize },
    SetTool { tool: ToolKind },
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn commands_from_json() {
        let cmd: EditorCommand =
            serde_json::from_str(r#"{"command":"set-viewport","mode":"tablet"}"#).unwrap();
        assert_eq!(
            cmd,
            EditorCommand::SetViewport {
                mode: ViewportMode::Tablet
            }
        );
        let cmd: EditorCommand = serde_json::from_str(r#"{"command":"zoom-in"}"#).unwrap();
        assert_eq!(cmd, EditorCommand::ZoomIn);
    }

    #[test]
    fn resize_from_json() {
        let cmd: EditorCommand =
            serde_json::from_str(r#"{"command":"resize-container","width":900,"height":700}"#)
                .unwrap();
        assert_eq!(
            cmd,
            EditorCommand::ResizeContainer {
                width: 900.0,
                height: 700.0
            }
        );
    }
}
