pub mod commands;
pub mod config;
pub mod editor;
pub mod error;
pub mod grid;
pub mod history;
pub mod input;
pub mod layers;
pub mod properties;
pub mod shortcuts;
pub mod surface;
pub mod sync;
pub mod tools;
pub mod transform;
pub mod viewport;

pub use commands::EditorCommand;
pub use config::EditorConfig;
pub use editor::CanvasEditor;
pub use error::{EditorError, EditorResult};
pub use history::{History, Snapshot};
pub use input::{InputEvent, Modifiers, PointerButton};
pub use layers::LayerEntry;
pub use properties::{PanelField, PanelFields};
pub use shortcuts::ShortcutMap;
pub use surface::{LoadCanceller, LoadOutcome, LoadPhase};
pub use sync::{FileSink, MemorySink, NullSink, SourceBundle};
pub use tools::{Mode, ToolKind};
pub use transform::SurfaceTransform;
pub use viewport::ViewportMode;

// Re-export core so hosts need only this crate
pub use livepage_core;
