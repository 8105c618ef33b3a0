//! Error types for editor operations.
//!
//! Nothing here is fatal. Callers log the error and carry on; the editor
//! state is left as it was before the failed operation.

use thiserror::Error;

/// Result type for editor operations.
pub type EditorResult<T> = Result<T, EditorError>;

/// Recoverable editor failures.
#[derive(Debug, Error)]
pub enum EditorError {
    /// The element reference belongs to a document that has been replaced.
    #[error("stale element reference (generation {generation}, current {current})")]
    StaleReference { generation: u64, current: u64 },

    /// A property edit was rejected.
    #[error("invalid value {value:?} for {field}")]
    InvalidValue { field: &'static str, value: String },

    /// A layer index past the end of the layer list.
    #[error("layer {index} out of range ({len} layers)")]
    LayerOutOfRange { index: usize, len: usize },

    /// A history snapshot failed to encode or decode.
    #[error("snapshot error: {0}")]
    Snapshot(String),

    /// Editor configuration could not be read.
    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),

    /// Editor configuration parsed but holds unusable values.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

impl From<rmp_serde::encode::Error> for EditorError {
    fn from(err: rmp_serde::encode::Error) -> Self {
        Self::Snapshot(err.to_string())
    }
}

impl From<rmp_serde::decode::Error> for EditorError {
    fn from(err: rmp_serde::decode::Error) -> Self {
        Self::Snapshot(err.to_string())
    }
}
