//! Error types for Read node generation.

use thiserror::Error;

/// Errors raised while resolving a file-path knob into a Read node.
#[derive(Error, Debug)]
pub enum ReadError {
    /// Knob value could not be matched to anything on disk
    #[error("Path not found: {0}")]
    PathNotFound(String),

    /// Path has no digit run to use as frame number
    #[error("No frame number found in path: {0}")]
    NoFrameNumber(String),

    /// Wildcard pattern could not be compiled
    #[error("Glob error for pattern {pattern}: {source}")]
    Glob {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    /// Node referenced by name does not exist in the session
    #[error("Unknown node: {0}")]
    UnknownItem(String),

    /// Nothing selected in the session
    #[error("No node selected")]
    NoSelection,

    /// Node exists but lacks a required knob
    #[error("Node {item} has no knob '{knob}'")]
    MissingKnob { item: String, knob: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ReadError>;
