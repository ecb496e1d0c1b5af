//! Error types for the entire application.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.

use crate::heap::HeapId;
use thiserror::Error;

/// Errors that can occur while loading a heap snapshot
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("JSON deserialization failed: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Failed to read snapshot: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid snapshot format: {0}")]
    InvalidFormat(String),
}

/// Contract violations raised by queries against a built analysis
#[derive(Error, Debug, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("Heap {0:?} was never registered by the heap graph")]
    UnknownHeap(HeapId),
}

/// Errors that can occur during file output
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write file: {0}")]
    WriteFailed(#[from] std::io::Error),

    #[error("Failed to serialize JSON: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("Invalid output path: {0}")]
    InvalidPath(String),
}
