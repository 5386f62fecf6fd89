//! Error types for pawn-records operations.

use std::io;
use thiserror::Error;

/// The error type for pawn-records operations.
#[derive(Debug, Error)]
pub enum Error {
    /// IO error occurred while reading compiler output.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A well-formed record whose `kind` is not one the decoder knows.
    #[error("unknown record kind: {0}")]
    UnknownKind(String),
}

/// A specialized Result type for pawn-records operations.
pub type Result<T> = std::result::Result<T, Error>;
