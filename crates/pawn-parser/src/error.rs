//! Error types for pawn-parser.

use std::io;
use thiserror::Error;

use crate::oracle::OracleError;

/// Errors raised at the edges of the library: loading configuration and
/// checking the compiler. Parsing itself never fails towards callers.
#[derive(Debug, Error)]
pub enum Error {
    /// IO error occurred.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The compiler could not be started.
    #[error(transparent)]
    Oracle(#[from] OracleError),
}

/// A specialized Result type for pawn-parser operations.
pub type Result<T> = std::result::Result<T, Error>;
