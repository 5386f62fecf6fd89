//! Error types for compiler oracle operations.

use thiserror::Error;

/// Errors that can occur while starting a compiler invocation.
#[derive(Debug, Error)]
pub enum OracleError {
    /// Failed to spawn the compiler process.
    #[error("failed to spawn compiler '{command}': {source}")]
    SpawnFailed {
        /// The command that failed to spawn.
        command: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Compiler executable not found.
    #[error("{command} not found\n\n{install_hint}")]
    NotFound {
        /// The command that was not found.
        command: String,
        /// Installation instructions for the missing command.
        install_hint: String,
    },

    /// A standard stream of the spawned process was not captured.
    #[error("compiler {stream} was not captured")]
    MissingStream {
        /// Name of the missing stream.
        stream: &'static str,
    },

    /// The oracle refused to start an invocation.
    #[error("compiler unavailable: {0}")]
    Unavailable(String),
}

impl OracleError {
    /// Create a "not found" error with an install hint.
    #[must_use]
    pub fn not_found(command: &str, install_hint: &str) -> Self {
        Self::NotFound {
            command: command.to_string(),
            install_hint: install_hint.to_string(),
        }
    }

    /// Create a spawn failed error.
    #[must_use]
    pub fn spawn_failed(command: &str, source: std::io::Error) -> Self {
        Self::SpawnFailed {
            command: command.to_string(),
            source,
        }
    }
}

/// Result type for oracle operations.
pub type Result<T> = std::result::Result<T, OracleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_includes_hint() {
        let err = OracleError::not_found("pawncc", "Set compiler.path in pawn-parser.yaml.");
        let message = err.to_string();

        assert!(message.starts_with("pawncc not found"));
        assert!(message.contains("compiler.path"));
    }

    #[test]
    fn spawn_failed_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = OracleError::spawn_failed("pawncc", io);

        assert!(std::error::Error::source(&err).is_some());
        assert!(err.to_string().contains("denied"));
    }
}
