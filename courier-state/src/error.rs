//! Error types for the courier-state crate.

use std::io;

use thiserror::Error;

/// Top-level sent-state error type.
#[derive(Debug, Error)]
pub enum StateError {
    /// I/O operation failed (read, write, rename).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The identifier cannot be stored one-per-line.
    #[error("Invalid identifier {0:?}: identifiers must be non-empty and contain no line breaks")]
    InvalidIdentifier(String),

    /// The configured location cannot hold a sent-state file.
    #[error("Invalid sent-state path: {0}")]
    InvalidPath(String),

    /// Internal error (lock poisoning, injected failures).
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Specialized `Result` type for sent-state operations.
pub type Result<T> = std::result::Result<T, StateError>;

impl<T> From<std::sync::PoisonError<T>> for StateError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        Self::Internal(format!("Lock poisoned: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let state_err: StateError = io_err.into();
        assert!(matches!(state_err, StateError::Io(_)));
        assert!(state_err.to_string().contains("file not found"));
    }

    #[test]
    fn test_invalid_identifier_display() {
        let err = StateError::InvalidIdentifier("12\n34".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid identifier \"12\\n34\": identifiers must be non-empty and contain no line breaks"
        );
    }
}
