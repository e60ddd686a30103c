//! Server error types.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that can occur while setting up or persisting scan state.
#[derive(Debug, Error)]
pub enum ServerError {
    /// IO error (store file, directories).
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// The seen-message store could not be read or written.
    #[error("Seen store error ({path}): {message}")]
    Store { path: PathBuf, message: String },
}

impl ServerError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a store error.
    pub fn store(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Store {
            path: path.into(),
            message: message.into(),
        }
    }
}
