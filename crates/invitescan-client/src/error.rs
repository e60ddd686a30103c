//! Client error types.

use std::fmt;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur in the client.
#[derive(Debug)]
pub enum ClientError {
    /// Configuration error.
    Config(String),
    /// IO error.
    Io(std::io::Error),
    /// No provider credential was available.
    AuthRequired(String),
    /// Scan setup failed (seen store, adapters).
    Scan(String),
    /// Output could not be rendered.
    Output(String),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {}", msg),
            Self::Io(err) => write!(f, "IO error: {}", err),
            Self::AuthRequired(msg) => write!(f, "authentication required: {}", msg),
            Self::Scan(msg) => write!(f, "scan failed: {}", msg),
            Self::Output(msg) => write!(f, "output error: {}", msg),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<invitescan_server::ServerError> for ClientError {
    fn from(err: invitescan_server::ServerError) -> Self {
        match err {
            invitescan_server::ServerError::Config { message } => Self::Config(message),
            other => Self::Scan(other.to_string()),
        }
    }
}
