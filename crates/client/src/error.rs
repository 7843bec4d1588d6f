//! Error types for library clients

use crate::host::{HostCommand, HostError};
use bookshelf_core::{AppError, ConnectionKind};
use bookshelf_network::NetworkError;
use thiserror::Error;

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors raised by a [`LibraryClient`](crate::LibraryClient)
///
/// Any of these means the outcome of the call is unknown; callers must not
/// assume a mutation was partially applied or skipped.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The native host rejected or failed a command
    #[error("Host command '{command}' failed: {source}")]
    Host {
        command: HostCommand,
        #[source]
        source: HostError,
    },

    /// Transport or HTTP failure talking to a content server
    #[error(transparent)]
    Network(#[from] NetworkError),

    /// The embedded catalog failed
    #[error(transparent)]
    Database(#[from] AppError),

    /// File system failure while importing or copying
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backend variant does not implement this operation
    #[error("The {backend} backend does not support {operation}")]
    Unsupported {
        backend: ConnectionKind,
        operation: &'static str,
    },

    /// A reply or argument did not have the expected shape
    #[error("Malformed payload for '{context}': {reason}")]
    Decode { context: String, reason: String },

    /// The library location cannot be served by the requested backend
    #[error("Invalid library connection: {0}")]
    InvalidConnection(String),
}

impl ClientError {
    pub(crate) fn unsupported(backend: ConnectionKind, operation: &'static str) -> Self {
        Self::Unsupported { backend, operation }
    }

    pub(crate) fn decode(context: impl ToString, error: serde_json::Error) -> Self {
        Self::Decode {
            context: context.to_string(),
            reason: error.to_string(),
        }
    }

    /// True for operations the backend will never support
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_message() {
        let err = ClientError::unsupported(ConnectionKind::Remote, "list_authors");
        assert_eq!(
            err.to_string(),
            "The remote backend does not support list_authors"
        );
        assert!(err.is_unsupported());
    }

    #[test]
    fn test_host_error_keeps_command_name() {
        let err = ClientError::Host {
            command: HostCommand::ListBooks,
            source: HostError::new("database is locked"),
        };
        assert_eq!(
            err.to_string(),
            "Host command 'list_books' failed: database is locked"
        );
    }
}
