//! Error types for network operations

use thiserror::Error;

/// Result type for network operations
pub type NetworkResult<T> = Result<T, NetworkError>;

/// Errors that can occur during network operations
#[derive(Debug, Error)]
pub enum NetworkError {
    /// Transport-level failure (connect, TLS, body read)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The server answered with a non-success status
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// The response body was not the expected JSON shape
    #[error("Failed to decode response from {url}: {reason}")]
    Decode { url: String, reason: String },

    /// Timeout
    #[error("Operation timed out")]
    Timeout,
}

impl NetworkError {
    /// Returns true if the error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            NetworkError::Timeout => true,
            NetworkError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            NetworkError::Status { status, .. } => *status >= 500,
            NetworkError::InvalidUrl(_) | NetworkError::Decode { .. } => false,
        }
    }

    /// Returns true if the error is a client error (4xx)
    pub fn is_client_error(&self) -> bool {
        matches!(self, NetworkError::Status { status, .. } if (400..500).contains(status))
    }

    /// Returns true if the error is a server error (5xx)
    pub fn is_server_error(&self) -> bool {
        matches!(self, NetworkError::Status { status, .. } if *status >= 500)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16) -> NetworkError {
        NetworkError::Status {
            status: code,
            url: "http://localhost/books".to_string(),
        }
    }

    #[test]
    fn test_error_display() {
        let err = NetworkError::InvalidUrl("test".to_string());
        assert!(err.to_string().contains("Invalid URL"));
        assert_eq!(status(404).to_string(), "HTTP 404 from http://localhost/books");
    }

    #[test]
    fn test_retryable_errors() {
        assert!(NetworkError::Timeout.is_retryable());
        assert!(status(503).is_retryable());
        assert!(!status(404).is_retryable());
        assert!(!NetworkError::InvalidUrl("test".to_string()).is_retryable());
    }

    #[test]
    fn test_status_classification() {
        assert!(status(409).is_client_error());
        assert!(!status(409).is_server_error());
        assert!(status(500).is_server_error());
    }
}
