//! Error types for the settings system

use std::path::PathBuf;
use thiserror::Error;

/// Result type for settings operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that can occur during settings operations
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a settings file
    #[error("Failed to read settings at {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to write a settings file
    #[error("Failed to write settings at {path}: {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A settings file is not valid JSON
    #[error("Failed to parse settings at {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Failed to serialize a value
    #[error("Failed to serialize setting: {0}")]
    SerializeError(#[from] serde_json::Error),

    /// Settings contain invalid values
    #[error("Settings validation failed: {0}")]
    ValidationError(String),

    /// Failed to create the settings directory
    #[error("Failed to create settings directory at {path}: {source}")]
    DirectoryCreationError {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Settings directory path could not be determined
    #[error("Could not determine settings directory path: {reason}")]
    PathResolutionError { reason: String },

    /// `set` or `get` was called before `initialize`
    #[error("Settings manager used before initialize()")]
    NotInitialized,

    /// No known library path has this id
    #[error("Unknown library id: {id}")]
    UnknownLibrary { id: String },

    /// Unrecognized backend name
    #[error("Unknown settings backend '{0}' (expected 'store' or 'web')")]
    UnknownBackend(String),

    /// Generic I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Validation error for a specific settings field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Path to the field (e.g., "libraryPaths[0].absolutePath")
    pub field: String,

    /// Human-readable error message
    pub message: String,

    /// The invalid value, if available
    pub value: Option<String>,
}

impl ValidationError {
    /// Creates a new validation error
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            value: None,
        }
    }

    /// Creates a validation error with the invalid value
    pub fn with_value(
        field: impl Into<String>,
        message: impl Into<String>,
        value: impl ToString,
    ) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            value: Some(value.to_string()),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Field '{}': {}", self.field, self.message)?;
        if let Some(ref value) = self.value {
            write!(f, " (got: {})", value)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}
