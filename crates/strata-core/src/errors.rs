//! Error types for the strata importer.

use thiserror::Error;

/// Result type for import operations.
pub type Result<T> = std::result::Result<T, ImportError>;

/// Top-level error type for an import. Any of these aborts the import.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Sink(#[from] SinkError),

    #[error("Undefined component definition: {name}")]
    UndefinedComponent { name: String },

    #[error("Circular component reference: {}", .cycle.join(" -> "))]
    CyclicDefinition { cycle: Vec<String> },
}

/// Errors while reading the scene source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The source could not be read or is malformed.
    #[error("failed to read source: {message}")]
    Read {
        /// Error message.
        message: String,
        /// What was being read when the failure happened.
        context: Option<String>,
    },

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Base64 decoding error for embedded texture data.
    #[error("base64 error: {0}")]
    Base64(#[from] base64::DecodeError),
}

impl SourceError {
    /// Create a read error.
    pub fn read(message: impl Into<String>) -> Self {
        Self::Read {
            message: message.into(),
            context: None,
        }
    }

    /// Create a read error with context.
    pub fn read_context(message: impl Into<String>, context: impl Into<String>) -> Self {
        Self::Read {
            message: message.into(),
            context: Some(context.into()),
        }
    }
}

/// Errors reported by a scene sink.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Invalid image '{name}': {reason}")]
    InvalidImage { name: String, reason: String },

    #[error("Unknown {kind} handle: {index}")]
    UnknownHandle { kind: &'static str, index: usize },

    #[error("Node {child} cannot be parented to {parent}")]
    InvalidParent { child: usize, parent: usize },
}

impl From<serde_json::Error> for ImportError {
    fn from(err: serde_json::Error) -> Self {
        ImportError::Source(SourceError::Json(err))
    }
}

impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::Source(SourceError::Io(err))
    }
}
