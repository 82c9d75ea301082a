//! Error types for the workflow engine
//!
//! Validation and simulation never fail; they report problems as data.
//! These errors cover the fallible edges: import, snapshots, catalog loading.

use thiserror::Error;

/// Result type alias using WorkflowError
pub type Result<T> = std::result::Result<T, WorkflowError>;

/// Errors that can occur in the workflow engine
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Import payload is well-formed JSON but not a workflow
    #[error("Invalid workflow file: {0}")]
    InvalidWorkflowFile(String),

    /// Serialization error (malformed JSON, snapshot encoding)
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Compression error
    #[error("Compression error: {0}")]
    Compression(String),

    /// Node position is NaN or infinite and cannot be stored
    #[error("Node '{0}' has a non-finite position")]
    InvalidPosition(String),

    /// Automation catalog could not be loaded
    #[error("Automation catalog error: {0}")]
    Catalog(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkflowError {
    /// Create an invalid workflow file error with a message
    pub fn invalid_file(msg: impl Into<String>) -> Self {
        Self::InvalidWorkflowFile(msg.into())
    }

    /// Create an invalid position error for a node
    pub fn invalid_position(node_id: impl Into<String>) -> Self {
        Self::InvalidPosition(node_id.into())
    }

    /// Create a catalog error with a message
    pub fn catalog(msg: impl Into<String>) -> Self {
        Self::Catalog(msg.into())
    }
}
