//! Error types for the inventory core.
//!
//! Missing documents during a refresh are not errors: they surface as
//! "NOT FOUND" groups in the tree. The variants here cover the failures that
//! do propagate, such as store I/O, malformed payloads, and invalid caller input.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the inventory core.
#[derive(Debug, Error)]
pub enum InventoryError {
    // Store errors
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[source]
        source: Option<rusqlite::Error>,
    },

    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    // Document errors
    #[error("{kind} document not found: {id}")]
    DocumentNotFound { kind: String, id: String },

    #[error("Version {version_id} does not belong to subset {subset_id}")]
    VersionMismatch {
        version_id: String,
        subset_id: String,
    },

    // Caller input errors
    #[error("Invalid filter pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("Invalid parameters: {message}")]
    InvalidParams { message: String },

    #[error("Tree item not found: {item_id}")]
    NodeNotFound { item_id: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    // Refresh lifecycle
    #[error("Refresh was superseded or cancelled")]
    Cancelled,

    #[error("{0}")]
    Other(String),
}

/// Result type alias using InventoryError.
pub type Result<T> = std::result::Result<T, InventoryError>;

impl From<std::io::Error> for InventoryError {
    fn from(err: std::io::Error) -> Self {
        InventoryError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for InventoryError {
    fn from(err: serde_json::Error) -> Self {
        InventoryError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<rusqlite::Error> for InventoryError {
    fn from(err: rusqlite::Error) -> Self {
        InventoryError::Database {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl InventoryError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        InventoryError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// Create a not-found error for a document kind.
    pub fn not_found(kind: impl Into<String>, id: impl Into<String>) -> Self {
        InventoryError::DocumentNotFound {
            kind: kind.into(),
            id: id.into(),
        }
    }

    /// Convert to a JSON-RPC error code.
    ///
    /// Custom error codes (application-defined, -32000 to -32099):
    /// - -32001: Document not found
    /// - -32002: Tree item not found
    /// - -32004: Refresh cancelled
    /// - -32005: Validation error
    /// - -32602: Invalid params
    pub fn to_rpc_error_code(&self) -> i32 {
        match self {
            InventoryError::DocumentNotFound { .. } => -32001,
            InventoryError::NodeNotFound { .. } => -32002,
            InventoryError::Cancelled => -32004,
            InventoryError::VersionMismatch { .. } | InventoryError::InvalidPattern { .. } => {
                -32005
            }
            InventoryError::InvalidParams { .. } => -32602,
            _ => -32603,
        }
    }

    /// Whether this error only signals that a newer refresh took over.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, InventoryError::Cancelled)
    }
}
