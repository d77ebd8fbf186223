//! Storage adapter error types

use thiserror::Error;

/// Errors reported by an [`ObjectStore`](super::ObjectStore)
#[derive(Debug, Error)]
pub enum StoreError {
    /// The request was cancelled before it completed
    #[error("Request cancelled")]
    Cancelled,

    /// The object does not exist
    #[error("Object not found: {container}/{key}")]
    NotFound {
        /// Container the lookup ran in
        container: String,
        /// Missing key
        key: String,
    },

    /// The key cannot name an object in this store
    #[error("Invalid object key: {0}")]
    InvalidKey(String),

    /// Represents an I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other backend failure
    #[error("Storage backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Whether this error only reports a cancelled request
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Result type for storage operations
pub type Result<T> = std::result::Result<T, StoreError>;
