//! Preview error types

use super::types::HandlerId;
use crate::store::StoreError;
use thiserror::Error;

/// Errors that can occur while loading or building a preview
///
/// Malformed object content is never an error: builders degrade to a
/// partial result instead. Only I/O, cancellation and viewer assembly
/// failures surface here.
#[derive(Debug, Error)]
pub enum PreviewError {
    /// Storage adapter failed to produce a URL or byte range
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    /// The request was superseded before it finished
    #[error("Preview request cancelled")]
    Cancelled,

    /// Point-cloud viewer bundle could not be fetched
    #[error("Viewer bundle request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Point-cloud viewer bundle did not have the expected shape
    #[error("Viewer bundle could not be assembled: {0}")]
    ViewerAssembly(String),

    /// JSON encoding of the viewer configuration failed
    #[error("Viewer configuration could not be encoded: {0}")]
    Json(#[from] serde_json::Error),

    /// A builder was asked to handle content it does not produce
    #[error("No {expected} builder for handler '{handler}'")]
    UnexpectedHandler {
        /// Handler that was dispatched
        handler: HandlerId,
        /// Builder family that received it
        expected: &'static str,
    },

    /// Preview limits are inconsistent
    #[error("Invalid preview limits: {0}")]
    InvalidLimits(String),
}

impl PreviewError {
    /// Whether this error only reports a cancelled request
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Store(StoreError::Cancelled))
    }
}

/// Result type for preview operations
pub type Result<T> = std::result::Result<T, PreviewError>;
