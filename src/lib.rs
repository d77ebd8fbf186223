//! Peekr - bounded-prefix previews for stored objects
//!
//! This library decides whether an object can be previewed inline, fetches
//! at most a capped prefix of its bytes, and turns that prefix into text,
//! table, markup, media or point-cloud viewer content.

use thiserror::Error;

pub mod cli;
pub mod config;
pub mod logging;
pub mod output;
pub mod preview;
pub mod store;

#[cfg(test)]
pub mod testing;

/// Error enum, contains all failure states of the program
#[derive(Debug, Error)]
pub enum PeekrError {
    /// Preview error
    #[error("Preview error: {0}")]
    PreviewError(#[from] preview::PreviewError),
    /// Storage error
    #[error("Storage error: {0}")]
    StoreError(#[from] store::StoreError),
    /// Represents a configuration error
    #[error("Configuration error: {0}")]
    ConfigError(#[from] ::config::ConfigError),
    /// Represents an I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    /// JSON output error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    /// Invalid input error
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
