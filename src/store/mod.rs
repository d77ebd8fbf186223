//! Object storage seam
//!
//! The preview engine never lists or writes objects. It only needs a URL a
//! renderer can load directly and a bounded prefix of an object's bytes.

pub mod error;
pub mod local;

pub use error::{Result, StoreError};
pub use local::LocalStore;

use async_trait::async_trait;
use bytes::Bytes;
use tokio_util::sync::CancellationToken;

/// Read access to stored objects
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// URL from which the object can be retrieved directly
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Cancelled` if `cancel` fires first, or a backend
    /// error if the URL cannot be produced.
    async fn retrieval_url(
        &self,
        container: &str,
        key: &str,
        cancel: &CancellationToken,
    ) -> Result<String>;

    /// Up to `max_bytes` from the start of the object
    ///
    /// Returns fewer bytes when the object is smaller.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Cancelled` if `cancel` fires first, or a backend
    /// error if the read fails.
    async fn byte_range(
        &self,
        container: &str,
        key: &str,
        max_bytes: u64,
        cancel: &CancellationToken,
    ) -> Result<Bytes>;
}
