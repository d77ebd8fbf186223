//! Local filesystem store
//!
//! A container is a directory and a key is a relative path beneath it.
//! Retrieval URLs are `file://` URLs of the canonical path.

use super::error::{Result, StoreError};
use super::ObjectStore;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Url;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tokio::io::AsyncReadExt;
use tokio_util::sync::CancellationToken;

/// [`ObjectStore`] over directories on the local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStore;

impl LocalStore {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Split a file path into a container (its directory) and a key
    #[must_use]
    pub fn split_path(path: &Path) -> Option<(String, String)> {
        let key = path.file_name()?.to_str()?.to_string();
        let container = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_str()?.to_string(),
            _ => ".".to_string(),
        };
        Some((container, key))
    }

    /// Path of `key` inside `container`
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidKey` for empty keys and keys that are
    /// absolute or climb out of the container.
    pub fn resolve_path(container: &str, key: &str) -> Result<PathBuf> {
        let relative = Path::new(key);
        let escapes = relative.components().any(|component| {
            matches!(
                component,
                Component::ParentDir | Component::RootDir | Component::Prefix(_)
            )
        });
        if key.is_empty() || escapes {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(Path::new(container).join(relative))
    }

    /// Size of an object in bytes
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the object does not exist.
    pub async fn object_size(container: &str, key: &str) -> Result<u64> {
        let path = Self::resolve_path(container, key)?;
        let metadata = tokio::fs::metadata(&path)
            .await
            .map_err(|err| not_found_or_io(err, container, key))?;
        Ok(metadata.len())
    }

    async fn read_prefix(path: &Path, max_bytes: u64) -> std::io::Result<Vec<u8>> {
        let file = tokio::fs::File::open(path).await?;
        let capacity = usize::try_from(max_bytes).unwrap_or(usize::MAX).min(64 * 1024);
        let mut buf = Vec::with_capacity(capacity);
        file.take(max_bytes).read_to_end(&mut buf).await?;
        Ok(buf)
    }
}

#[async_trait]
impl ObjectStore for LocalStore {
    async fn retrieval_url(
        &self,
        container: &str,
        key: &str,
        cancel: &CancellationToken,
    ) -> Result<String> {
        let path = Self::resolve_path(container, key)?;
        let canonical = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(StoreError::Cancelled),
            result = tokio::fs::canonicalize(&path) => {
                result.map_err(|err| not_found_or_io(err, container, key))?
            }
        };
        let url = Url::from_file_path(&canonical)
            .map_err(|()| StoreError::InvalidKey(canonical.display().to_string()))?;
        Ok(url.into())
    }

    async fn byte_range(
        &self,
        container: &str,
        key: &str,
        max_bytes: u64,
        cancel: &CancellationToken,
    ) -> Result<Bytes> {
        let path = Self::resolve_path(container, key)?;
        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(StoreError::Cancelled),
            result = Self::read_prefix(&path, max_bytes) => result
                .map(Bytes::from)
                .map_err(|err| not_found_or_io(err, container, key)),
        }
    }
}

fn not_found_or_io(err: std::io::Error, container: &str, key: &str) -> StoreError {
    if err.kind() == ErrorKind::NotFound {
        StoreError::NotFound {
            container: container.to_string(),
            key: key.to_string(),
        }
    } else {
        StoreError::Io(err)
    }
}
