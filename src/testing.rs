//! Testing utilities for peekr
//!
//! This module provides an in-memory object store with call counters,
//! gated reads and failure injection, plus a static viewer bundle so
//! point-cloud previews never touch the network.
//!
//! Only available when compiled with `cfg(test)`.

use crate::preview::{
    BundleSource, ContentBuilders, PreviewCache, PreviewController, PreviewError, PreviewLimits,
    Result as PreviewResult, ViewerBundle,
};
use crate::store::{ObjectStore, Result, StoreError};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

type ObjectId = (String, String);

/// In-memory [`ObjectStore`] for controller tests
///
/// URLs are `memory://{container}/{key}` and exist for any key; byte ranges
/// need the object to have been stored with [`MemoryStore::put`].
#[derive(Default)]
pub struct MemoryStore {
    objects: Mutex<HashMap<ObjectId, Bytes>>,
    gates: Mutex<HashMap<String, (Arc<Semaphore>, bool)>>,
    url_gate: Mutex<Option<Arc<Semaphore>>>,
    range_calls: AtomicUsize,
    url_calls: AtomicUsize,
    last_range_len: AtomicU64,
    fail_ranges: AtomicBool,
    fail_urls: AtomicBool,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Store an object
    ///
    /// # Panics
    /// Panics if the object map lock is poisoned.
    pub fn put(&self, container: &str, key: &str, data: impl Into<Bytes>) {
        self.objects
            .lock()
            .unwrap()
            .insert((container.to_string(), key.to_string()), data.into());
    }

    /// Hold byte-range reads of `key` until permits are added
    ///
    /// With `honor_cancel` unset, a held read keeps waiting after its token
    /// is cancelled, like a backend that cannot abort a request.
    ///
    /// # Panics
    /// Panics if the gate map lock is poisoned.
    #[must_use]
    pub fn hold(&self, key: &str, honor_cancel: bool) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        self.gates
            .lock()
            .unwrap()
            .insert(key.to_string(), (Arc::clone(&gate), honor_cancel));
        gate
    }

    /// Hold retrieval URL requests until permits are added
    ///
    /// A held request still gives up when its token is cancelled.
    ///
    /// # Panics
    /// Panics if the gate lock is poisoned.
    #[must_use]
    pub fn hold_urls(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.url_gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    pub fn fail_ranges(&self, fail: bool) {
        self.fail_ranges.store(fail, Ordering::SeqCst);
    }

    pub fn fail_urls(&self, fail: bool) {
        self.fail_urls.store(fail, Ordering::SeqCst);
    }

    #[must_use]
    pub fn range_calls(&self) -> usize {
        self.range_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn url_calls(&self) -> usize {
        self.url_calls.load(Ordering::SeqCst)
    }

    /// Byte budget of the most recent range read
    #[must_use]
    pub fn last_range_len(&self) -> Option<u64> {
        (self.range_calls() > 0).then(|| self.last_range_len.load(Ordering::SeqCst))
    }

    fn gate(&self, key: &str) -> Option<(Arc<Semaphore>, bool)> {
        self.gates.lock().unwrap().get(key).cloned()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn retrieval_url(
        &self,
        container: &str,
        key: &str,
        cancel: &CancellationToken,
    ) -> Result<String> {
        self.url_calls.fetch_add(1, Ordering::SeqCst);
        if cancel.is_cancelled() {
            return Err(StoreError::Cancelled);
        }
        let url_gate = self.url_gate.lock().unwrap().clone();
        if let Some(gate) = url_gate {
            tokio::select! {
                () = cancel.cancelled() => return Err(StoreError::Cancelled),
                permit = gate.acquire() => drop(permit),
            }
        }
        if self.fail_urls.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("injected url failure".into()));
        }
        Ok(format!("memory://{container}/{key}"))
    }

    async fn byte_range(
        &self,
        container: &str,
        key: &str,
        max_bytes: u64,
        cancel: &CancellationToken,
    ) -> Result<Bytes> {
        self.range_calls.fetch_add(1, Ordering::SeqCst);
        self.last_range_len.store(max_bytes, Ordering::SeqCst);

        if let Some((gate, honor_cancel)) = self.gate(key) {
            if honor_cancel {
                tokio::select! {
                    () = cancel.cancelled() => return Err(StoreError::Cancelled),
                    permit = gate.acquire() => drop(permit),
                }
            } else {
                drop(gate.acquire().await);
            }
        }

        if self.fail_ranges.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("injected range failure".into()));
        }

        let data = self
            .objects
            .lock()
            .unwrap()
            .get(&(container.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                container: container.to_string(),
                key: key.to_string(),
            })?;
        let len = usize::try_from(max_bytes).unwrap_or(usize::MAX).min(data.len());
        Ok(data.slice(..len))
    }
}

/// Minimal viewer bundle with every anchor the assembler rewrites
#[must_use]
pub fn viewer_bundle() -> ViewerBundle {
    ViewerBundle {
        html: [
            "<!DOCTYPE html>",
            "<html>",
            "<head>",
            r#"<link rel="stylesheet" href="./index.css">"#,
            r#"<script type="module">window.placeholder = true;</script>"#,
            "</head>",
            "<body>",
            r#"<script type="module">"#,
            "import { main } from './index.js';",
            "main(window.sse);",
            "</script>",
            "</body>",
            "</html>",
        ]
        .join("\n"),
        css: "body{margin:0}".to_string(),
        js: "export function main(sse) { console.log('viewer'); }".to_string(),
    }
}

/// Bundle source that counts fetches and can fail the first one
#[derive(Default)]
pub struct CountingBundleSource {
    fetches: AtomicUsize,
    fail_first: bool,
}

impl CountingBundleSource {
    #[must_use]
    pub fn failing_first() -> Self {
        Self {
            fetches: AtomicUsize::new(0),
            fail_first: true,
        }
    }

    #[must_use]
    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BundleSource for CountingBundleSource {
    async fn fetch_bundle(&self) -> PreviewResult<ViewerBundle> {
        let previous = self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail_first && previous == 0 {
            return Err(PreviewError::ViewerAssembly("bundle offline".into()));
        }
        Ok(viewer_bundle())
    }
}

/// Limits small enough to exercise every cap with short fixtures
#[must_use]
pub fn small_limits() -> PreviewLimits {
    PreviewLimits {
        soft_cap_bytes: 1024,
        hard_cap_bytes: 8 * 1024,
        max_rendered_chars: 2_000,
        max_rendered_lines: 50,
        max_table_rows: 5,
        max_table_columns: 4,
    }
}

/// Controller over `store` with default limits and the static bundle
#[must_use]
pub fn controller_with(store: &Arc<MemoryStore>) -> PreviewController {
    controller_with_limits(store, PreviewLimits::default())
}

#[must_use]
pub fn controller_with_limits(store: &Arc<MemoryStore>, limits: PreviewLimits) -> PreviewController {
    let builders = ContentBuilders::new(limits, Arc::new(viewer_bundle()));
    PreviewController::new(
        Arc::clone(store) as Arc<dyn ObjectStore>,
        PreviewCache::new(),
        Arc::new(builders),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_range_is_bounded() {
        let store = MemoryStore::new();
        store.put("b", "a.txt", b"0123456789".to_vec());
        let cancel = CancellationToken::new();

        let prefix = store.byte_range("b", "a.txt", 3, &cancel).await.unwrap();
        assert_eq!(&prefix[..], b"012");
        let whole = store.byte_range("b", "a.txt", 100, &cancel).await.unwrap();
        assert_eq!(whole.len(), 10);
        assert_eq!(store.range_calls(), 2);
        assert_eq!(store.last_range_len(), Some(100));
    }

    #[tokio::test]
    async fn test_memory_store_gate_honors_cancel() {
        let store = MemoryStore::new();
        store.put("b", "a.txt", b"data".to_vec());
        let _gate = store.hold("a.txt", true);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = store.byte_range("b", "a.txt", 4, &cancel).await.unwrap_err();
        assert!(err.is_cancelled());
    }

    #[test]
    fn test_small_limits_are_valid() {
        assert!(small_limits().validate().is_ok());
    }
}
