//! Preview controller
//!
//! Drives one preview at a time through `idle → loading → ready | blocked |
//! error`. Loads run as spawned tasks that report back over a channel; the
//! controller applies a result only if it belongs to the current request
//! generation, so a slow load for an earlier selection can never overwrite
//! the preview of a later one.

use super::builders::{BuildRequest, ContentBuilders};
use super::cache::{CacheKey, PreviewCache};
use super::error::{PreviewError, Result};
use super::policy::{self, LoadPolicy};
use super::registry;
use super::state::PreviewState;
use super::types::{CacheEntry, HandlerId, LoadMode, ObjectSelection, PreviewStatus};
use crate::store::ObjectStore;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

/// Message shown when a load fails; the detail is kept in the state's error
pub const FETCH_ERROR_MESSAGE: &str =
    "Preview unavailable. Reselect the file or retry to try again.";

/// Successful load
#[derive(Debug)]
pub struct LoadedPreview {
    pub preview: CacheEntry,
    pub download_url: Option<String>,
}

/// What a finished task produced
#[derive(Debug)]
pub enum OutcomeKind {
    /// The preview itself
    Preview(Result<LoadedPreview>),
    /// Only the retrieval URL, for a preview served from cache
    DownloadUrl(Option<String>),
}

/// Result of a load task, tagged with the generation that started it
#[derive(Debug)]
pub struct LoadOutcome {
    generation: u64,
    kind: OutcomeKind,
}

impl LoadOutcome {
    #[must_use]
    pub const fn new(generation: u64, kind: OutcomeKind) -> Self {
        Self { generation, kind }
    }

    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }
}

/// Consent to load a preview held back for its size
///
/// Only handed out while the current preview is blocked with
/// `can_manual_load` set.
pub struct ManualLoad<'a> {
    controller: &'a mut PreviewController,
}

impl ManualLoad<'_> {
    /// Load the preview with the manual byte budget
    pub fn trigger(self) {
        debug!("manual preview load requested");
        self.controller.manual_requested = true;
        self.controller.restart();
    }
}

/// Owns the preview state for the current selection
///
/// Loads are spawned onto the ambient tokio runtime, so selection changes
/// must happen inside one.
pub struct PreviewController {
    store: Arc<dyn ObjectStore>,
    cache: PreviewCache,
    builders: Arc<ContentBuilders>,
    selection: Option<ObjectSelection>,
    state: PreviewState,
    generation: u64,
    manual_requested: bool,
    in_flight: Option<CancellationToken>,
    pending: usize,
    tx: UnboundedSender<LoadOutcome>,
    rx: UnboundedReceiver<LoadOutcome>,
}

impl PreviewController {
    #[must_use]
    pub fn new(
        store: Arc<dyn ObjectStore>,
        cache: PreviewCache,
        builders: Arc<ContentBuilders>,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            store,
            cache,
            builders,
            selection: None,
            state: PreviewState::idle(),
            generation: 0,
            manual_requested: false,
            in_flight: None,
            pending: 0,
            tx,
            rx,
        }
    }

    #[must_use]
    pub const fn state(&self) -> &PreviewState {
        &self.state
    }

    #[must_use]
    pub const fn selection(&self) -> Option<&ObjectSelection> {
        self.selection.as_ref()
    }

    /// Current request generation
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether tasks of the current generation have not reported yet
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.pending > 0
    }

    /// Change the selected object
    ///
    /// Selecting the object that is already selected does nothing. Any other
    /// change cancels in-flight work and forgets manual consent.
    pub fn select(&mut self, selection: Option<ObjectSelection>) {
        let unchanged = match (&self.selection, &selection) {
            (Some(current), Some(next)) => current.same_object(next),
            (None, None) => true,
            _ => false,
        };
        if unchanged {
            trace!("selection unchanged");
            return;
        }

        self.selection = selection;
        self.manual_requested = false;
        self.restart();
    }

    /// Consent handle, available only when the preview can be loaded on demand
    pub fn manual_load(&mut self) -> Option<ManualLoad<'_>> {
        if self.state.can_manual_load() {
            Some(ManualLoad { controller: self })
        } else {
            None
        }
    }

    /// Run the current selection again after a failure
    ///
    /// Returns false unless the preview is in the error state.
    pub fn retry(&mut self) -> bool {
        if self.state.status() != PreviewStatus::Error {
            return false;
        }
        debug!("retrying preview");
        self.restart();
        true
    }

    /// Wait for and apply the next task result
    ///
    /// Returns true if the result was committed. Returns false immediately
    /// when no current-generation work is outstanding.
    pub async fn process_next(&mut self) -> bool {
        if self.pending == 0 {
            while let Ok(outcome) = self.rx.try_recv() {
                self.apply(outcome);
            }
            return false;
        }
        match self.rx.recv().await {
            Some(outcome) => self.apply(outcome),
            None => false,
        }
    }

    /// Apply task results until no current-generation work remains
    pub async fn settle(&mut self) {
        while self.pending > 0 {
            self.process_next().await;
        }
    }

    /// Commit a task result if it belongs to the current generation
    ///
    /// Stale results and cancelled loads are dropped; returns true only when
    /// the state changed.
    pub fn apply(&mut self, outcome: LoadOutcome) -> bool {
        if outcome.generation != self.generation {
            debug!(
                stale = outcome.generation,
                current = self.generation,
                "discarding stale preview result"
            );
            return false;
        }
        self.pending = self.pending.saturating_sub(1);

        match outcome.kind {
            OutcomeKind::DownloadUrl(url) => {
                self.state.set_download_url(url);
                true
            }
            OutcomeKind::Preview(Ok(loaded)) => {
                debug!(
                    kind = loaded.preview.content.kind(),
                    truncated = loaded.preview.is_truncated,
                    "preview ready"
                );
                // A buffered preview's link arrives separately and may already be set.
                if loaded.download_url.is_some() {
                    self.state.set_download_url(loaded.download_url);
                }
                self.state.set_ready(loaded.preview);
                true
            }
            OutcomeKind::Preview(Err(err)) if err.is_cancelled() => {
                debug!("preview load cancelled");
                false
            }
            OutcomeKind::Preview(Err(err)) => {
                warn!(error = %err, "preview load failed");
                self.state
                    .set_error(FETCH_ERROR_MESSAGE.to_string(), err.to_string());
                true
            }
        }
    }

    /// Cancel outstanding work and start the next generation
    fn supersede(&mut self) {
        if let Some(token) = self.in_flight.take() {
            token.cancel();
        }
        self.generation = self.generation.wrapping_add(1);
        self.pending = 0;
    }

    fn restart(&mut self) {
        self.supersede();
        self.start();
    }

    fn start(&mut self) {
        let Some(selection) = self.selection.clone() else {
            debug!("preview idle");
            self.state = PreviewState::idle();
            return;
        };

        let handler = registry::resolve(&selection.key);
        let limits = *self.builders.limits();
        let decision = policy::decide(handler, selection.size, self.manual_requested, &limits);
        debug!(
            key = %selection.key,
            %handler,
            size = ?selection.size,
            ?decision,
            "preview policy decided"
        );

        match decision {
            LoadPolicy::Blocked(reason) => {
                let mut state = PreviewState::loading(handler, None);
                state.set_blocked(
                    reason,
                    decision.can_manual_load(),
                    decision.explanation(&limits),
                );
                self.state = state;
            }
            LoadPolicy::Load(mode) => {
                self.state = PreviewState::loading(handler, Some(mode));
                let cancel = CancellationToken::new();
                self.in_flight = Some(cancel.clone());
                if handler.is_streamed() {
                    self.start_streamed(selection, handler, cancel);
                } else {
                    self.start_buffered(selection, handler, mode, cancel);
                }
            }
        }
    }

    fn start_streamed(
        &mut self,
        selection: ObjectSelection,
        handler: HandlerId,
        cancel: CancellationToken,
    ) {
        let store = Arc::clone(&self.store);
        let builders = Arc::clone(&self.builders);
        self.spawn(async move {
            OutcomeKind::Preview(
                load_streamed(store.as_ref(), &builders, &selection, handler, &cancel).await,
            )
        });
    }

    fn start_buffered(
        &mut self,
        selection: ObjectSelection,
        handler: HandlerId,
        mode: LoadMode,
        cancel: CancellationToken,
    ) {
        let cache_key = CacheKey::new(&selection.container, &selection.key, handler, mode);

        if let Some(entry) = self.cache.get(&cache_key) {
            trace!(key = %selection.key, %mode, "preview cache hit");
            self.state.set_ready(entry);
            self.spawn_download_url(selection, cancel);
            return;
        }

        let store = Arc::clone(&self.store);
        let job = BufferedJob {
            builders: Arc::clone(&self.builders),
            cache: self.cache.clone(),
            cache_key,
            budget: policy::fetch_budget(selection.size, mode, self.builders.limits()),
            handler,
            selection: selection.clone(),
        };
        let job_cancel = cancel.clone();
        self.spawn(async move {
            let preview = job.run(store.as_ref(), &job_cancel).await;
            OutcomeKind::Preview(preview.map(|preview| LoadedPreview {
                preview,
                download_url: None,
            }))
        });
        self.spawn_download_url(selection, cancel);
    }

    /// Resolve the download link as a task of its own
    fn spawn_download_url(&mut self, selection: ObjectSelection, cancel: CancellationToken) {
        let store = Arc::clone(&self.store);
        self.spawn(async move {
            OutcomeKind::DownloadUrl(resolve_download_url(store.as_ref(), &selection, &cancel).await)
        });
    }

    fn spawn<F>(&mut self, task: F)
    where
        F: Future<Output = OutcomeKind> + Send + 'static,
    {
        let generation = self.generation;
        let tx = self.tx.clone();
        self.pending += 1;
        tokio::spawn(async move {
            let kind = task.await;
            if tx.send(LoadOutcome { generation, kind }).is_err() {
                trace!(generation, "controller dropped before load finished");
            }
        });
    }
}

struct BufferedJob {
    builders: Arc<ContentBuilders>,
    cache: PreviewCache,
    cache_key: CacheKey,
    budget: u64,
    handler: HandlerId,
    selection: ObjectSelection,
}

impl BufferedJob {
    async fn run(&self, store: &dyn ObjectStore, cancel: &CancellationToken) -> Result<CacheEntry> {
        let bytes = store
            .byte_range(
                &self.selection.container,
                &self.selection.key,
                self.budget,
                cancel,
            )
            .await?;
        if cancel.is_cancelled() {
            return Err(PreviewError::Cancelled);
        }

        let request = BuildRequest {
            key: &self.selection.key,
            bytes: &bytes,
            byte_limit: self.budget,
            object_size: self.selection.size,
        };
        let built = self.builders.build_buffered(self.handler, &request)?;
        Ok(self.cache.insert(self.cache_key.clone(), Arc::new(built)))
    }
}

async fn load_streamed(
    store: &dyn ObjectStore,
    builders: &ContentBuilders,
    selection: &ObjectSelection,
    handler: HandlerId,
    cancel: &CancellationToken,
) -> Result<LoadedPreview> {
    let url = store
        .retrieval_url(&selection.container, &selection.key, cancel)
        .await?;
    let preview = tokio::select! {
        biased;
        () = cancel.cancelled() => return Err(PreviewError::Cancelled),
        built = builders.build_from_url(handler, url.clone()) => built?,
    };
    Ok(LoadedPreview {
        preview: Arc::new(preview),
        download_url: Some(url),
    })
}

/// Retrieval URL for the download link; failures only cost the link
async fn resolve_download_url(
    store: &dyn ObjectStore,
    selection: &ObjectSelection,
    cancel: &CancellationToken,
) -> Option<String> {
    match store
        .retrieval_url(&selection.container, &selection.key, cancel)
        .await
    {
        Ok(url) => Some(url),
        Err(err) if err.is_cancelled() => None,
        Err(err) => {
            warn!(key = %selection.key, error = %err, "download URL unavailable");
            None
        }
    }
}
