//! Observable preview state
//!
//! The state is owned by its controller and only changed through the
//! crate-private transitions below. Status, content, reason and error live
//! in one enum so a ready state always has content and a blocked state
//! always has a reason.

use super::types::{
    BlockedReason, BuiltPreview, CacheEntry, HandlerId, LoadMode, PreviewContent, PreviewStatus,
};
use serde::{Serialize, Serializer};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Phase {
    Idle,
    Loading,
    Ready(CacheEntry),
    Blocked(BlockedReason),
    Error(String),
}

/// State of the current preview
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewState {
    handler_id: Option<HandlerId>,
    phase: Phase,
    download_url: Option<String>,
    message: Option<String>,
    can_manual_load: bool,
    is_truncated: bool,
    load_mode: Option<LoadMode>,
}

impl Default for PreviewState {
    fn default() -> Self {
        Self::idle()
    }
}

impl PreviewState {
    /// Nothing selected
    #[must_use]
    pub const fn idle() -> Self {
        Self {
            handler_id: None,
            phase: Phase::Idle,
            download_url: None,
            message: None,
            can_manual_load: false,
            is_truncated: false,
            load_mode: None,
        }
    }

    pub(crate) const fn loading(handler_id: HandlerId, load_mode: Option<LoadMode>) -> Self {
        Self {
            handler_id: Some(handler_id),
            phase: Phase::Loading,
            download_url: None,
            message: None,
            can_manual_load: false,
            is_truncated: false,
            load_mode,
        }
    }

    pub(crate) fn set_blocked(
        &mut self,
        reason: BlockedReason,
        can_manual_load: bool,
        message: Option<String>,
    ) {
        self.phase = Phase::Blocked(reason);
        self.can_manual_load = can_manual_load;
        self.message = message;
        self.is_truncated = false;
        self.load_mode = None;
    }

    pub(crate) fn set_ready(&mut self, preview: CacheEntry) {
        self.is_truncated = preview.is_truncated;
        self.message.clone_from(&preview.message);
        self.can_manual_load = false;
        self.phase = Phase::Ready(preview);
    }

    pub(crate) fn set_error(&mut self, message: String, detail: String) {
        self.phase = Phase::Error(detail);
        self.message = Some(message);
        self.can_manual_load = false;
        self.is_truncated = false;
    }

    pub(crate) fn set_download_url(&mut self, url: Option<String>) {
        self.download_url = url;
    }

    #[must_use]
    pub const fn status(&self) -> PreviewStatus {
        match self.phase {
            Phase::Idle => PreviewStatus::Idle,
            Phase::Loading => PreviewStatus::Loading,
            Phase::Ready(_) => PreviewStatus::Ready,
            Phase::Blocked(_) => PreviewStatus::Blocked,
            Phase::Error(_) => PreviewStatus::Error,
        }
    }

    #[must_use]
    pub const fn handler_id(&self) -> Option<HandlerId> {
        self.handler_id
    }

    /// Built preview, present only when ready
    #[must_use]
    pub fn preview(&self) -> Option<&BuiltPreview> {
        match &self.phase {
            Phase::Ready(preview) => Some(preview.as_ref()),
            _ => None,
        }
    }

    /// Renderable content, present only when ready
    #[must_use]
    pub fn content(&self) -> Option<&PreviewContent> {
        self.preview().map(|preview| &preview.content)
    }

    #[must_use]
    pub const fn blocked_reason(&self) -> Option<BlockedReason> {
        match self.phase {
            Phase::Blocked(reason) => Some(reason),
            _ => None,
        }
    }

    /// Underlying failure detail, present only in the error state
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match &self.phase {
            Phase::Error(detail) => Some(detail.as_str()),
            _ => None,
        }
    }

    #[must_use]
    pub fn download_url(&self) -> Option<&str> {
        self.download_url.as_deref()
    }

    /// User-facing notice: truncation, block explanation or failure
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    #[must_use]
    pub const fn can_manual_load(&self) -> bool {
        self.can_manual_load
    }

    #[must_use]
    pub const fn is_truncated(&self) -> bool {
        self.is_truncated
    }

    /// Fetch mode of the current load, if one was allowed
    #[must_use]
    pub const fn load_mode(&self) -> Option<LoadMode> {
        self.load_mode
    }
}

#[derive(Serialize)]
struct Snapshot<'a> {
    status: PreviewStatus,
    handler_id: Option<HandlerId>,
    content: Option<&'a PreviewContent>,
    download_url: Option<&'a str>,
    message: Option<&'a str>,
    error: Option<&'a str>,
    blocked_reason: Option<BlockedReason>,
    can_manual_load: bool,
    is_truncated: bool,
    load_mode: Option<LoadMode>,
}

impl Serialize for PreviewState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Snapshot {
            status: self.status(),
            handler_id: self.handler_id,
            content: self.content(),
            download_url: self.download_url(),
            message: self.message(),
            error: self.error(),
            blocked_reason: self.blocked_reason(),
            can_manual_load: self.can_manual_load,
            is_truncated: self.is_truncated,
            load_mode: self.load_mode,
        }
        .serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preview::types::MediaType;
    use std::sync::Arc;

    #[test]
    fn test_idle_has_nothing() {
        let state = PreviewState::default();
        assert_eq!(state.status(), PreviewStatus::Idle);
        assert!(state.handler_id().is_none());
        assert!(state.content().is_none());
        assert!(!state.can_manual_load());
    }

    #[test]
    fn test_ready_carries_content_and_flags() {
        let mut state = PreviewState::loading(HandlerId::Text, Some(LoadMode::Auto));
        assert_eq!(state.status(), PreviewStatus::Loading);
        state.set_ready(Arc::new(BuiltPreview {
            content: PreviewContent::Text {
                text: "abc".into(),
                line_count: 1,
                truncated: true,
                language: None,
            },
            is_truncated: true,
            message: Some("cut".into()),
        }));
        assert_eq!(state.status(), PreviewStatus::Ready);
        assert!(state.is_truncated());
        assert_eq!(state.message(), Some("cut"));
        assert!(state.blocked_reason().is_none());
    }

    #[test]
    fn test_blocked_clears_load_mode() {
        let mut state = PreviewState::loading(HandlerId::Text, None);
        state.set_blocked(BlockedReason::Manual, true, Some("ask".into()));
        assert_eq!(state.status(), PreviewStatus::Blocked);
        assert_eq!(state.blocked_reason(), Some(BlockedReason::Manual));
        assert!(state.can_manual_load());
        assert!(state.load_mode().is_none());
        assert!(state.content().is_none());
    }

    #[test]
    fn test_snapshot_serialization() {
        let mut state = PreviewState::loading(HandlerId::Image, Some(LoadMode::Auto));
        state.set_download_url(Some("file:///a.png".into()));
        state.set_ready(Arc::new(BuiltPreview {
            content: PreviewContent::Media {
                media_type: MediaType::Image,
                url: "file:///a.png".into(),
            },
            is_truncated: false,
            message: None,
        }));
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["status"], "ready");
        assert_eq!(json["handler_id"], "image");
        assert_eq!(json["content"]["kind"], "media");
        assert_eq!(json["download_url"], "file:///a.png");
        assert_eq!(json["load_mode"], "auto");
        assert!(json["error"].is_null());
    }

    #[test]
    fn test_error_keeps_detail_separate() {
        let mut state = PreviewState::loading(HandlerId::Table, Some(LoadMode::Auto));
        state.set_error("generic".into(), "disk on fire".into());
        assert_eq!(state.status(), PreviewStatus::Error);
        assert_eq!(state.message(), Some("generic"));
        assert_eq!(state.error(), Some("disk on fire"));
    }
}
