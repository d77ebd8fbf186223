//! Image and video previews

use crate::preview::types::{BuiltPreview, MediaType, PreviewContent};

/// Package a retrieval URL as media content; media is never truncated
#[must_use]
pub fn build(media_type: MediaType, url: String) -> BuiltPreview {
    BuiltPreview {
        content: PreviewContent::Media { media_type, url },
        is_truncated: false,
        message: None,
    }
}
