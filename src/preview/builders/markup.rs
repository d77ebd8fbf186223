//! HTML previews
//!
//! Markup is kept verbatim for a sandboxed frame and for a source view. It is
//! only cut by characters; the line cap bounds the reported count.

use super::{BuildRequest, count_lines, decode_prefix, truncate_chars};
use crate::preview::limits::PreviewLimits;
use crate::preview::types::{BuiltPreview, PreviewContent};

pub const TRUNCATED_MESSAGE: &str =
    "Preview truncated. The full file may contain additional content.";

/// Build a markup preview from a fetched prefix
#[must_use]
pub fn build(request: &BuildRequest<'_>, limits: &PreviewLimits) -> BuiltPreview {
    let byte_truncated = request.is_byte_truncated();
    let mut html = decode_prefix(request.bytes, byte_truncated);
    let char_truncated = truncate_chars(&mut html, limits.max_rendered_chars);
    let line_count = count_lines(&html).min(limits.max_rendered_lines);

    let truncated = byte_truncated || char_truncated;

    BuiltPreview {
        content: PreviewContent::Markup {
            text: html.clone(),
            html,
            line_count,
            truncated,
        },
        is_truncated: truncated,
        message: truncated.then(|| TRUNCATED_MESSAGE.to_string()),
    }
}
