//! Plain text and source code previews

use super::{BuildRequest, count_lines, decode_prefix, line_break_offsets, truncate_chars};
use crate::preview::limits::PreviewLimits;
use crate::preview::registry;
use crate::preview::types::{BuiltPreview, PreviewContent};

pub const TRUNCATED_MESSAGE: &str = "Preview truncated to keep rendering responsive.";

/// Build a text preview from a fetched prefix
///
/// The text is cut at the character cap first and the line cap second; line
/// breaks are kept verbatim so CRLF content renders as fetched.
#[must_use]
pub fn build(request: &BuildRequest<'_>, limits: &PreviewLimits) -> BuiltPreview {
    let byte_truncated = request.is_byte_truncated();
    let mut text = decode_prefix(request.bytes, byte_truncated);

    let char_truncated = truncate_chars(&mut text, limits.max_rendered_chars);
    let (line_count, line_truncated) = cap_lines(&mut text, limits.max_rendered_lines);

    let truncated = byte_truncated || char_truncated || line_truncated;

    BuiltPreview {
        content: PreviewContent::Text {
            text,
            line_count,
            truncated,
            language: registry::language_hint(request.key),
        },
        is_truncated: truncated,
        message: truncated.then(|| TRUNCATED_MESSAGE.to_string()),
    }
}

/// Keep at most `max_lines` lines, returning the visible count and whether
/// anything was cut
fn cap_lines(text: &mut String, max_lines: usize) -> (usize, bool) {
    let total = count_lines(text);
    if total <= max_lines {
        return (total, false);
    }

    // The break ending line `max_lines` is where the cut goes.
    let cut = match max_lines.checked_sub(1) {
        Some(last) => line_break_offsets(text).nth(last),
        None => Some(0),
    };
    match cut {
        Some(cut) => {
            text.truncate(cut);
            (max_lines, true)
        }
        None => (total, false),
    }
}
