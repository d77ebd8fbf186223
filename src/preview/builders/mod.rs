//! Content builders
//!
//! Each builder turns a fetched byte prefix, or a retrieval URL, into a
//! [`BuiltPreview`]. Buffered builders never fail on malformed content; they
//! degrade to whatever the prefix allows.

pub mod markup;
pub mod media;
pub mod point_cloud;
pub mod table;
pub mod text;

use super::error::{PreviewError, Result};
use super::limits::PreviewLimits;
use super::types::{BuiltPreview, HandlerId, MediaType};
use point_cloud::{BundleSource, ViewerAssembler};
use regex::Regex;
use std::sync::{Arc, LazyLock};

static LINE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\r\n|\r|\n").expect("line break pattern is valid"));

/// Input to a buffered builder
#[derive(Debug, Clone, Copy)]
pub struct BuildRequest<'a> {
    /// Object key, used for extension-based hints
    pub key: &'a str,
    /// Fetched prefix
    pub bytes: &'a [u8],
    /// Byte budget the fetch was allowed
    pub byte_limit: u64,
    /// True object size, when known
    pub object_size: Option<u64>,
}

impl BuildRequest<'_> {
    /// Whether the fetched prefix is shorter than the object
    ///
    /// Without a known size, a prefix that filled its whole budget is
    /// assumed to be cut short.
    #[must_use]
    pub fn is_byte_truncated(&self) -> bool {
        let fetched = self.bytes.len() as u64;
        match self.object_size {
            Some(size) => fetched < size,
            None => fetched > 0 && fetched == self.byte_limit,
        }
    }
}

/// Dispatches previews to the builder for their handler
pub struct ContentBuilders {
    limits: PreviewLimits,
    viewer: ViewerAssembler,
}

impl ContentBuilders {
    /// Create builders with the given limits and viewer bundle source
    #[must_use]
    pub fn new(limits: PreviewLimits, bundle_source: Arc<dyn BundleSource>) -> Self {
        Self {
            limits,
            viewer: ViewerAssembler::new(bundle_source),
        }
    }

    /// Limits shared by the policy and the builders
    #[must_use]
    pub const fn limits(&self) -> &PreviewLimits {
        &self.limits
    }

    /// Build a preview from a fetched byte prefix
    ///
    /// # Errors
    ///
    /// Returns `PreviewError::UnexpectedHandler` for handlers rendered from
    /// a URL instead of bytes.
    pub fn build_buffered(
        &self,
        handler: HandlerId,
        request: &BuildRequest<'_>,
    ) -> Result<BuiltPreview> {
        match handler {
            HandlerId::Text => Ok(text::build(request, &self.limits)),
            HandlerId::Table => Ok(table::build(request, &self.limits)),
            HandlerId::Markup => Ok(markup::build(request, &self.limits)),
            HandlerId::Image | HandlerId::Video | HandlerId::PointCloud | HandlerId::Unsupported => {
                Err(PreviewError::UnexpectedHandler {
                    handler,
                    expected: "buffered",
                })
            }
        }
    }

    /// Build a preview from a retrieval URL
    ///
    /// # Errors
    ///
    /// Returns an error if the point-cloud viewer cannot be fetched or
    /// assembled, or if the handler needs bytes instead of a URL.
    pub async fn build_from_url(&self, handler: HandlerId, url: String) -> Result<BuiltPreview> {
        match handler {
            HandlerId::Image => Ok(media::build(MediaType::Image, url)),
            HandlerId::Video => Ok(media::build(MediaType::Video, url)),
            HandlerId::PointCloud => self.viewer.build(url).await,
            HandlerId::Text | HandlerId::Table | HandlerId::Markup | HandlerId::Unsupported => {
                Err(PreviewError::UnexpectedHandler {
                    handler,
                    expected: "URL",
                })
            }
        }
    }
}

/// Decode a fetched prefix as UTF-8, substituting invalid sequences
///
/// When the prefix was cut short, a multi-byte character split by the cut is
/// dropped rather than decoded as a replacement character.
pub(crate) fn decode_prefix(bytes: &[u8], byte_truncated: bool) -> String {
    let complete = if byte_truncated {
        trim_partial_char(bytes)
    } else {
        bytes
    };
    String::from_utf8_lossy(complete).into_owned()
}

fn trim_partial_char(bytes: &[u8]) -> &[u8] {
    let tail_start = bytes.len().saturating_sub(3);
    for idx in (tail_start..bytes.len()).rev() {
        let byte = bytes[idx];
        if byte & 0b1100_0000 == 0b1000_0000 {
            continue;
        }
        let width = match byte {
            0xC0..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF7 => 4,
            _ => 1,
        };
        return if idx + width > bytes.len() {
            &bytes[..idx]
        } else {
            bytes
        };
    }
    bytes
}

/// Cut `text` to at most `max_chars` characters; true if it was cut
pub(crate) fn truncate_chars(text: &mut String, max_chars: usize) -> bool {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => {
            text.truncate(idx);
            true
        }
        None => false,
    }
}

/// Number of lines in `text`, where CR, LF and CRLF each end one line
pub(crate) fn count_lines(text: &str) -> usize {
    if text.is_empty() {
        0
    } else {
        LINE_BREAK.find_iter(text).count() + 1
    }
}

/// Byte offsets where each line break starts
pub(crate) fn line_break_offsets(text: &str) -> impl Iterator<Item = usize> + '_ {
    LINE_BREAK.find_iter(text).map(|m| m.start())
}
