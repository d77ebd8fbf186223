//! Preview content types

use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Content family of an object, chosen from its extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum HandlerId {
    /// Raster or vector image rendered from a direct URL
    Image,
    /// Video streamed from a direct URL
    Video,
    /// Gaussian splat / point-cloud scene shown in an embedded viewer
    PointCloud,
    /// Delimited text (CSV/TSV)
    Table,
    /// HTML documents
    Markup,
    /// Plain text and source code
    Text,
    /// Anything without an inline preview
    Unsupported,
}

impl HandlerId {
    /// Stable identifier used in cache keys and output
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::PointCloud => "point-cloud",
            Self::Table => "table",
            Self::Markup => "markup",
            Self::Text => "text",
            Self::Unsupported => "unsupported",
        }
    }

    /// Image or video
    #[must_use]
    pub const fn is_media(&self) -> bool {
        matches!(self, Self::Image | Self::Video)
    }

    /// Rendered from a retrieval URL, never buffered
    #[must_use]
    pub const fn is_streamed(&self) -> bool {
        matches!(self, Self::Image | Self::Video | Self::PointCloud)
    }

    /// Built from a fetched byte prefix
    #[must_use]
    pub const fn is_buffered(&self) -> bool {
        matches!(self, Self::Table | Self::Markup | Self::Text)
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a preview is not loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlockedReason {
    /// Above the automatic size cap; the user may opt in
    Manual,
    /// Above the hard size cap; no override
    TooLarge,
    /// No handler for this file type
    Unsupported,
}

impl fmt::Display for BlockedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Manual => "manual",
            Self::TooLarge => "too-large",
            Self::Unsupported => "unsupported",
        })
    }
}

/// Fetch mode, which also selects the byte budget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadMode {
    /// Loaded without asking
    Auto,
    /// Loaded after explicit user consent
    Manual,
}

impl fmt::Display for LoadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Auto => "auto",
            Self::Manual => "manual",
        })
    }
}

/// Lifecycle status of a preview
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PreviewStatus {
    Idle,
    Loading,
    Ready,
    Blocked,
    Error,
}

impl fmt::Display for PreviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Ready => "ready",
            Self::Blocked => "blocked",
            Self::Error => "error",
        })
    }
}

/// Media subtype for URL-rendered content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
}

/// Field delimiter of a table preview
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Delimiter {
    #[serde(rename = ",")]
    Comma,
    #[serde(rename = "\t")]
    Tab,
    #[serde(rename = ";")]
    Semicolon,
    #[serde(rename = "|")]
    Pipe,
}

impl Delimiter {
    /// Candidates tried when sniffing, in tie-break order
    pub const CANDIDATES: [Self; 4] = [Self::Comma, Self::Tab, Self::Semicolon, Self::Pipe];

    /// Delimiter as a single byte for the CSV reader
    #[must_use]
    pub const fn as_byte(&self) -> u8 {
        match self {
            Self::Comma => b',',
            Self::Tab => b'\t',
            Self::Semicolon => b';',
            Self::Pipe => b'|',
        }
    }
}

/// How an embedding layer may sandbox rendered markup
///
/// Markup previews are never allowed to run scripts unless the consuming
/// layer opts in explicitly. Point-cloud documents need their viewer script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SandboxPolicy {
    /// No scripts, no same-origin access
    Strict,
    /// Scripts allowed, still without same-origin access
    AllowScripts,
}

impl SandboxPolicy {
    /// Value for an iframe `sandbox` attribute
    #[must_use]
    pub const fn iframe_sandbox(&self) -> &'static str {
        match self {
            Self::Strict => "",
            Self::AllowScripts => "allow-scripts",
        }
    }
}

/// Renderable preview content
///
/// Exactly one variant is populated for a ready preview. Adding a variant
/// forces every match site (dispatch, rendering, caching) to handle it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum PreviewContent {
    /// Image or video rendered directly from its URL
    Media {
        /// Image or video
        media_type: MediaType,
        /// Retrieval URL
        url: String,
    },

    /// Decoded text, capped by characters and lines
    Text {
        /// Visible text
        text: String,
        /// Number of visible lines
        line_count: usize,
        /// Whether the text represents less than the full object
        truncated: bool,
        /// Syntax hint for renderers
        language: Option<&'static str>,
    },

    /// Parsed delimited text
    Table {
        /// Header labels, blank ones replaced by `Column N`
        columns: Vec<String>,
        /// Data rows, each padded to the column count
        rows: Vec<Vec<String>>,
        /// More rows exist than are shown
        truncated_rows: bool,
        /// More columns exist than are shown
        truncated_columns: bool,
        /// Full decoded text, kept as a fallback view
        raw_text: String,
        /// Delimiter used for parsing
        delimiter: Delimiter,
    },

    /// HTML kept both for sandboxed rendering and as source text
    Markup {
        /// Markup for a sandboxed frame
        html: String,
        /// Same markup for a source view
        text: String,
        /// Number of lines, capped
        line_count: usize,
        /// Whether the markup represents less than the full object
        truncated: bool,
    },

    /// Self-contained point-cloud viewer document
    PointCloud {
        /// Retrieval URL embedded in the viewer
        url: String,
        /// Assembled viewer page
        document: String,
    },
}

impl PreviewContent {
    /// Check if content was truncated
    #[must_use]
    pub const fn is_truncated(&self) -> bool {
        match self {
            Self::Text { truncated, .. } | Self::Markup { truncated, .. } => *truncated,
            Self::Table {
                truncated_rows,
                truncated_columns,
                ..
            } => *truncated_rows || *truncated_columns,
            Self::Media { .. } | Self::PointCloud { .. } => false,
        }
    }

    /// Sandbox policy the consuming layer should apply
    #[must_use]
    pub const fn sandbox_policy(&self) -> SandboxPolicy {
        match self {
            Self::PointCloud { .. } => SandboxPolicy::AllowScripts,
            Self::Media { .. } | Self::Text { .. } | Self::Table { .. } | Self::Markup { .. } => {
                SandboxPolicy::Strict
            }
        }
    }

    /// Short name of the variant
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Media { .. } => "media",
            Self::Text { .. } => "text",
            Self::Table { .. } => "table",
            Self::Markup { .. } => "markup",
            Self::PointCloud { .. } => "point-cloud",
        }
    }
}

impl fmt::Display for PreviewContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Media { media_type, url } => {
                let label = match media_type {
                    MediaType::Image => "Image",
                    MediaType::Video => "Video",
                };
                write!(f, "{label}: {url}")
            }
            Self::Text {
                text,
                line_count,
                truncated,
                ..
            } => {
                write!(f, "{text}")?;
                if *truncated {
                    write!(f, "\n\n[... truncated, showing {line_count} lines ...]")?;
                }
                Ok(())
            }
            Self::Table {
                columns,
                rows,
                truncated_rows,
                truncated_columns,
                ..
            } => {
                write!(f, "{}", columns.join(" | "))?;
                for row in rows {
                    write!(f, "\n{}", row.join(" | "))?;
                }
                if *truncated_rows {
                    write!(f, "\n[... more rows ...]")?;
                }
                if *truncated_columns {
                    write!(f, "\n[... more columns ...]")?;
                }
                Ok(())
            }
            Self::Markup {
                text, truncated, ..
            } => {
                write!(f, "{text}")?;
                if *truncated {
                    write!(f, "\n\n[... truncated ...]")?;
                }
                Ok(())
            }
            Self::PointCloud { url, document } => write!(
                f,
                "Point-cloud viewer for {url} ({} byte document)",
                document.len()
            ),
        }
    }
}

/// Output of a content builder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltPreview {
    /// Built content
    pub content: PreviewContent,
    /// Whether the preview shows less than the full object
    pub is_truncated: bool,
    /// Notice for the user, if any
    pub message: Option<String>,
}

/// Immutable cache value, shared between the cache and ready states
pub type CacheEntry = Arc<BuiltPreview>;

/// The object a controller is asked to preview
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectSelection {
    /// Bucket or other container name
    pub container: String,
    /// Object key within the container
    pub key: String,
    /// Object size from listing metadata, when known
    pub size: Option<u64>,
}

impl ObjectSelection {
    /// Create a selection
    #[must_use]
    pub fn new(container: impl Into<String>, key: impl Into<String>, size: Option<u64>) -> Self {
        Self {
            container: container.into(),
            key: key.into(),
            size,
        }
    }

    /// Whether both selections name the same object
    #[must_use]
    pub fn same_object(&self, other: &Self) -> bool {
        self.container == other.container && self.key == other.key
    }
}
