//! Handler registry
//!
//! Maps an object name to the content family that can preview it, and to a
//! syntax hint for text renderers. Both lookups are pure functions of the
//! extension: query suffix stripped, last dot wins, case-insensitive.

use super::types::HandlerId;

/// Extract the lower-cased extension of an object name
///
/// Returns an empty string for names without a dot.
#[must_use]
pub fn extension(name: &str) -> String {
    let path = name.split_once('?').map_or(name, |(path, _)| path);
    path.rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default()
}

/// Resolve the preview handler for an object name
#[must_use]
pub fn resolve(name: &str) -> HandlerId {
    match extension(name).as_str() {
        "jpg" | "jpeg" | "png" | "gif" | "webp" | "svg" | "bmp" | "avif" => HandlerId::Image,
        "mp4" | "mov" | "webm" | "m4v" | "ogv" | "avi" | "mkv" => HandlerId::Video,
        "ply" | "splat" | "sog" | "spz" => HandlerId::PointCloud,
        "csv" | "tsv" => HandlerId::Table,
        "html" | "htm" => HandlerId::Markup,
        "txt" | "log" | "md" | "json" | "yaml" | "yml" | "xml" | "ini" | "conf" | "toml"
        | "js" | "jsx" | "ts" | "tsx" | "css" | "py" | "sh" | "rs" => HandlerId::Text,
        _ => HandlerId::Unsupported,
    }
}

/// Syntax hint for the text builder, if the extension has one
#[must_use]
pub fn language_hint(name: &str) -> Option<&'static str> {
    let language = match extension(name).as_str() {
        "txt" => "plaintext",
        "log" => "log",
        "md" => "markdown",
        "json" => "json",
        "yaml" | "yml" => "yaml",
        "xml" => "xml",
        "ini" | "conf" => "ini",
        "toml" => "toml",
        "js" | "jsx" => "javascript",
        "ts" | "tsx" => "typescript",
        "css" => "css",
        "html" | "htm" => "html",
        "py" => "python",
        "sh" => "shell",
        "rs" => "rust",
        _ => return None,
    };
    Some(language)
}
