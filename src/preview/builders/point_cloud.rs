//! Point-cloud viewer assembly
//!
//! A point-cloud preview is a single self-contained HTML document: the
//! published viewer page with its stylesheet and script inlined and its
//! startup configuration replaced by one that loads the selected object.

use crate::preview::error::{PreviewError, Result};
use crate::preview::types::{BuiltPreview, PreviewContent};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::debug;

const STYLESHEET_LINK: &str = r#"<link rel="stylesheet" href="./index.css">"#;
const MODULE_SCRIPT_OPEN: &str = r#"<script type="module">"#;
const SCRIPT_CLOSE: &str = "</script>";
const MAIN_IMPORT: &str = "import { main } from './index.js';";

/// Where the viewer bundle is published
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Package URL without version suffix
    pub bundle_base_url: String,
    /// Package version or range
    pub bundle_version: String,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            bundle_base_url: "https://cdn.jsdelivr.net/npm/@playcanvas/supersplat-viewer"
                .to_string(),
            bundle_version: "1".to_string(),
        }
    }
}

impl ViewerConfig {
    /// Directory URL holding `index.html`, `index.css` and `index.js`
    #[must_use]
    pub fn dist_url(&self) -> String {
        format!(
            "{}@{}/dist/",
            self.bundle_base_url.trim_end_matches('/'),
            self.bundle_version
        )
    }
}

/// Published viewer sources
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewerBundle {
    pub html: String,
    pub css: String,
    pub js: String,
}

/// Provider of the viewer bundle
#[async_trait]
pub trait BundleSource: Send + Sync {
    /// Fetch the viewer sources
    ///
    /// # Errors
    ///
    /// Returns an error if any part of the bundle cannot be obtained.
    async fn fetch_bundle(&self) -> Result<ViewerBundle>;
}

#[async_trait]
impl BundleSource for ViewerBundle {
    async fn fetch_bundle(&self) -> Result<ViewerBundle> {
        Ok(self.clone())
    }
}

/// Fetches the bundle over HTTP
pub struct HttpBundleSource {
    client: reqwest::Client,
    dist_url: String,
}

impl HttpBundleSource {
    /// Create a source for the configured bundle location
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new(config: &ViewerConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            dist_url: config.dist_url(),
        })
    }

    async fn fetch_text(&self, file: &str) -> Result<String> {
        let url = format!("{}{file}", self.dist_url);
        debug!(%url, "fetching viewer bundle file");
        let text = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(text)
    }
}

#[async_trait]
impl BundleSource for HttpBundleSource {
    async fn fetch_bundle(&self) -> Result<ViewerBundle> {
        let (html, css, js) = tokio::try_join!(
            self.fetch_text("index.html"),
            self.fetch_text("index.css"),
            self.fetch_text("index.js"),
        )?;
        Ok(ViewerBundle { html, css, js })
    }
}

/// Builds point-cloud previews, fetching the bundle at most once
///
/// A failed fetch is not remembered, so a later preview tries again.
pub struct ViewerAssembler {
    source: Arc<dyn BundleSource>,
    bundle: OnceCell<Arc<ViewerBundle>>,
}

impl ViewerAssembler {
    #[must_use]
    pub fn new(source: Arc<dyn BundleSource>) -> Self {
        Self {
            source,
            bundle: OnceCell::new(),
        }
    }

    /// Assemble a viewer document for a retrieval URL
    ///
    /// # Errors
    ///
    /// Returns an error if the bundle cannot be fetched or lacks one of the
    /// anchors the assembly rewrites.
    pub async fn build(&self, url: String) -> Result<BuiltPreview> {
        let bundle = self
            .bundle
            .get_or_try_init(|| async { self.source.fetch_bundle().await.map(Arc::new) })
            .await?;
        let document = assemble(bundle, &url)?;
        Ok(BuiltPreview {
            content: PreviewContent::PointCloud { url, document },
            is_truncated: false,
            message: None,
        })
    }
}

/// Rewrite the bundle page into a self-contained viewer for `content_url`
///
/// # Errors
///
/// Returns `PreviewError::ViewerAssembly` if the page lacks the stylesheet
/// link, the configuration script or the main import.
pub fn assemble(bundle: &ViewerBundle, content_url: &str) -> Result<String> {
    let html = replace_config_script(&bundle.html, &config_script(content_url)?)?;

    if !html.contains(STYLESHEET_LINK) {
        return Err(missing("stylesheet link"));
    }
    let html = html.replacen(STYLESHEET_LINK, &format!("<style>{}</style>", bundle.css), 1);

    if !html.contains(MAIN_IMPORT) {
        return Err(missing("main import"));
    }
    Ok(html.replacen(MAIN_IMPORT, &bundle.js.replace("</script", "<\\/script"), 1))
}

fn replace_config_script(html: &str, replacement: &str) -> Result<String> {
    let start = html
        .find(MODULE_SCRIPT_OPEN)
        .ok_or_else(|| missing("configuration script"))?;
    let close = html[start..]
        .find(SCRIPT_CLOSE)
        .ok_or_else(|| missing("configuration script end"))?;
    let end = start + close + SCRIPT_CLOSE.len();

    let mut out = String::with_capacity(html.len() + replacement.len());
    out.push_str(&html[..start]);
    out.push_str(replacement);
    out.push_str(&html[end..]);
    Ok(out)
}

fn config_script(content_url: &str) -> Result<String> {
    let url = script_json(&serde_json::to_string(content_url)?);
    let settings = script_json(&serde_json::to_string(&viewer_settings())?);
    Ok(format!(
        "<script type=\"module\">\n\
         const contentUrl = {url};\n\
         window.sse = {{\n\
         config: {{ contentUrl, contents: fetch(contentUrl), noui: true }},\n\
         settings: Promise.resolve({settings})\n\
         }};\n\
         </script>"
    ))
}

/// JSON is inlined into a script element, which must not see `</`
fn script_json(json: &str) -> String {
    json.replace("</", "<\\/")
}

fn viewer_settings() -> serde_json::Value {
    let disabled = json!({ "enabled": false });
    json!({
        "version": 2,
        "tonemapping": "none",
        "highPrecisionRendering": false,
        "background": { "color": [0, 0, 0] },
        "postEffectSettings": {
            "sharpness": disabled,
            "bloom": disabled,
            "grading": disabled,
            "vignette": disabled,
            "fringing": disabled
        },
        "animTracks": [],
        "cameras": [{
            "initial": {
                "position": [0, 0, 5],
                "target": [0, 0, 0],
                "fov": 75
            }
        }],
        "annotations": [],
        "startMode": "default",
        "hasStartPose": false
    })
}

fn missing(anchor: &str) -> PreviewError {
    PreviewError::ViewerAssembly(format!("viewer page has no {anchor}"))
}
