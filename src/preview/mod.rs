//! Object preview engine
//!
//! This module decides whether and how an object can be previewed and
//! builds the preview from a bounded prefix of its bytes or from its URL:
//! - Handler registry mapping extensions to content families
//! - Load policy with automatic and on-demand size caps
//! - Builders for text, tables, markup, media and point-cloud viewers
//! - A session cache keyed by fetch mode
//! - A controller that loads asynchronously and drops superseded results

pub mod builders;
mod cache;
mod controller;
mod error;
mod limits;
pub mod policy;
pub mod registry;
mod state;
mod types;

pub use builders::point_cloud::{
    BundleSource, HttpBundleSource, ViewerAssembler, ViewerBundle, ViewerConfig,
};
pub use builders::{BuildRequest, ContentBuilders};
pub use cache::{CacheKey, PreviewCache};
pub use controller::{
    FETCH_ERROR_MESSAGE, LoadOutcome, LoadedPreview, ManualLoad, OutcomeKind, PreviewController,
};
pub use error::{PreviewError, Result};
pub use limits::PreviewLimits;
pub use policy::LoadPolicy;
pub use state::PreviewState;
pub use types::{
    BlockedReason, BuiltPreview, CacheEntry, Delimiter, HandlerId, LoadMode, MediaType,
    ObjectSelection, PreviewContent, PreviewStatus, SandboxPolicy,
};
