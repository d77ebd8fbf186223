//! Load policy evaluation
//!
//! Decides from handler, object size and user consent whether a preview
//! loads automatically, waits for consent, or is blocked, and how many
//! bytes the fetch may read.

use super::limits::PreviewLimits;
use super::types::{BlockedReason, HandlerId, LoadMode};
use byte_unit::{Byte, UnitType};

/// Outcome of a policy decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPolicy {
    /// Load with the given fetch mode
    Load(LoadMode),
    /// Do not load
    Blocked(BlockedReason),
}

impl LoadPolicy {
    /// Reason the preview is blocked, if it is
    #[must_use]
    pub const fn blocked_reason(&self) -> Option<BlockedReason> {
        match self {
            Self::Load(_) => None,
            Self::Blocked(reason) => Some(*reason),
        }
    }

    /// Fetch mode, if loading is allowed
    #[must_use]
    pub const fn load_mode(&self) -> Option<LoadMode> {
        match self {
            Self::Load(mode) => Some(*mode),
            Self::Blocked(_) => None,
        }
    }

    /// Whether the user can lift the block by consenting
    #[must_use]
    pub const fn can_manual_load(&self) -> bool {
        matches!(self, Self::Blocked(BlockedReason::Manual))
    }

    /// User-facing explanation for a blocked preview
    #[must_use]
    pub fn explanation(&self, limits: &PreviewLimits) -> Option<String> {
        let reason = self.blocked_reason()?;
        Some(match reason {
            BlockedReason::Manual => {
                "Inline preview is available on demand for this file size.".to_string()
            }
            BlockedReason::TooLarge => format!(
                "Inline preview is disabled for files larger than {}.",
                format_size(limits.hard_cap_bytes)
            ),
            BlockedReason::Unsupported => {
                "Inline preview is not available for this file type.".to_string()
            }
        })
    }
}

/// Decide whether and how to load a preview
///
/// Media and point-cloud previews are rendered from a URL, so their size
/// never matters. Buffered previews are checked against the hard cap first,
/// which consent cannot override. An unknown size skips both size checks.
#[must_use]
pub fn decide(
    handler: HandlerId,
    size: Option<u64>,
    manual_consent: bool,
    limits: &PreviewLimits,
) -> LoadPolicy {
    match handler {
        HandlerId::Unsupported => LoadPolicy::Blocked(BlockedReason::Unsupported),
        HandlerId::Image | HandlerId::Video | HandlerId::PointCloud => {
            LoadPolicy::Load(LoadMode::Auto)
        }
        HandlerId::Text | HandlerId::Table | HandlerId::Markup => match size {
            Some(size) if size > limits.hard_cap_bytes => {
                LoadPolicy::Blocked(BlockedReason::TooLarge)
            }
            Some(size) if size > limits.soft_cap_bytes && !manual_consent => {
                LoadPolicy::Blocked(BlockedReason::Manual)
            }
            _ if manual_consent => LoadPolicy::Load(LoadMode::Manual),
            _ => LoadPolicy::Load(LoadMode::Auto),
        },
    }
}

/// Number of bytes to fetch for a preview
///
/// Never more than the object holds; falls back to the mode's cap when the
/// size is unknown or zero.
#[must_use]
pub fn fetch_budget(size: Option<u64>, mode: LoadMode, limits: &PreviewLimits) -> u64 {
    let cap = limits.cap_for(mode);
    match size {
        Some(size) if size > 0 => size.min(cap),
        _ => cap,
    }
}

/// Human-readable byte size
#[must_use]
pub fn format_size(bytes: u64) -> String {
    Byte::from_u64(bytes)
        .get_appropriate_unit(UnitType::Binary)
        .to_string()
}
