//! Tunable preview limits

use super::error::{PreviewError, Result};
use super::types::LoadMode;
use serde::{Deserialize, Serialize};

/// Size and rendering caps applied by the policy and the builders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewLimits {
    /// Largest object loaded without consent, and the auto fetch budget
    pub soft_cap_bytes: u64,
    /// Largest object loaded at all, and the manual fetch budget
    pub hard_cap_bytes: u64,
    /// Maximum rendered characters for text and markup
    pub max_rendered_chars: usize,
    /// Maximum rendered lines for text and markup
    pub max_rendered_lines: usize,
    /// Maximum table data rows
    pub max_table_rows: usize,
    /// Maximum table columns
    pub max_table_columns: usize,
}

impl Default for PreviewLimits {
    fn default() -> Self {
        Self {
            soft_cap_bytes: 256 * 1024,
            hard_cap_bytes: 2 * 1024 * 1024,
            max_rendered_chars: 120_000,
            max_rendered_lines: 2_000,
            max_table_rows: 200,
            max_table_columns: 24,
        }
    }
}

impl PreviewLimits {
    /// Byte budget for a fetch mode
    #[must_use]
    pub const fn cap_for(&self, mode: LoadMode) -> u64 {
        match mode {
            LoadMode::Auto => self.soft_cap_bytes,
            LoadMode::Manual => self.hard_cap_bytes,
        }
    }

    /// Check that the limits are usable
    ///
    /// # Errors
    ///
    /// Returns `PreviewError::InvalidLimits` if a cap is zero or the hard
    /// cap does not exceed the soft cap.
    pub fn validate(&self) -> Result<()> {
        if self.soft_cap_bytes == 0 {
            return Err(PreviewError::InvalidLimits(
                "soft_cap_bytes must be greater than zero".into(),
            ));
        }
        if self.hard_cap_bytes <= self.soft_cap_bytes {
            return Err(PreviewError::InvalidLimits(format!(
                "hard_cap_bytes ({}) must exceed soft_cap_bytes ({})",
                self.hard_cap_bytes, self.soft_cap_bytes
            )));
        }
        let counts = [
            ("max_rendered_chars", self.max_rendered_chars),
            ("max_rendered_lines", self.max_rendered_lines),
            ("max_table_rows", self.max_table_rows),
            ("max_table_columns", self.max_table_columns),
        ];
        if let Some((name, _)) = counts.iter().find(|(_, value)| *value == 0) {
            return Err(PreviewError::InvalidLimits(format!(
                "{name} must be greater than zero"
            )));
        }
        Ok(())
    }
}
