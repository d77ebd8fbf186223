//! Output formatting for CLI display
//!
//! This module formats preview states, handler lookups and policy decisions
//! for the terminal. Quiet mode drops headers and notices and prints only
//! the payload.

use crate::preview::policy::{self, LoadPolicy};
use crate::preview::{HandlerId, PreviewLimits, PreviewState, PreviewStatus};
use colored::Colorize;

/// Color a status label
#[must_use]
pub fn colorize_status(status: PreviewStatus) -> String {
    let label = status.to_string();
    match status {
        PreviewStatus::Ready => label.green().to_string(),
        PreviewStatus::Blocked => label.yellow().to_string(),
        PreviewStatus::Error => label.red().to_string(),
        PreviewStatus::Idle | PreviewStatus::Loading => label.dimmed().to_string(),
    }
}

/// Format a name with its handler
#[must_use]
pub fn handler_line(name: &str, handler: HandlerId, quiet: bool) -> String {
    if quiet {
        handler.to_string()
    } else if handler == HandlerId::Unsupported {
        format!("  {name} → {}", handler.to_string().red())
    } else {
        format!("  {name} → {}", handler.to_string().cyan())
    }
}

/// Format a policy decision with its fetch budget or explanation
#[must_use]
pub fn policy_summary(
    name: &str,
    size: Option<u64>,
    decision: LoadPolicy,
    limits: &PreviewLimits,
    quiet: bool,
) -> String {
    let verdict = match decision {
        LoadPolicy::Load(mode) => format!("load ({mode})"),
        LoadPolicy::Blocked(reason) => format!("blocked ({reason})"),
    };
    if quiet {
        return verdict;
    }

    let size_label = size.map_or_else(|| "unknown size".to_string(), policy::format_size);
    let mut lines = vec![format!("{name} ({size_label}): {}", verdict.bold())];
    match decision {
        LoadPolicy::Load(mode) if crate::preview::registry::resolve(name).is_buffered() => {
            lines.push(format!(
                "  fetch budget: {}",
                policy::format_size(policy::fetch_budget(size, mode, limits))
            ));
        }
        LoadPolicy::Load(_) => lines.push("  rendered from its URL".dimmed().to_string()),
        LoadPolicy::Blocked(_) => {
            if let Some(explanation) = decision.explanation(limits) {
                lines.push(format!("  {}", explanation.yellow()));
            }
            if decision.can_manual_load() {
                lines.push("  rerun with --manual to load anyway".dimmed().to_string());
            }
        }
    }
    lines.join("\n")
}

/// Format a preview state for display
#[must_use]
pub fn render_state(state: &PreviewState, quiet: bool) -> String {
    let mut lines = Vec::new();

    if !quiet {
        let handler = state
            .handler_id()
            .map_or_else(|| "none".to_string(), |handler| handler.to_string());
        let mut header = format!("[{}] {handler}", colorize_status(state.status()));
        if let Some(mode) = state.load_mode() {
            header.push_str(&format!(" ({mode})"));
        }
        if state.is_truncated() {
            header.push_str(&format!(" {}", "truncated".yellow()));
        }
        lines.push(header);
    }

    if let Some(content) = state.content() {
        lines.push(content.to_string());
    }

    if !quiet {
        if let Some(message) = state.message() {
            lines.push(message.yellow().to_string());
        }
        if let Some(detail) = state.error() {
            lines.push(format!("{} {detail}", "error:".red()));
        }
        if let Some(url) = state.download_url() {
            lines.push(format!("{} {url}", "download:".dimmed()));
        }
    }

    lines.join("\n")
}
