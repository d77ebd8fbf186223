//! Diagnostic logging setup
//!
//! Logs go to stderr so previews printed on stdout stay clean. `RUST_LOG`
//! takes precedence over the verbosity flags.

use tracing_subscriber::EnvFilter;

/// Log level for the CLI verbosity flags
#[must_use]
pub const fn level_for(verbosity: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Install the global subscriber
///
/// Does nothing if a subscriber is already installed.
pub fn init(verbosity: u8, quiet: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("peekr={}", level_for(verbosity, quiet))));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
