//! Peekr CLI application entry point
//!
//! This is the main executable for the peekr preview engine. It previews
//! local files through the same policy, builders and controller an embedding
//! application would use, and exposes the handler and policy lookups.
//!
//! # Usage
//!
//! ```bash
//! # Preview a file (blocked above the automatic size cap)
//! peekr preview logs/app.log
//!
//! # Consent to loading a larger file
//! peekr preview logs/app.log --manual
//!
//! # Machine-readable preview state
//! peekr preview data.csv --json
//!
//! # Which handler previews these names?
//! peekr resolve photo.JPG scene.ply report.tsv
//!
//! # What would happen for a 500 KB log?
//! peekr policy big.log --size 512000
//! ```
//!
//! # Configuration
//!
//! Limits and the viewer bundle location are read from the user's config
//! directory (`~/.config/peekr/config.toml` on Linux) and can be overridden
//! with `PEEKR__LIMITS__SOFT_CAP_BYTES`-style environment variables.

use peekr::{
    PeekrError,
    cli::{Cli, Commands, ConfigCommands},
    config::PeekrConfig,
    logging, output,
    preview::{
        ContentBuilders, HttpBundleSource, ObjectSelection, PreviewCache, PreviewController,
        PreviewStatus, policy, registry,
    },
    store::{LocalStore, ObjectStore},
};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

type Result<T> = std::result::Result<T, PeekrError>;

fn load_config(path: Option<&Path>) -> Result<PeekrConfig> {
    let config = match path {
        Some(path) => PeekrConfig::load_from(path)?,
        None => PeekrConfig::load()?,
    };
    Ok(config)
}

/// Preview a local file and print the resulting state
///
/// # Errors
/// Returns `PeekrError` if the path cannot be split into a directory and a
/// file name, the file cannot be inspected, or JSON output fails.
async fn handle_preview(
    config: &PeekrConfig,
    path: &Path,
    manual: bool,
    json: bool,
    quiet: bool,
) -> Result<()> {
    let (container, key) = LocalStore::split_path(path).ok_or_else(|| {
        PeekrError::InvalidInput(format!("'{}' does not name a file", path.display()))
    })?;
    let size = LocalStore::object_size(&container, &key).await?;
    info!(container = %container, key = %key, size, "previewing local file");

    let store: Arc<dyn ObjectStore> = Arc::new(LocalStore::new());
    let bundle_source = Arc::new(HttpBundleSource::new(&config.viewer)?);
    let builders = Arc::new(ContentBuilders::new(config.limits, bundle_source));
    let cache = PreviewCache::with_max_entries(config.cache.max_entries);
    let mut controller = PreviewController::new(store, cache, builders);

    controller.select(Some(ObjectSelection::new(container, key, Some(size))));
    if manual {
        let blocked = controller.state().status() == PreviewStatus::Blocked;
        if let Some(load) = controller.manual_load() {
            load.trigger();
        } else if blocked && !quiet {
            eprintln!("Manual loading is not available for this file.");
        }
    }
    controller.settle().await;

    if json {
        println!("{}", serde_json::to_string_pretty(controller.state())?);
    } else {
        println!("{}", output::render_state(controller.state(), quiet));
    }
    Ok(())
}

fn handle_resolve(names: &[String], quiet: bool) {
    for name in names {
        println!("{}", output::handler_line(name, registry::resolve(name), quiet));
    }
}

fn handle_policy(config: &PeekrConfig, name: &str, size: Option<u64>, manual: bool, quiet: bool) {
    let decision = policy::decide(registry::resolve(name), size, manual, &config.limits);
    println!(
        "{}",
        output::policy_summary(name, size, decision, &config.limits, quiet)
    );
}

/// Handle configuration subcommands
///
/// # Errors
/// Returns `PeekrError` if the configuration cannot be serialized or written,
/// or if `init` would overwrite an existing file without `--force`.
fn handle_config_command(
    config_override: Option<&Path>,
    command: &ConfigCommands,
    quiet: bool,
) -> Result<()> {
    let path = match config_override {
        Some(path) => path.to_path_buf(),
        None => PeekrConfig::config_path()?,
    };

    match command {
        ConfigCommands::Show => {
            let config = load_config(config_override)?;
            let toml_string = toml::to_string_pretty(&config)
                .map_err(|e| PeekrError::InvalidInput(format!("Failed to serialize config: {e}")))?;
            print!("{toml_string}");
        }
        ConfigCommands::Path => println!("{}", path.display()),
        ConfigCommands::Init { force } => {
            if path.exists() && !force {
                return Err(PeekrError::InvalidInput(format!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                )));
            }
            PeekrConfig::default().save_to(&path)?;
            if !quiet {
                println!("Wrote default configuration to {}", path.display());
            }
        }
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();
    logging::init(cli.verbose, cli.quiet);

    let config_override = cli.config.as_deref();
    let quiet = cli.quiet;

    match &cli.command {
        Commands::Preview { path, manual, json } => {
            let config = load_config(config_override)?;
            handle_preview(&config, path, *manual, *json, quiet).await?;
        }
        Commands::Resolve { names } => handle_resolve(names, quiet),
        Commands::Policy { name, size, manual } => {
            let config = load_config(config_override)?;
            handle_policy(&config, name, *size, *manual, quiet);
        }
        Commands::Config { command } => {
            handle_config_command(config_override, command, quiet)?;
        }
    }

    Ok(())
}
