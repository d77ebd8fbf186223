//! Command-line interface definitions and parsing
//!
//! This module defines the CLI structure for peekr using the `clap` crate.
//!
//! # Commands
//!
//! - **preview**: Load a local file through the preview engine and print it
//! - **resolve**: Show which handler previews each name
//! - **policy**: Show the load decision for a name and size
//! - **config**: Show, locate or initialize the configuration file
//!
//! # Examples
//!
//! ```no_run
//! use peekr::cli::{Cli, Commands};
//!
//! let cli = Cli::parse_args();
//! if let Commands::Preview { path, .. } = &cli.command {
//!     println!("previewing {}", path.display());
//! }
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Main CLI structure for parsing command-line arguments
#[derive(Parser, Debug)]
#[command(name = "peekr")]
#[command(about = "Bounded-prefix previews for stored objects", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Suppress informational output (only print results)
    #[arg(short = 'q', long = "quiet", global = true)]
    pub quiet: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Use this configuration file instead of the default
    #[arg(long = "config", value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Preview a local file
    #[command(visible_alias = "p")]
    Preview {
        /// File to preview
        #[arg(value_name = "PATH")]
        path: PathBuf,

        /// Load files above the automatic size cap
        #[arg(short = 'm', long = "manual")]
        manual: bool,

        /// Print the preview state as JSON
        #[arg(long = "json")]
        json: bool,
    },

    /// Show the preview handler for object names
    #[command(visible_alias = "r")]
    Resolve {
        /// Object names or keys
        #[arg(value_name = "NAME", required = true)]
        names: Vec<String>,
    },

    /// Show the load decision for an object
    Policy {
        /// Object name or key
        #[arg(value_name = "NAME")]
        name: String,

        /// Object size in bytes
        #[arg(short = 's', long = "size", value_name = "BYTES")]
        size: Option<u64>,

        /// Evaluate as if the user consented to a manual load
        #[arg(short = 'm', long = "manual")]
        manual: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

/// Configuration management subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommands {
    /// Print the effective configuration as TOML
    Show,

    /// Print the configuration file path
    Path,

    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short = 'f', long = "force")]
        force: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
