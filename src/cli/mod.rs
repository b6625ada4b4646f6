//! cli
//!
//! Command-line interface layer for gitver.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Install the log subscriber
//! - Delegate to command handlers
//!
//! # Architecture
//!
//! The CLI layer is thin. It parses arguments via clap, turns flags into a
//! configuration layer and asks the [`crate::engine`] for results. Errors
//! are reported through `anyhow`.

pub mod args;
pub mod commands;
pub mod logging;

pub use args::{Cli, Shell};

use std::path::PathBuf;

use anyhow::Result;

use crate::core::config::ConfigFile;

/// Execution context shared by command handlers.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Working directory override.
    pub cwd: Option<PathBuf>,
    /// Extra configuration file from `--config`.
    pub config_file: Option<PathBuf>,
    /// Configuration overrides from flags.
    pub overrides: ConfigFile,
    pub debug: bool,
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();
    logging::init(cli.debug);

    let ctx = Context {
        cwd: cli.cwd.clone(),
        config_file: cli.config.clone(),
        overrides: cli.overrides(),
        debug: cli.debug,
    };

    commands::dispatch(cli.command.unwrap_or(args::Command::Version), &ctx)
}
