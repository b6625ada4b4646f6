//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Opens a calculator for the working directory
//! 2. Queries the engine
//! 3. Formats and displays output
//!
//! Handlers never touch the repository directly.

mod completion;
mod meta;
mod show;
mod version;

pub use completion::completion;
pub use meta::meta;
pub use show::show;
pub use version::version;

use anyhow::{Context as _, Result};

use super::Context;
use crate::cli::args::Command;
use crate::core::config::Config;
use crate::engine::{CalculatorBuilder, VersionCalculator};
use crate::git::Git;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Version => version::version(ctx),
        Command::Meta { key } => meta::meta(ctx, key),
        Command::Show { json } => show::show(ctx, json),
        Command::Completion { shell } => completion::completion(shell),
    }
}

/// Open a calculator for the context's working directory.
///
/// `--config` is layered above the repository files and below the flags.
pub(crate) fn open_calculator(ctx: &Context) -> Result<VersionCalculator<Git>> {
    let cwd = match &ctx.cwd {
        Some(cwd) => cwd.clone(),
        None => std::env::current_dir().context("Failed to determine current directory")?,
    };

    let overrides = match &ctx.config_file {
        Some(path) => Config::read_config_file(path)
            .with_context(|| format!("Failed to load {}", path.display()))?
            .merge(ctx.overrides.clone()),
        None => ctx.overrides.clone(),
    };

    CalculatorBuilder::location(cwd)
        .overrides(overrides)
        .open()
        .context("Failed to open repository")
}
