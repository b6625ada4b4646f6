//! version command - Print the computed version

use super::open_calculator;
use crate::cli::Context;
use anyhow::{Context as _, Result};

/// Print the version of the working directory's repository.
pub fn version(ctx: &Context) -> Result<()> {
    let calculator = open_calculator(ctx)?;
    let version = calculator
        .version()
        .context("Failed to compute version")?;
    calculator.close();

    println!("{}", version);
    Ok(())
}
