//! meta command - Print one metadata value

use super::open_calculator;
use crate::cli::Context;
use crate::engine::MetadataKey;
use anyhow::{bail, Context as _, Result};

/// Print one metadata value; fails when it is absent.
pub fn meta(ctx: &Context, key: MetadataKey) -> Result<()> {
    let calculator = open_calculator(ctx)?;
    let value = calculator
        .meta(key)
        .context("Failed to compute version")?;
    calculator.close();

    match value {
        Some(value) => {
            println!("{}", value);
            Ok(())
        }
        None => bail!("{} is not available for the current state", key),
    }
}
