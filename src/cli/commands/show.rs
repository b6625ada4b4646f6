//! show command - Print every metadata value

use super::open_calculator;
use crate::cli::Context;
use anyhow::{Context as _, Result};

/// Print the whole metadata bundle as `KEY=value` lines or JSON.
pub fn show(ctx: &Context, json: bool) -> Result<()> {
    let calculator = open_calculator(ctx)?;
    let metadata = calculator
        .metadata()
        .context("Failed to compute version")?;
    calculator.close();

    if json {
        let out = serde_json::to_string_pretty(&metadata)
            .context("Failed to serialize metadata")?;
        println!("{}", out);
    } else {
        for (key, value) in metadata.iter() {
            println!("{}={}", key, value);
        }
    }

    Ok(())
}
