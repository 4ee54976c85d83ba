//! Configuration management command
//!
//! Shows where the config file lives and prints an example.

use crate::system_config;
use anyhow::{Context, Result};
use owo_colors::OwoColorize;

/// Show the config file path and optionally create it
pub async fn run_path(create: bool) -> Result<()> {
    let config_path = system_config::config_file_path()
        .context("Could not determine config file path")?;

    if create {
        let (path, created) = system_config::init_if_missing()?;
        if created {
            println!("{} Created config file at: {}", "✓".green(), path.display());
        } else {
            println!("{}", path.display());
        }
    } else if config_path.exists() {
        println!("{}", config_path.display());
    } else {
        println!("{}", config_path.display());
        println!("{}", "File does not exist. Use --create to create it.".yellow());
    }

    Ok(())
}

/// Show example configuration
pub async fn run_example() -> Result<()> {
    print!("{}", system_config::example_config());
    Ok(())
}
