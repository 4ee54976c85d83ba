//! Tidywatch CLI - tidywatch command

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;

mod cmd;
mod system_config;

/// Tidywatch - apply file rules to directories as files settle
#[derive(Parser)]
#[command(name = "tidywatch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (default: <config dir>/tidywatch/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch directories and apply rules until Ctrl-C
    Watch {
        /// Directories to watch (default: [watch] paths from the config)
        paths: Vec<PathBuf>,
    },
    /// Validate the config and list rules
    Check,
    /// Evaluate rules once against files or directory trees
    Apply {
        /// Files or directories
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Only show which rule would match
        #[arg(long)]
        dry_run: bool,
        /// Print results as JSON lines
        #[arg(long)]
        json: bool,
    },
    /// Manage the config file
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the default config file path
    Path {
        /// Create the file from the example if missing
        #[arg(long)]
        create: bool,
    },
    /// Print an example configuration
    Example,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt().with_max_level(level).init();

    let config = cli.config.as_deref();

    match cli.command {
        Commands::Watch { paths } => cmd::watch::run(config, paths).await,
        Commands::Check => cmd::check::run(config).await,
        Commands::Apply {
            paths,
            dry_run,
            json,
        } => cmd::apply::run(config, &paths, dry_run, json).await,
        Commands::Config(config_cmd) => match config_cmd {
            ConfigCommands::Path { create } => cmd::config::run_path(create).await,
            ConfigCommands::Example => cmd::config::run_example().await,
        },
    }
}
