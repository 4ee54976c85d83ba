//! Watch directories and apply rules

use crate::system_config;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use watcher::{RuleDispatcher, WatchSession};

pub async fn run(config_path: Option<&Path>, paths: Vec<PathBuf>) -> Result<()> {
    let config = system_config::load(config_path)?;
    let engine = config.rule_engine()?;

    let roots = if paths.is_empty() {
        config.watch.paths.clone()
    } else {
        paths
    };

    if roots.is_empty() {
        anyhow::bail!(
            "No directories to watch. Pass them as arguments or add [watch] paths to the config."
        );
    }

    if engine.rules().is_empty() {
        warn!("No rules configured; file changes will only be logged");
    } else {
        info!("Loaded {} rule(s)", engine.rules().len());
    }

    let dispatcher = RuleDispatcher::new(engine);
    let session = WatchSession::start(&roots, &config.watch, Arc::new(dispatcher))?;
    info!(
        "Watching {} director(ies), quiet period {:?}; press Ctrl-C to stop",
        session.roots().len(),
        session.coalescer().quiet_period()
    );

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;

    session.stop();
    Ok(())
}
