//! Evaluate rules once, without watching

use crate::system_config;
use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};
use tidy_core::ActionStatus;
use tracing::{debug, warn};
use walkdir::WalkDir;
use watcher::{ContentTypeResolver, GuessingResolver, IgnoreFilter};

pub async fn run(
    config_path: Option<&Path>,
    paths: &[PathBuf],
    dry_run: bool,
    json: bool,
) -> Result<()> {
    let config = system_config::load(config_path)?;
    let engine = config.rule_engine()?;

    let roots: Vec<PathBuf> = paths
        .iter()
        .filter_map(|path| path.canonicalize().ok())
        .filter(|path| path.is_dir())
        .collect();
    let filter = IgnoreFilter::new(&roots, &config.watch)?;

    let files = collect_files(paths)?;
    let resolver = GuessingResolver;
    let mut matched = 0usize;
    let mut unsuccessful = 0usize;

    for file in &files {
        if filter.is_ignored(file) {
            debug!("Ignoring {}", file.display());
            continue;
        }

        let content_type = match resolver.resolve(file) {
            Ok(content_type) => content_type,
            Err(err) => {
                warn!("Skipping {}: {}", file.display(), err);
                continue;
            }
        };

        if dry_run {
            match engine.first_match(file, &content_type) {
                Some(rule) => {
                    matched += 1;
                    println!("{} ({}) -> {}", file.display(), content_type, rule.name.cyan());
                }
                None => println!(
                    "{} ({}) -> {}",
                    file.display(),
                    content_type,
                    "no match".dimmed()
                ),
            }
            continue;
        }

        if let Some(result) = engine.evaluate(file, &content_type) {
            matched += 1;
            if result.status != ActionStatus::Success {
                unsuccessful += 1;
            }
            if json {
                println!(
                    "{}",
                    serde_json::to_string(&result).context("Failed to serialize result")?
                );
            } else {
                println!("{}", result);
            }
        }
    }

    if !json {
        println!(
            "{}",
            format!("{} file(s) checked, {} matched", files.len(), matched).dimmed()
        );
        if unsuccessful > 0 {
            println!("{}", format!("{} action(s) did not succeed", unsuccessful).yellow());
        }
    }

    Ok(())
}

/// Expand directories into the regular files below them
///
/// Paths are canonicalized so path conditions see the same absolute paths
/// as the watcher does. Everything is collected before any rule runs.
pub fn collect_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        let path = path
            .canonicalize()
            .with_context(|| format!("Cannot read {}", path.display()))?;

        if !path.is_dir() {
            files.push(path);
            continue;
        }

        for entry in WalkDir::new(&path).follow_links(false).sort_by_file_name() {
            let entry = entry.with_context(|| format!("Failed to walk {}", path.display()))?;
            if entry.file_type().is_file() {
                files.push(entry.into_path());
            }
        }
    }

    Ok(files)
}
