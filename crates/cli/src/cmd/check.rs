//! Validate the config and list rules

use crate::system_config;
use anyhow::Result;
use owo_colors::OwoColorize;
use rules::{Action, Condition};
use std::path::Path;

pub async fn run(config_path: Option<&Path>) -> Result<()> {
    let config = system_config::load(config_path)?;
    let engine = config.rule_engine()?;

    println!("{}", "Configuration OK".green().bold());

    println!("\n{}", "[watch]".yellow());
    println!(
        "  {} = {} {}",
        "quiet_period_ms".cyan(),
        config.watch.quiet_period_ms,
        format!("({:?})", config.watch.quiet_period()).dimmed()
    );
    println!(
        "  {} = {}",
        "use_builtin_ignores".cyan(),
        config.watch.use_builtin_ignores
    );
    if config.watch.paths.is_empty() {
        println!("  {} = {}", "paths".cyan(), "(none)".dimmed());
    }
    for path in &config.watch.paths {
        println!("  {} {}", "path".cyan(), path.display());
    }
    for pattern in &config.watch.ignore {
        println!("  {} {}", "ignore".cyan(), pattern);
    }

    println!("\n{}", "Rules (first match wins):".bold());
    if engine.rules().is_empty() {
        println!("  {}", "(none)".dimmed());
    }
    for (index, rule) in engine.rules().iter().enumerate() {
        println!("  {}. {}", index + 1, rule.name.cyan());
        if rule.conditions.is_empty() {
            println!("     if {}", "any file".dimmed());
        }
        for condition in &rule.conditions {
            println!("     if {}", describe_condition(condition));
        }
        println!("     then {}", describe_action(&rule.action));
    }

    Ok(())
}

fn describe_condition(condition: &Condition) -> String {
    match condition {
        Condition::MimeType(mime) => format!("content type is {:?}", mime),
        Condition::PathContains(needle) => format!("path contains {:?}", needle),
    }
}

fn describe_action(action: &Action) -> String {
    let suffix = |overwrite: bool| if overwrite { " (override)" } else { "" };

    match action {
        Action::Move {
            destination,
            overwrite,
        } => format!("move into {}{}", destination.display(), suffix(*overwrite)),
        Action::Copy {
            destination,
            overwrite,
        } => format!("copy into {}{}", destination.display(), suffix(*overwrite)),
        Action::Delete => "delete".to_string(),
        Action::CreateDirectory { path } => format!("create directory {}", path.display()),
    }
}
