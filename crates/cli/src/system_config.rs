//! Configuration file loading
//!
//! One TOML file holds both the `[watch]` settings and the ordered
//! `[[rules]]` list. Default location: `<config dir>/tidywatch/config.toml`.

use anyhow::{Context, Result};
use rules::{RuleDefinition, RuleEngine};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use watcher::WatchConfig;

/// Whole configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SystemConfig {
    #[serde(default)]
    pub watch: WatchConfig,

    /// Evaluated in file order, first match wins
    #[serde(default)]
    pub rules: Vec<RuleDefinition>,
}

impl SystemConfig {
    /// Validate the watch settings and rules
    pub fn validate(&self) -> Result<()> {
        self.watch.validate()?;
        self.rule_engine()?;
        Ok(())
    }

    /// Build the rule engine, failing on the first malformed rule
    pub fn rule_engine(&self) -> Result<RuleEngine> {
        RuleEngine::from_definitions(&self.rules).context("Invalid rule configuration")
    }
}

/// Default config file location
pub fn config_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("tidywatch").join("config.toml"))
}

/// Load from `path`, or from the default location when none is given
pub fn load(path: Option<&Path>) -> Result<SystemConfig> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => config_file_path().context("Could not determine config file path")?,
    };

    let text = std::fs::read_to_string(&path).with_context(|| {
        format!(
            "Failed to read config file {} (create one with 'tidywatch config path --create')",
            path.display()
        )
    })?;

    parse(&text).with_context(|| format!("Invalid config file {}", path.display()))
}

/// Parse and validate config text
pub fn parse(text: &str) -> Result<SystemConfig> {
    let config: SystemConfig = toml::from_str(text).context("Failed to parse config")?;
    config.validate()?;
    Ok(config)
}

/// Write the example config to the default location if nothing is there yet
///
/// Returns the path and whether a file was created.
pub fn init_if_missing() -> Result<(PathBuf, bool)> {
    let path = config_file_path().context("Could not determine config file path")?;
    if path.exists() {
        return Ok((path, false));
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(&path, example_config())
        .with_context(|| format!("Failed to write {}", path.display()))?;

    Ok((path, true))
}

/// Example configuration
pub fn example_config() -> &'static str {
    r#"# Tidywatch configuration

[watch]
# Directories watched recursively
paths = ["./data/watch_folder", "./data/downloads"]
# How long a file must stay unchanged before rules run
quiet_period_ms = 1000
# Extra gitignore-style patterns to skip
ignore = []
# Skip editor swap files and partial downloads
use_builtin_ignores = true

# Rules are checked in order; the first match wins.
# Conditions: MimeType (exact), PathContains (substring). All must hold.
# Actions: Move / Copy (destination_path, override), Delete, Create (destination_path)

[[rules]]
name = "Move PDF to Documents"

[rules.conditions]
MimeType = "application/pdf"
PathContains = "/data/downloads"

[rules.action]
type = "Move"
destination_path = "./data/documents"
override = false
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use rules::Action;
    use tempfile::TempDir;

    #[test]
    fn test_example_config_is_valid() {
        let config = parse(example_config()).unwrap();

        assert_eq!(config.watch.paths.len(), 2);
        assert_eq!(config.watch.quiet_period_ms, 1000);

        let engine = config.rule_engine().unwrap();
        assert_eq!(engine.rules().len(), 1);
        assert_eq!(
            engine.rules()[0].action,
            Action::Move {
                destination: PathBuf::from("./data/documents"),
                overwrite: false
            }
        );
    }

    #[test]
    fn test_unknown_condition_fails_load() {
        let text = r#"
            [[rules]]
            name = "Big files"
            [rules.conditions]
            Size = "1000000"
            [rules.action]
            type = "Delete"
        "#;

        let err = parse(text).unwrap_err();
        assert!(format!("{:#}", err).contains("unknown condition key 'Size'"));
    }

    #[test]
    fn test_invalid_quiet_period_fails_load() {
        assert!(parse("[watch]\nquiet_period_ms = 0\n").is_err());
    }

    #[test]
    fn test_load_from_explicit_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("tidywatch.toml");
        std::fs::write(&path, "[watch]\npaths = [\"/srv/inbox\"]\n").unwrap();

        let config = load(Some(&path)).unwrap();
        assert_eq!(config.watch.paths, vec![PathBuf::from("/srv/inbox")]);
        assert!(config.rules.is_empty());
    }

    #[test]
    fn test_load_missing_file_is_error() {
        let temp_dir = TempDir::new().unwrap();
        assert!(load(Some(&temp_dir.path().join("absent.toml"))).is_err());
    }
}
