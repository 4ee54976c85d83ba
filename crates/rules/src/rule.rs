//! Rule definitions and load-time validation
//!
//! Rule files are deserialized into the loose `*Definition` types, then
//! validated once into [`Rule`]s. Evaluation only ever sees validated rules,
//! so an unknown condition key or action type can never surface mid-run.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tidy_core::{copy_file, create_directory, delete_file, move_file, ActionResult};

/// A rule as written in a rule file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleDefinition {
    /// Display name used in logs
    #[serde(alias = "rule_name")]
    pub name: String,

    /// Condition key -> expected value, all must hold
    #[serde(default)]
    pub conditions: BTreeMap<String, String>,

    /// What to do on match
    pub action: ActionDefinition,
}

/// An action as written in a rule file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActionDefinition {
    /// `Move`, `Copy`, `Delete` or `Create`
    #[serde(rename = "type")]
    pub action_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_path: Option<PathBuf>,

    /// Replace an existing destination (Move/Copy only)
    #[serde(default, rename = "override", skip_serializing_if = "Option::is_none")]
    pub overwrite: Option<bool>,
}

/// A single validated condition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// Exact match against the resolved content type
    MimeType(String),
    /// Substring match against the path
    PathContains(String),
}

impl Condition {
    fn parse(rule: &str, key: &str, value: &str) -> Result<Self, ConfigError> {
        match key {
            "MimeType" => Ok(Condition::MimeType(value.to_string())),
            "PathContains" => Ok(Condition::PathContains(value.to_string())),
            _ => Err(ConfigError::UnknownCondition {
                rule: rule.to_string(),
                key: key.to_string(),
            }),
        }
    }

    pub fn matches(&self, path: &Path, content_type: &str) -> bool {
        match self {
            Condition::MimeType(expected) => content_type == expected,
            Condition::PathContains(needle) => path.to_string_lossy().contains(needle.as_str()),
        }
    }
}

/// A validated action, carrying exactly the parameters it needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Move the matched file into `destination`
    Move { destination: PathBuf, overwrite: bool },
    /// Copy the matched file into `destination`
    Copy { destination: PathBuf, overwrite: bool },
    /// Delete the matched file
    Delete,
    /// Ensure `path` exists as a directory
    CreateDirectory { path: PathBuf },
}

impl Action {
    fn parse(rule: &str, def: &ActionDefinition) -> Result<Self, ConfigError> {
        let kind: &'static str = match def.action_type.as_str() {
            "Move" => "Move",
            "Copy" => "Copy",
            "Delete" => "Delete",
            "Create" | "Create directory" => "Create",
            other => {
                return Err(ConfigError::UnknownAction {
                    rule: rule.to_string(),
                    action: other.to_string(),
                });
            }
        };

        let destination = || {
            def.destination_path
                .clone()
                .ok_or_else(|| ConfigError::MissingParameter {
                    rule: rule.to_string(),
                    action: kind,
                    parameter: "destination_path",
                })
        };
        let reject = |parameter: &'static str| ConfigError::UnexpectedParameter {
            rule: rule.to_string(),
            action: kind,
            parameter,
        };

        match kind {
            "Move" => Ok(Action::Move {
                destination: destination()?,
                overwrite: def.overwrite.unwrap_or(false),
            }),
            "Copy" => Ok(Action::Copy {
                destination: destination()?,
                overwrite: def.overwrite.unwrap_or(false),
            }),
            "Delete" => {
                if def.destination_path.is_some() {
                    return Err(reject("destination_path"));
                }
                if def.overwrite.is_some() {
                    return Err(reject("override"));
                }
                Ok(Action::Delete)
            }
            _ => {
                if def.overwrite.is_some() {
                    return Err(reject("override"));
                }
                Ok(Action::CreateDirectory {
                    path: destination()?,
                })
            }
        }
    }

    /// Run the action with `source` as the triggering file
    pub fn execute(&self, source: &Path) -> ActionResult {
        match self {
            Action::Move {
                destination,
                overwrite,
            } => move_file(source, &target_in(destination, source), *overwrite),
            Action::Copy {
                destination,
                overwrite,
            } => copy_file(source, &target_in(destination, source), *overwrite),
            Action::Delete => delete_file(source),
            Action::CreateDirectory { path } => create_directory(path),
        }
    }
}

/// Destination directories receive the file under its own name
fn target_in(destination: &Path, source: &Path) -> PathBuf {
    match source.file_name() {
        Some(name) => destination.join(name),
        None => destination.to_path_buf(),
    }
}

/// A validated rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub name: String,
    pub conditions: Vec<Condition>,
    pub action: Action,
}

impl Rule {
    /// Validate a single definition
    pub fn from_definition(index: usize, def: &RuleDefinition) -> Result<Self, ConfigError> {
        if def.name.trim().is_empty() {
            return Err(ConfigError::EmptyName { index });
        }

        let conditions = def
            .conditions
            .iter()
            .map(|(key, value)| Condition::parse(&def.name, key, value))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            name: def.name.clone(),
            conditions,
            action: Action::parse(&def.name, &def.action)?,
        })
    }

    /// True when every condition holds (a rule without conditions always matches)
    pub fn matches(&self, path: &Path, content_type: &str) -> bool {
        self.conditions
            .iter()
            .all(|condition| condition.matches(path, content_type))
    }
}

/// Ordered, validated rule list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

/// Top-level layout of a standalone rule file
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RuleFile {
    #[serde(default)]
    rules: Vec<RuleDefinition>,
}

impl RuleSet {
    /// Validate definitions in order, stopping at the first bad one
    pub fn from_definitions(definitions: &[RuleDefinition]) -> Result<Self, ConfigError> {
        let rules = definitions
            .iter()
            .enumerate()
            .map(|(index, def)| Rule::from_definition(index, def))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    /// Parse and validate a TOML document made of `[[rules]]` tables
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let file: RuleFile = toml::from_str(text)?;
        Self::from_definitions(&file.rules)
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
