//! Rule configuration errors

use thiserror::Error;

/// Errors detected while loading rules
///
/// All of these abort loading; none are reported per event.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("rule #{index} has an empty name")]
    EmptyName { index: usize },

    #[error("rule '{rule}': unknown condition key '{key}' (expected MimeType or PathContains)")]
    UnknownCondition { rule: String, key: String },

    #[error("rule '{rule}': unknown action type '{action}' (expected Move, Copy, Delete or Create)")]
    UnknownAction { rule: String, action: String },

    #[error("rule '{rule}': {action} requires '{parameter}'")]
    MissingParameter {
        rule: String,
        action: &'static str,
        parameter: &'static str,
    },

    #[error("rule '{rule}': {action} does not accept '{parameter}'")]
    UnexpectedParameter {
        rule: String,
        action: &'static str,
        parameter: &'static str,
    },

    #[error("invalid rule file: {0}")]
    Parse(#[from] toml::de::Error),
}
