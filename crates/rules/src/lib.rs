//! Rule model and rule engine for Tidywatch
//!
//! This crate provides:
//! - Serde definitions for rule files (`[[rules]]` TOML tables)
//! - Load-time validation into typed rules (fail fast on bad config)
//! - First-match-wins evaluation and action dispatch

pub mod engine;
pub mod error;
pub mod rule;

// Re-exports
pub use engine::RuleEngine;
pub use error::ConfigError;
pub use rule::{Action, ActionDefinition, Condition, Rule, RuleDefinition, RuleSet};
