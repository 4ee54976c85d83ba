//! First-match-wins rule evaluation

use crate::error::ConfigError;
use crate::rule::{Rule, RuleDefinition, RuleSet};
use std::path::Path;
use std::sync::Arc;
use tidy_core::ActionResult;
use tracing::debug;

/// Evaluates settled files against an ordered rule list
///
/// Cheap to clone; the rule list is shared and never mutated after load.
#[derive(Debug, Clone, Default)]
pub struct RuleEngine {
    rules: Arc<RuleSet>,
}

impl RuleEngine {
    pub fn new(rules: RuleSet) -> Self {
        Self {
            rules: Arc::new(rules),
        }
    }

    /// Validate definitions and build an engine
    pub fn from_definitions(definitions: &[RuleDefinition]) -> Result<Self, ConfigError> {
        Ok(Self::new(RuleSet::from_definitions(definitions)?))
    }

    pub fn rules(&self) -> &[Rule] {
        self.rules.rules()
    }

    /// First rule whose conditions all hold, without running anything
    pub fn first_match(&self, path: &Path, content_type: &str) -> Option<&Rule> {
        self.rules
            .rules()
            .iter()
            .find(|rule| rule.matches(path, content_type))
    }

    /// Apply the first matching rule to `path`
    ///
    /// Returns `None` when no rule matches. Later rules are never consulted
    /// once one has matched, even if the action fails.
    pub fn evaluate(&self, path: &Path, content_type: &str) -> Option<ActionResult> {
        let Some(rule) = self.first_match(path, content_type) else {
            debug!("No rule matched {} ({})", path.display(), content_type);
            return None;
        };

        debug!(
            "Rule '{}' matched {} ({})",
            rule.name,
            path.display(),
            content_type
        );
        Some(rule.action.execute(path))
    }
}
