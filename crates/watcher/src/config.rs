//! Watch configuration

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Longest accepted quiet period (1 hour)
const MAX_QUIET_PERIOD_MS: u64 = 3_600_000;

/// Watch configuration (`[watch]` table)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WatchConfig {
    /// Directories to watch recursively
    #[serde(default)]
    pub paths: Vec<PathBuf>,

    /// Quiet period before a changed file is acted on (default: 1000ms)
    #[serde(default = "default_quiet_period_ms")]
    pub quiet_period_ms: u64,

    /// Additional gitignore-style patterns
    #[serde(default)]
    pub ignore: Vec<String>,

    /// Skip editor swap files, partial downloads, etc. (default: true)
    #[serde(default = "default_true")]
    pub use_builtin_ignores: bool,
}

impl WatchConfig {
    pub fn quiet_period(&self) -> Duration {
        Duration::from_millis(self.quiet_period_ms)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if self.quiet_period_ms == 0 || self.quiet_period_ms > MAX_QUIET_PERIOD_MS {
            anyhow::bail!(
                "quiet_period_ms must be between 1 and {} (got {})",
                MAX_QUIET_PERIOD_MS,
                self.quiet_period_ms
            );
        }
        Ok(())
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            paths: vec![],
            quiet_period_ms: default_quiet_period_ms(),
            ignore: vec![],
            use_builtin_ignores: true,
        }
    }
}

fn default_quiet_period_ms() -> u64 {
    1000
}

fn default_true() -> bool {
    true
}
