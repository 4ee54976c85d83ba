//! File system watching for Tidywatch
//!
//! This crate provides:
//! - Per-path debouncing (1s quiet period by default, configurable)
//! - Immediate delivery of deletions
//! - Content-type resolution for settled files
//! - Ignore filtering for editor and download temp files
//! - Dispatch of settled files to the rule engine

pub mod config;
pub mod content_type;
pub mod debounce;
pub mod dispatch;
pub mod ignore;
pub mod session;

use std::fmt;
use std::path::PathBuf;

pub use config::WatchConfig;
pub use content_type::{ContentTypeResolver, GuessingResolver};
pub use debounce::{Coalescer, SettleHandler};
pub use dispatch::RuleDispatcher;
pub use self::ignore::IgnoreFilter;
pub use session::WatchSession;

/// Raw notification from the file system
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    /// Path that changed
    pub path: PathBuf,
    /// Type of change
    pub kind: EventKind,
    /// Whether the path is a directory
    pub is_directory: bool,
}

impl RawEvent {
    pub fn file(path: impl Into<PathBuf>, kind: EventKind) -> Self {
        Self {
            path: path.into(),
            kind,
            is_directory: false,
        }
    }

    pub fn directory(path: impl Into<PathBuf>, kind: EventKind) -> Self {
        Self {
            path: path.into(),
            kind,
            is_directory: true,
        }
    }
}

/// Debounced notification for a path that stopped changing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettleEvent {
    pub path: PathBuf,
    /// Kind of the last raw event seen for the path
    pub kind: EventKind,
    /// Resolved content type; absent for deletions
    pub content_type: Option<String>,
}

/// Type of file system event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// File created
    Created,
    /// File modified
    Modified,
    /// File deleted
    Deleted,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventKind::Created => "created",
            EventKind::Modified => "modified",
            EventKind::Deleted => "deleted",
        };
        f.write_str(name)
    }
}
