//! Structured outcome of a file action

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Kind of file action that produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionType {
    /// Directory creation
    Create,
    /// File removal
    Delete,
    /// File move (rename or copy + delete)
    Move,
    /// File copy
    Copy,
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActionType::Create => "Create",
            ActionType::Delete => "Delete",
            ActionType::Move => "Move",
            ActionType::Copy => "Copy",
        };
        f.write_str(name)
    }
}

/// Outcome classification
///
/// Callers decide whether to retry based on this:
/// - `Success`: the operation completed as requested
/// - `Fail`: a policy refusal (e.g. destination exists and overwrite is off)
/// - `Error`: an unexpected condition (missing source, permissions, I/O)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionStatus {
    Success,
    Fail,
    Error,
}

impl fmt::Display for ActionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActionStatus::Success => "Success",
            ActionStatus::Fail => "Fail",
            ActionStatus::Error => "Error",
        };
        f.write_str(name)
    }
}

/// Record produced by every action executor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResult {
    /// Which action ran
    pub action_type: ActionType,
    /// How it ended
    pub status: ActionStatus,
    /// When the action concluded (UTC, `YYYY-MM-DDTHH:MM:SS.mmmZ`)
    pub timestamp: String,
    /// Source file, for actions that have one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_path: Option<PathBuf>,
    /// Target of the action
    pub destination_path: PathBuf,
    /// Human readable description
    pub message: String,
}

impl ActionResult {
    /// Build a result stamped with the current time
    pub fn new(
        action_type: ActionType,
        status: ActionStatus,
        source_path: Option<&Path>,
        destination_path: &Path,
        message: impl Into<String>,
    ) -> Self {
        Self {
            action_type,
            status,
            timestamp: timestamp_now(),
            source_path: source_path.map(Path::to_path_buf),
            destination_path: destination_path.to_path_buf(),
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ActionStatus::Success
    }
}

impl fmt::Display for ActionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} {}: {}",
            self.timestamp, self.action_type, self.status, self.message
        )
    }
}

/// Current UTC time in the fixed-width, sortable result format
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_is_fixed_width_and_sortable() {
        let first = timestamp_now();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let second = timestamp_now();

        // 2024-01-01T00:00:00.000Z
        assert_eq!(first.len(), 24);
        assert!(first.ends_with('Z'));
        assert!(first < second);
    }

    #[test]
    fn test_source_path_omitted_when_absent() {
        let result = ActionResult::new(
            ActionType::Create,
            ActionStatus::Success,
            None,
            Path::new("/tmp/out"),
            "/tmp/out was created.",
        );

        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("source_path").is_none());
        assert_eq!(json["action_type"], "Create");
        assert_eq!(json["status"], "Success");
    }

    #[test]
    fn test_display_includes_status_and_message() {
        let result = ActionResult::new(
            ActionType::Move,
            ActionStatus::Fail,
            Some(Path::new("a.txt")),
            Path::new("b.txt"),
            "b.txt already exists.",
        );

        let line = result.to_string();
        assert!(line.contains("Move Fail"));
        assert!(line.ends_with("b.txt already exists."));
    }
}
