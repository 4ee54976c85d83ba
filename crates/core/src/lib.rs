//! Core file actions for Tidywatch
//!
//! This crate provides:
//! - The `ActionResult` record produced by every file action
//! - Action executors (create directory, delete, move, copy)
//! - Success / Fail / Error classification of outcomes

pub mod actions;
pub mod result;

// Re-exports
pub use actions::{copy_file, create_directory, delete_file, move_file};
pub use result::{ActionResult, ActionStatus, ActionType};
