//! Ignore filtering for watched paths
//!
//! Supports two sources of ignore patterns:
//! 1. Built-in patterns (editor swap files, partial downloads, OS metadata)
//! 2. Config-based gitignore-style patterns, anchored at each watched root
//!
//! Ignored paths never reach the coalescer, so rules are not applied to
//! files that are still being written by another program.

use crate::config::WatchConfig;
use anyhow::{Context, Result};
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::path::{Path, PathBuf};

/// Path filter applied before debouncing
pub struct IgnoreFilter {
    /// Per-root matchers for configured patterns
    matchers: Vec<(PathBuf, Gitignore)>,

    /// Whether built-in patterns apply
    use_builtin: bool,
}

impl IgnoreFilter {
    /// Compile configured patterns for every watched root
    pub fn new(roots: &[PathBuf], config: &WatchConfig) -> Result<Self> {
        let mut matchers = Vec::new();

        if !config.ignore.is_empty() {
            for root in roots {
                let mut builder = GitignoreBuilder::new(root);
                for pattern in &config.ignore {
                    builder
                        .add_line(None, pattern)
                        .with_context(|| format!("Invalid ignore pattern: {}", pattern))?;
                }
                let matcher = builder.build().with_context(|| {
                    format!("Failed to build ignore rules for {}", root.display())
                })?;
                matchers.push((root.clone(), matcher));
            }
        }

        Ok(Self {
            matchers,
            use_builtin: config.use_builtin_ignores,
        })
    }

    /// Check if path should be ignored
    pub fn is_ignored(&self, path: &Path) -> bool {
        if self.use_builtin && is_transient_file(path) {
            return true;
        }

        self.matchers
            .iter()
            .filter(|(root, _)| path.starts_with(root))
            .any(|(_, matcher)| {
                matcher
                    .matched_path_or_any_parents(path, false)
                    .is_ignore()
            })
    }

    /// Number of roots with configured patterns
    pub fn pattern_roots(&self) -> usize {
        self.matchers.len()
    }
}

/// Files that editors, downloaders and the OS write transiently
///
/// Covers: Vim, Emacs, browser partial downloads, MacOS/Windows metadata,
/// and staging files created by our own copy action (`.tmpXXXXXX`).
fn is_transient_file(path: &Path) -> bool {
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");

    if filename.is_empty() {
        return false;
    }

    // Vim swap files
    if filename.ends_with(".swp")
        || filename.ends_with(".swo")
        || filename.ends_with(".swx")
        || filename.ends_with(".swn")
    {
        return true;
    }

    // Backups (~), Emacs auto-save (#*#) and lock files (.#*)
    if filename.ends_with('~')
        || (filename.len() > 1 && filename.starts_with('#') && filename.ends_with('#'))
        || filename.starts_with(".#")
    {
        return true;
    }

    // Partial downloads
    if filename.ends_with(".part")
        || filename.ends_with(".crdownload")
        || filename.ends_with(".download")
        || filename.ends_with(".tmp")
        || filename.starts_with(".tmp")
    {
        return true;
    }

    // OS metadata
    filename == ".DS_Store"
        || filename.starts_with("._")
        || filename == "Thumbs.db"
        || filename == "desktop.ini"
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(patterns: &[&str]) -> WatchConfig {
        WatchConfig {
            ignore: patterns.iter().map(|p| p.to_string()).collect(),
            ..WatchConfig::default()
        }
    }

    #[test]
    fn test_builtin_patterns() {
        let filter = IgnoreFilter::new(&[], &WatchConfig::default()).unwrap();

        assert!(filter.is_ignored(Path::new("/w/.notes.txt.swp")));
        assert!(filter.is_ignored(Path::new("/w/draft.txt~")));
        assert!(filter.is_ignored(Path::new("/w/#draft.txt#")));
        assert!(filter.is_ignored(Path::new("/w/.#draft.txt")));
        assert!(filter.is_ignored(Path::new("/w/movie.mkv.part")));
        assert!(filter.is_ignored(Path::new("/w/setup.exe.crdownload")));
        assert!(filter.is_ignored(Path::new("/w/.DS_Store")));
        assert!(filter.is_ignored(Path::new("/w/.tmpA1b2C3")));

        assert!(!filter.is_ignored(Path::new("/w/report.pdf")));
        assert!(!filter.is_ignored(Path::new("/w/#hashtag.txt")));
    }

    #[test]
    fn test_builtin_patterns_can_be_disabled() {
        let config = WatchConfig {
            use_builtin_ignores: false,
            ..WatchConfig::default()
        };
        let filter = IgnoreFilter::new(&[], &config).unwrap();

        assert!(!filter.is_ignored(Path::new("/w/movie.mkv.part")));
    }

    #[test]
    fn test_configured_patterns_per_root() {
        let roots = vec![PathBuf::from("/data/downloads"), PathBuf::from("/data/inbox")];
        let filter = IgnoreFilter::new(&roots, &config(&["*.log", "build/"])).unwrap();

        assert_eq!(filter.pattern_roots(), 2);
        assert!(filter.is_ignored(Path::new("/data/downloads/app.log")));
        assert!(filter.is_ignored(Path::new("/data/inbox/nested/app.log")));
        assert!(filter.is_ignored(Path::new("/data/inbox/build/out.bin")));
        assert!(!filter.is_ignored(Path::new("/data/inbox/out.bin")));
        // Outside every root: only built-ins apply
        assert!(!filter.is_ignored(Path::new("/elsewhere/app.log")));
    }

    #[test]
    fn test_invalid_pattern_is_error() {
        let roots = vec![PathBuf::from("/data")];
        assert!(IgnoreFilter::new(&roots, &config(&["[unclosed"])).is_err());
    }
}
