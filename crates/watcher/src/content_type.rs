//! Content-type resolution for settled files

use std::fs::{self, File};
use std::io::{self, ErrorKind, Read};
use std::path::Path;

/// Bytes inspected when a file has no recognizable extension
const SNIFF_LEN: u64 = 8 * 1024;

/// Maps a path to a MIME string
///
/// Failing (e.g. because the file vanished) means "nothing to act on";
/// the coalescer drops the settle attempt.
pub trait ContentTypeResolver: Send + Sync {
    fn resolve(&self, path: &Path) -> io::Result<String>;
}

impl<F> ContentTypeResolver for F
where
    F: Fn(&Path) -> io::Result<String> + Send + Sync,
{
    fn resolve(&self, path: &Path) -> io::Result<String> {
        self(path)
    }
}

/// Extension lookup with a text/binary sniff fallback
#[derive(Debug, Default, Clone, Copy)]
pub struct GuessingResolver;

impl ContentTypeResolver for GuessingResolver {
    fn resolve(&self, path: &Path) -> io::Result<String> {
        let metadata = fs::metadata(path)?;
        if !metadata.is_file() {
            return Err(io::Error::new(
                ErrorKind::InvalidInput,
                format!("{} is not a regular file", path.display()),
            ));
        }

        if let Some(mime) = mime_guess::from_path(path).first() {
            return Ok(mime.essence_str().to_string());
        }

        sniff(path)
    }
}

fn sniff(path: &Path) -> io::Result<String> {
    let mut head = Vec::new();
    File::open(path)?.take(SNIFF_LEN).read_to_end(&mut head)?;

    if head.is_empty() {
        return Ok("inode/x-empty".to_string());
    }

    // A multi-byte character cut off at the sniff boundary still counts as text
    let utf8 = match std::str::from_utf8(&head) {
        Ok(_) => true,
        Err(err) => err.error_len().is_none(),
    };

    if utf8 && !head.contains(&0) {
        Ok("text/plain".to_string())
    } else {
        Ok("application/octet-stream".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_by_extension() {
        let temp_dir = TempDir::new().unwrap();
        let pdf = temp_dir.path().join("report.pdf");
        let txt = temp_dir.path().join("notes.txt");
        fs::write(&pdf, b"%PDF-1.4").unwrap();
        fs::write(&txt, b"hello").unwrap();

        assert_eq!(GuessingResolver.resolve(&pdf).unwrap(), "application/pdf");
        assert_eq!(GuessingResolver.resolve(&txt).unwrap(), "text/plain");
    }

    #[test]
    fn test_sniff_without_extension() {
        let temp_dir = TempDir::new().unwrap();
        let text = temp_dir.path().join("README");
        let binary = temp_dir.path().join("blob");
        let empty = temp_dir.path().join("empty");
        fs::write(&text, "plain words\n").unwrap();
        fs::write(&binary, [0u8, 159, 146, 150]).unwrap();
        fs::write(&empty, b"").unwrap();

        assert_eq!(GuessingResolver.resolve(&text).unwrap(), "text/plain");
        assert_eq!(
            GuessingResolver.resolve(&binary).unwrap(),
            "application/octet-stream"
        );
        assert_eq!(GuessingResolver.resolve(&empty).unwrap(), "inode/x-empty");
    }

    #[test]
    fn test_vanished_path_fails() {
        let temp_dir = TempDir::new().unwrap();
        let gone = temp_dir.path().join("gone.pdf");

        let err = GuessingResolver.resolve(&gone).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_directory_is_not_resolved() {
        let temp_dir = TempDir::new().unwrap();
        assert!(GuessingResolver.resolve(temp_dir.path()).is_err());
    }
}
