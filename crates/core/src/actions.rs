//! File action executors
//!
//! Every executor reports its outcome through an [`ActionResult`]. Nothing
//! here returns `Err` or panics: missing files, permission problems and
//! policy refusals all end up in the result's status and message.

use crate::result::{ActionResult, ActionStatus, ActionType};
use filetime::FileTime;
use std::fs::{self, File};
use std::io::{self, ErrorKind};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

/// Create a directory and any missing parents
///
/// Idempotent: an existing directory is reported as `Success` without
/// touching the file system.
pub fn create_directory(path: &Path) -> ActionResult {
    let report = |status: ActionStatus, message: String| {
        ActionResult::new(ActionType::Create, status, None, path, message)
    };

    match fs::metadata(path) {
        Ok(meta) if meta.is_dir() => {
            return report(
                ActionStatus::Success,
                format!("{} already exists.", path.display()),
            );
        }
        Ok(_) => {
            return report(
                ActionStatus::Error,
                format!("{} exists and is not a directory.", path.display()),
            );
        }
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => {
            return report(
                ActionStatus::Error,
                classify(&err, "create", path, &path.display().to_string()),
            );
        }
    }

    match fs::create_dir_all(path) {
        Ok(()) => {
            debug!("Created directory {}", path.display());
            report(
                ActionStatus::Success,
                format!("{} was created.", path.display()),
            )
        }
        Err(err) => report(
            ActionStatus::Error,
            classify(&err, "create", path, &path.display().to_string()),
        ),
    }
}

/// Remove a single file
///
/// Directories are refused, never removed recursively.
pub fn delete_file(path: &Path) -> ActionResult {
    let report = |status: ActionStatus, message: String| {
        ActionResult::new(ActionType::Delete, status, None, path, message)
    };
    let subject = path.display().to_string();

    let meta = match fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(err) => return report(ActionStatus::Error, classify(&err, "delete", path, &subject)),
    };

    if meta.is_dir() {
        return report(
            ActionStatus::Error,
            format!("{subject} is a directory and will not be deleted."),
        );
    }

    match fs::remove_file(path) {
        Ok(()) => report(ActionStatus::Success, format!("{subject} was deleted.")),
        Err(err) => report(ActionStatus::Error, classify(&err, "delete", path, &subject)),
    }
}

/// Move `src` to `dest`
///
/// Uses an atomic rename when both paths are on the same volume and falls
/// back to copy + delete when the rename crosses devices. An existing
/// destination is only replaced when `overwrite` is set; otherwise the move
/// is refused with `Fail` and neither file is touched.
pub fn move_file(src: &Path, dest: &Path, overwrite: bool) -> ActionResult {
    move_file_with(src, dest, overwrite, |from, to| fs::rename(from, to))
}

/// Move with an injectable rename primitive
fn move_file_with<R>(src: &Path, dest: &Path, overwrite: bool, rename: R) -> ActionResult
where
    R: Fn(&Path, &Path) -> io::Result<()>,
{
    let report = |status: ActionStatus, message: String| {
        ActionResult::new(ActionType::Move, status, Some(src), dest, message)
    };
    let subject = format!("{} -> {}", src.display(), dest.display());

    match fs::metadata(src) {
        Ok(meta) if meta.is_dir() => {
            return report(
                ActionStatus::Error,
                format!("{} is a directory; only files are moved.", src.display()),
            );
        }
        Ok(_) => {}
        Err(err) => return report(ActionStatus::Error, classify(&err, "move", src, &subject)),
    }

    if let Err(refused) = prepare_destination(ActionType::Move, src, dest, overwrite) {
        return refused;
    }

    match rename(src, dest) {
        Ok(()) => report(ActionStatus::Success, subject),
        Err(err) if err.kind() == ErrorKind::CrossesDevices => {
            debug!("Rename crosses devices, copying instead: {}", subject);

            match stage_copy(src, dest, overwrite) {
                Ok(()) => {}
                Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                    return report(
                        ActionStatus::Fail,
                        format!("{} already exists.", dest.display()),
                    );
                }
                Err(err) => {
                    return report(ActionStatus::Error, classify(&err, "move", src, &subject));
                }
            }

            match fs::remove_file(src) {
                Ok(()) => report(ActionStatus::Success, subject),
                Err(err) => report(
                    ActionStatus::Error,
                    format!("Copied {subject} but could not remove the source: {err}"),
                ),
            }
        }
        Err(err) => report(ActionStatus::Error, classify(&err, "move", src, &subject)),
    }
}

/// Copy `src` to `dest`, preserving permissions and timestamps
///
/// Same destination policy as [`move_file`]. The copy is staged next to the
/// destination and renamed into place, so `dest` never holds a partial file.
pub fn copy_file(src: &Path, dest: &Path, overwrite: bool) -> ActionResult {
    let report = |status: ActionStatus, message: String| {
        ActionResult::new(ActionType::Copy, status, Some(src), dest, message)
    };
    let subject = format!("{} -> {}", src.display(), dest.display());

    match fs::metadata(src) {
        Ok(meta) if meta.is_dir() => {
            return report(
                ActionStatus::Error,
                format!("{} is a directory; only files are copied.", src.display()),
            );
        }
        Ok(_) => {}
        Err(err) => return report(ActionStatus::Error, classify(&err, "copy", src, &subject)),
    }

    if let Err(refused) = prepare_destination(ActionType::Copy, src, dest, overwrite) {
        return refused;
    }

    match stage_copy(src, dest, overwrite) {
        Ok(()) => report(ActionStatus::Success, subject),
        Err(err) if err.kind() == ErrorKind::AlreadyExists => report(
            ActionStatus::Fail,
            format!("{} already exists.", dest.display()),
        ),
        Err(err) => report(ActionStatus::Error, classify(&err, "copy", src, &subject)),
    }
}

/// Destination policy shared by move and copy
///
/// Ensures the parent directory exists and applies the overwrite rule.
/// Existence alone decides the refusal; the destination is never read.
fn prepare_destination(
    action: ActionType,
    src: &Path,
    dest: &Path,
    overwrite: bool,
) -> Result<(), ActionResult> {
    let refuse = |status: ActionStatus, message: String| {
        ActionResult::new(action, status, Some(src), dest, message)
    };

    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        let created = create_directory(parent);
        if !created.is_success() {
            return Err(refuse(ActionStatus::Error, created.message));
        }
    }

    let existing = match fs::symlink_metadata(dest) {
        Ok(meta) => meta,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(()),
        Err(err) => {
            return Err(refuse(
                ActionStatus::Error,
                classify(&err, "inspect", dest, &dest.display().to_string()),
            ));
        }
    };

    if is_same_file(src, dest) {
        return Err(refuse(
            ActionStatus::Fail,
            format!("{} and {} are the same file.", src.display(), dest.display()),
        ));
    }

    if !overwrite {
        return Err(refuse(
            ActionStatus::Fail,
            format!("{} already exists.", dest.display()),
        ));
    }

    if existing.is_dir() {
        return Err(refuse(
            ActionStatus::Error,
            format!("{} is a directory and cannot be replaced.", dest.display()),
        ));
    }

    fs::remove_file(dest).map_err(|err| {
        refuse(
            ActionStatus::Error,
            classify(&err, "replace", dest, &dest.display().to_string()),
        )
    })?;
    debug!("Removed existing destination {}", dest.display());

    Ok(())
}

/// Copy file content into a temp file beside `dest`, then rename it into place
///
/// With `overwrite` off the final rename refuses to clobber, surfacing a
/// concurrently created destination as `AlreadyExists`.
fn stage_copy(src: &Path, dest: &Path, overwrite: bool) -> io::Result<()> {
    let parent = dest
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let metadata = fs::metadata(src)?;
    let mut reader = File::open(src)?;
    let mut staged = NamedTempFile::new_in(parent)?;

    io::copy(&mut reader, staged.as_file_mut())?;
    staged.as_file().sync_all()?;

    filetime::set_file_times(
        staged.path(),
        FileTime::from_last_access_time(&metadata),
        FileTime::from_last_modification_time(&metadata),
    )?;
    fs::set_permissions(staged.path(), metadata.permissions())?;

    let persisted = if overwrite {
        staged.persist(dest)
    } else {
        staged.persist_noclobber(dest)
    };
    persisted.map(|_| ()).map_err(|err| err.error)
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Message for an I/O failure: not found, permission, or generic
fn classify(err: &io::Error, verb: &str, missing: &Path, subject: &str) -> String {
    match err.kind() {
        ErrorKind::NotFound => format!("{} was not found.", missing.display()),
        ErrorKind::PermissionDenied => format!("No permission to {verb} {subject}."),
        _ => format!("Something went wrong while trying to {verb} {subject}: {err}"),
    }
}
