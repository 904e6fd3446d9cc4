//! Listing, deleting, moving, copying and renaming files and directories.
//!
//! Every operation works on absolute paths. Moves, copies and renames place
//! the source inside a destination directory (created when missing) and
//! refuse to replace an existing target unless `overwrite` is set.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::FsError;
use crate::paths::{absolute_path, create_dir};

/// Entries of `path`, sorted by name.
///
/// With `extension` (with or without the leading dot) only matching entries
/// are returned; `"*"` matches everything. `recursive` descends into
/// subdirectories.
///
/// # Errors
///
/// - [`FsError::NotFound`] if `path` does not exist
/// - [`FsError::NotADirectory`] if `path` is not a directory
pub fn select_content(
    path: &Path,
    extension: Option<&str>,
    recursive: bool,
) -> Result<Vec<PathBuf>, FsError> {
    let root = existing_dir(path)?;
    let extension = extension
        .map(|ext| ext.trim_start_matches('.'))
        .filter(|ext| !ext.is_empty() && *ext != "*");

    let walker = WalkDir::new(&root)
        .min_depth(1)
        .max_depth(if recursive { usize::MAX } else { 1 })
        .sort_by_file_name();

    let selected: Vec<PathBuf> = walker
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| match extension {
            Some(ext) => entry.path().extension().is_some_and(|e| e == ext),
            None => true,
        })
        .map(walkdir::DirEntry::into_path)
        .collect();

    if selected.is_empty() {
        warn!(path = %root.display(), extension = extension.unwrap_or("*"), "nothing selected");
    }
    Ok(selected)
}

/// Deletes a file, a symlink, or a directory with all its content.
///
/// # Errors
///
/// - [`FsError::NotFound`] if `path` does not exist
/// - [`FsError::Io`] if removal fails
pub fn delete_path(path: &Path) -> Result<(), FsError> {
    let metadata = fs::symlink_metadata(path).map_err(|e| FsError::io(path, e))?;
    if metadata.is_dir() {
        fs::remove_dir_all(path).map_err(|e| FsError::io(path, e))
    } else {
        fs::remove_file(path).map_err(|e| FsError::io(path, e))
    }
}

/// Removes every empty directory below `path`, deepest first.
///
/// Directories emptied by the removal of their children are removed too;
/// `path` itself is kept. Returns the removed directories.
///
/// # Errors
///
/// - [`FsError::NotFound`] if `path` does not exist
/// - [`FsError::NotADirectory`] if `path` is not a directory
pub fn delete_empty_dirs(path: &Path) -> Result<Vec<PathBuf>, FsError> {
    let root = existing_dir(path)?;
    let mut removed = Vec::new();

    for entry in WalkDir::new(&root)
        .min_depth(1)
        .contents_first(true)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_dir())
    {
        let dir = entry.path();
        let is_empty = fs::read_dir(dir).is_ok_and(|mut content| content.next().is_none());
        if !is_empty {
            continue;
        }
        match fs::remove_dir(dir) {
            Ok(()) => {
                debug!(path = %dir.display(), "removed empty directory");
                removed.push(dir.to_path_buf());
            }
            Err(e) => warn!(path = %dir.display(), error = %e, "cannot remove empty directory"),
        }
    }

    Ok(removed)
}

/// Moves `src` into `dst_dir` (default: its own parent), keeping its name.
///
/// Returns the new absolute path.
///
/// # Errors
///
/// - [`FsError::NotFound`] if `src` does not exist
/// - [`FsError::AlreadyExists`] if the target exists and `overwrite` is off
/// - [`FsError::Io`] if the move fails
pub fn move_path(src: &Path, dst_dir: Option<&Path>, overwrite: bool) -> Result<PathBuf, FsError> {
    let (src, target) = prepare(src, dst_dir, None, overwrite)?;
    relocate(&src, &target)?;
    debug!(from = %src.display(), to = %target.display(), "moved");
    Ok(target)
}

/// Moves every path in `paths` into `dst_dir`.
///
/// Failures are logged and skipped; returns the paths that were moved.
pub fn move_paths<P: AsRef<Path>>(paths: &[P], dst_dir: &Path, overwrite: bool) -> Vec<PathBuf> {
    paths
        .iter()
        .filter_map(|path| {
            move_path(path.as_ref(), Some(dst_dir), overwrite)
                .inspect_err(|e| warn!(path = %path.as_ref().display(), error = %e, "move skipped"))
                .ok()
        })
        .collect()
}

/// Copies `src` into `dst_dir` (default: its own parent), recursively for
/// directories.
///
/// # Errors
///
/// - [`FsError::NotFound`] if `src` does not exist
/// - [`FsError::AlreadyExists`] if the target exists and `overwrite` is off
/// - [`FsError::Io`] if any entry cannot be copied
pub fn copy_path(src: &Path, dst_dir: Option<&Path>, overwrite: bool) -> Result<PathBuf, FsError> {
    let (src, target) = prepare(src, dst_dir, None, overwrite)?;
    if src == target {
        return Ok(target);
    }
    copy_tree(&src, &target)?;
    debug!(from = %src.display(), to = %target.display(), "copied");
    Ok(target)
}

/// Renames `src` to `new_name`, moving it into `dst_dir` when given.
///
/// # Errors
///
/// - [`FsError::InvalidName`] if `new_name` is empty or contains a separator
/// - [`FsError::NotFound`] if `src` does not exist
/// - [`FsError::AlreadyExists`] if the target exists and `overwrite` is off
/// - [`FsError::Io`] if the rename fails
pub fn rename_path(
    src: &Path,
    new_name: &str,
    dst_dir: Option<&Path>,
    overwrite: bool,
) -> Result<PathBuf, FsError> {
    let name = new_name.trim();
    if name.is_empty() || Path::new(name).file_name().is_none_or(|n| n != name) {
        return Err(FsError::invalid_name(new_name));
    }

    let (src, target) = prepare(src, dst_dir, Some(name), overwrite)?;
    relocate(&src, &target)?;
    debug!(from = %src.display(), to = %target.display(), "renamed");
    Ok(target)
}

/// Resolves absolute source and target paths and clears the way for the
/// target.
fn prepare(
    src: &Path,
    dst_dir: Option<&Path>,
    name: Option<&str>,
    overwrite: bool,
) -> Result<(PathBuf, PathBuf), FsError> {
    let src = absolute_path(src)?;
    if fs::symlink_metadata(&src).is_err() {
        return Err(FsError::not_found(&src));
    }
    let Some(src_name) = src.file_name().map(ToOwned::to_owned) else {
        return Err(FsError::invalid_name(src.display().to_string()));
    };

    let dst_dir = match dst_dir {
        Some(dir) => absolute_path(dir)?,
        None => src.parent().map_or_else(|| src.clone(), Path::to_path_buf),
    };
    let target = match name {
        Some(name) => dst_dir.join(name),
        None => dst_dir.join(src_name),
    };

    if target != src && fs::symlink_metadata(&target).is_ok() {
        if !overwrite {
            return Err(FsError::already_exists(&target));
        }
        delete_path(&target)?;
    }
    create_dir(&dst_dir)?;

    Ok((src, target))
}

/// Renames `src` to `target`, falling back to copy and delete when the
/// rename cannot cross filesystems.
fn relocate(src: &Path, target: &Path) -> Result<(), FsError> {
    if src == target {
        return Ok(());
    }
    match fs::rename(src, target) {
        Ok(()) => Ok(()),
        Err(e) => {
            debug!(error = %e, "rename failed, copying instead");
            copy_tree(src, target)?;
            delete_path(src)
        }
    }
}

fn copy_tree(src: &Path, target: &Path) -> Result<(), FsError> {
    if !src.is_dir() {
        fs::copy(src, target).map_err(|e| FsError::io(src, e))?;
        return Ok(());
    }

    for entry in WalkDir::new(src) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(src).to_path_buf();
            FsError::io(path, e.into())
        })?;
        let relative = entry.path().strip_prefix(src).unwrap_or(entry.path());
        let destination = target.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&destination).map_err(|e| FsError::io(&destination, e))?;
        } else {
            fs::copy(entry.path(), &destination).map_err(|e| FsError::io(entry.path(), e))?;
        }
    }
    Ok(())
}

fn existing_dir(path: &Path) -> Result<PathBuf, FsError> {
    let root = absolute_path(path)?;
    let metadata = fs::metadata(&root).map_err(|e| FsError::io(&root, e))?;
    if !metadata.is_dir() {
        return Err(FsError::not_a_directory(&root));
    }
    Ok(root)
}
