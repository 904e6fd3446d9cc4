//! Path resolution and default download locations.
//!
//! Inside a Colab runtime (detected through `COLAB_RELEASE_TAG`) the default
//! root is `/content`; everywhere else it is the current directory.

use std::env;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::FsError;

/// Environment variable whose presence marks a Colab runtime.
pub const COLAB_ENV_VAR: &str = "COLAB_RELEASE_TAG";

const COLAB_ROOT: &str = "/content";
const COLAB_DRIVE_DIR: &str = "drive/MyDrive";
const LOCAL_DRIVE_DIR: &str = "MyDrive";
const DOWNLOADS_DIR: &str = "Downloads";

/// Absolute current working directory.
///
/// # Errors
///
/// Returns [`FsError`] if the working directory is gone or unreadable.
pub fn current_dir() -> Result<PathBuf, FsError> {
    env::current_dir().map_err(|e| FsError::io(".", e))
}

/// Absolute form of `path` without touching the filesystem.
///
/// Symlinks are not resolved and the path does not need to exist.
///
/// # Errors
///
/// Returns [`FsError`] for an empty path or when the current directory
/// cannot be read.
pub fn absolute_path(path: &Path) -> Result<PathBuf, FsError> {
    std::path::absolute(path).map_err(|e| FsError::io(path, e))
}

/// Returns true when `path` is non-empty and exists.
#[must_use]
pub fn path_exists(path: &Path) -> bool {
    !path.as_os_str().is_empty() && path.exists()
}

/// Default root for relative destinations.
///
/// With `mount_drive` the root moves into the mounted drive folder
/// (`/content/drive/MyDrive` on Colab, `<cwd>/MyDrive` elsewhere).
///
/// # Errors
///
/// Returns [`FsError`] if the current directory is needed and unreadable.
pub fn default_root(mount_drive: bool) -> Result<PathBuf, FsError> {
    if env::var_os(COLAB_ENV_VAR).is_some() {
        return Ok(root_under(Path::new(COLAB_ROOT), true, mount_drive));
    }
    Ok(root_under(&current_dir()?, false, mount_drive))
}

fn root_under(base: &Path, colab: bool, mount_drive: bool) -> PathBuf {
    match (mount_drive, colab) {
        (false, _) => base.to_path_buf(),
        (true, true) => base.join(COLAB_DRIVE_DIR),
        (true, false) => base.join(LOCAL_DRIVE_DIR),
    }
}

/// Resolves the downloads directory for `input`.
///
/// - no input: `<default_root>/Downloads`
/// - input already under the default root: used as given
/// - anything else: joined onto the default root (absolute inputs replace it)
///
/// # Errors
///
/// Returns [`FsError`] when the default root cannot be determined.
pub fn downloads_path(input: Option<&Path>, mount_drive: bool) -> Result<PathBuf, FsError> {
    let root = default_root(mount_drive)?;
    Ok(resolve_downloads(&root, input))
}

fn resolve_downloads(root: &Path, input: Option<&Path>) -> PathBuf {
    match input.filter(|p| !p.as_os_str().is_empty()) {
        None => root.join(DOWNLOADS_DIR),
        Some(path) if path.starts_with(root) => path.to_path_buf(),
        Some(path) => root.join(path),
    }
}

/// Creates `path` and its parents, returning its absolute form.
///
/// An existing directory is not an error.
///
/// # Errors
///
/// - [`FsError::NotADirectory`] if `path` exists as a file
/// - [`FsError::Io`] if creation fails
pub fn create_dir(path: &Path) -> Result<PathBuf, FsError> {
    if path.exists() && !path.is_dir() {
        return Err(FsError::not_a_directory(path));
    }
    std::fs::create_dir_all(path).map_err(|e| FsError::io(path, e))?;
    absolute_path(path)
}

/// Creates the downloads directory for `input`.
///
/// Falls back to the default root when the requested directory cannot be
/// created.
///
/// # Errors
///
/// Returns [`FsError`] only if the default root itself is unusable.
pub fn create_downloads_dir(input: Option<&Path>, mount_drive: bool) -> Result<PathBuf, FsError> {
    let target = downloads_path(input, mount_drive)?;
    match create_dir(&target) {
        Ok(path) => {
            debug!(path = %path.display(), "downloads directory ready");
            Ok(path)
        }
        Err(e) => {
            warn!(
                path = %target.display(),
                error = %e,
                "cannot create downloads directory, falling back to default root"
            );
            create_dir(&default_root(mount_drive)?)
        }
    }
}
