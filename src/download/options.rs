//! Settings shared by single-file and batch downloads.

use std::path::PathBuf;
use std::time::Duration;

use super::constants::{
    DEFAULT_CHUNK_SIZE, DEFAULT_MISSING_NAME, DEFAULT_TIMEOUT, DEFAULT_WORKERS, MAX_RENAME_ATTEMPTS,
};

/// How a single download behaves.
#[derive(Debug, Clone)]
pub struct DownloadOptions {
    /// Replace an existing destination file.
    pub overwrite: bool,
    /// Save under `<stem>_<n><ext>` when the destination exists.
    /// Takes precedence over `overwrite`.
    pub rename: bool,
    /// Highest `<n>` tried when renaming.
    pub max_rename_attempts: usize,
    /// Placeholder label for URL names without an extension.
    pub missing_name: String,
    /// Append events to the download log.
    pub write_logs: bool,
    /// Fixed log file; `None` means `logs.txt` in each destination folder.
    pub log_path: Option<PathBuf>,
    /// Connect and read timeout.
    pub timeout: Duration,
    /// Bytes per write while streaming to disk.
    pub chunk_size: usize,
    /// Draw progress bars.
    pub show_progress: bool,
    /// Draw the graphical bar on per-file lines; counters are shown either way.
    pub show_bar: bool,
    /// Keep finished per-file bars on screen.
    pub leave_progress: bool,
    /// Truncate per-file bar labels to this many characters.
    pub label_len: Option<usize>,
    /// Use the mounted-drive default root when resolving destinations.
    pub mount_drive: bool,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            overwrite: false,
            rename: false,
            max_rename_attempts: MAX_RENAME_ATTEMPTS,
            missing_name: DEFAULT_MISSING_NAME.to_string(),
            write_logs: true,
            log_path: None,
            timeout: DEFAULT_TIMEOUT,
            chunk_size: DEFAULT_CHUNK_SIZE,
            show_progress: true,
            show_bar: true,
            leave_progress: true,
            label_len: None,
            mount_drive: false,
        }
    }
}

/// How a batch of downloads behaves.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Maximum number of downloads running at once.
    pub max_workers: usize,
    /// Settings applied to every download in the batch.
    pub download: DownloadOptions,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            max_workers: DEFAULT_WORKERS,
            download: DownloadOptions::default(),
        }
    }
}
