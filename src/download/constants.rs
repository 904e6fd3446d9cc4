//! Constants for the download module (timeouts, chunking, naming).

use std::time::Duration;

/// Default network timeout for connect and read (10 seconds).
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Default network timeout as a [`Duration`].
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(DEFAULT_TIMEOUT_SECS);

/// Default size of each write to disk while streaming (8 KiB).
pub const DEFAULT_CHUNK_SIZE: usize = 8 * 1024;

/// Placeholder label for URL segments that carry no extension.
pub const DEFAULT_MISSING_NAME: &str = "missing name";

/// File name used for the download log inside a destination folder.
pub const LOG_FILE_NAME: &str = "logs.txt";

/// Highest numeric suffix probed when renaming on conflict.
pub const MAX_RENAME_ATTEMPTS: usize = 999;

/// Minimum allowed worker pool size.
pub const MIN_WORKERS: usize = 1;

/// Maximum allowed worker pool size.
pub const MAX_WORKERS: usize = 100;

/// Default worker pool size (sequential).
pub const DEFAULT_WORKERS: usize = 1;
