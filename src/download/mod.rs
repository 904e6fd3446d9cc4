//! Streaming file downloads, single and batched.
//!
//! # Features
//!
//! - URL validation with an optional reachability check
//! - Destination names from the caller, Content-Disposition, or the URL
//! - Skip, overwrite or rename when the destination exists
//! - Chunked streaming to disk with per-file progress bars
//! - Timestamped download log shared safely between concurrent downloads
//! - Batches over a bounded worker pool with a live summary line
//!
//! A download never returns an error: every attempt ends in a
//! [`DownloadOutcome`] that is a success, a warning or an error.
//!
//! # Example
//!
//! ```no_run
//! use dsputils::download::{BatchOptions, download_files};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let jobs = [
//!     "https://example.com/report.pdf",
//!     "https://example.com/data, data.csv, tables",
//! ];
//! let summary = download_files(&jobs, None, &BatchOptions::default()).await?;
//! println!("{} -> {}", summary.stats.summary(), summary.root.display());
//! # Ok(())
//! # }
//! ```

mod batch;
mod client;
pub mod constants;
mod error;
mod file;
pub mod filename;
pub mod log;
mod options;
mod outcome;
pub mod progress;

pub use batch::{BatchError, BatchStats, BatchSummary, JobDescriptor, download_files, parse_jobs};
pub use client::{HttpClient, UrlStatus, is_valid_url};
pub use error::DownloadError;
pub use file::{FileDownloader, download_file};
pub use filename::{rename_on_conflict, resolve_filename, sanitize_filename, truncate_filename};
pub use log::{DownloadLog, LogEntry, LogKind};
pub use options::{BatchOptions, DownloadOptions};
pub use outcome::{DownloadOutcome, OutcomeReason};
pub use progress::ProgressDisplay;

// Note: we do NOT define module-local Result aliases.
// Use `Result<T, DownloadError>` explicitly in function signatures.
