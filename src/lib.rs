//! dsputils Library
//!
//! Small file utilities and a concurrent batch file downloader.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`download`] - URL validation, single-file and batch downloads, download log
//! - [`paths`] - Path resolution and default download directories
//! - [`dirs`] - Listing, deleting, moving, copying and renaming
//! - [`compress`] - Zip and tar archives
//! - [`files`] - Text file reading and appending
//! - [`size`] - Human-readable sizes and on-disk size computation
//! - [`error`] - Filesystem error type shared by the helpers

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod compress;
pub mod dirs;
pub mod download;
pub mod error;
pub mod files;
pub mod paths;
pub mod size;

// Re-export commonly used types
pub use download::{
    BatchError, BatchOptions, BatchStats, BatchSummary, DownloadError, DownloadOptions,
    DownloadOutcome, FileDownloader, JobDescriptor, OutcomeReason, download_file, download_files,
    is_valid_url, sanitize_filename,
};
pub use compress::{ArchiveError, ArchiveFormat, CompressOptions, compress, uncompress};
pub use dirs::{copy_path, delete_empty_dirs, delete_path, move_path, move_paths, rename_path, select_content};
pub use error::FsError;
pub use files::{FileContent, ReadMode, WriteMode, read_file, write_file};
pub use size::{SizeUnit, natural_size};
