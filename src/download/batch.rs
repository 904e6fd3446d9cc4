//! Batch downloads over a bounded worker pool.
//!
//! Jobs are dispatched in submission order; each takes a semaphore permit
//! before its task is spawned. Finished tasks are drained while waiting for
//! permits, so statistics and the summary line follow completion order.
//! Per-file failures only ever show up in [`BatchStats`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, info, instrument, warn};

use super::constants::{MAX_WORKERS, MIN_WORKERS};
use super::file::FileDownloader;
use super::options::BatchOptions;
use super::outcome::DownloadOutcome;
use super::progress::summary_message;
use super::DownloadError;
use crate::error::FsError;
use crate::paths::create_downloads_dir;
use crate::size::natural_size;

/// Maximum number of comma-separated fields in a job descriptor.
const MAX_FIELDS: usize = 3;

/// Errors that abort a whole batch.
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    /// Invalid worker count provided.
    #[error("invalid concurrency value {value}: must be between {MIN_WORKERS} and {MAX_WORKERS}")]
    InvalidConcurrency {
        /// The invalid value that was provided.
        value: usize,
    },

    /// Semaphore was closed unexpectedly.
    #[error("worker pool closed unexpectedly")]
    PoolClosed,

    /// The destination root could not be created.
    #[error("cannot prepare destination root: {source}")]
    Destination {
        #[source]
        source: FsError,
    },

    /// The shared downloader could not be built.
    #[error("cannot start downloader: {source}")]
    Downloader {
        #[source]
        source: DownloadError,
    },
}

/// One parsed `"<url>[, <filename>][, <subfolder>]"` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDescriptor {
    /// URL exactly as given.
    pub url: String,
    /// Caller-supplied file name, if any.
    pub filename: Option<String>,
    /// Destination folder: the root, or the root joined with the subfolder.
    pub folder: PathBuf,
}

impl JobDescriptor {
    /// Parses a raw descriptor relative to `root`.
    ///
    /// Returns `None` for an empty URL field or more than three fields.
    #[must_use]
    pub fn parse(raw: &str, root: &Path) -> Option<Self> {
        let fields: Vec<&str> = raw.split(',').collect();
        if fields.len() > MAX_FIELDS {
            return None;
        }

        let url = fields.first().filter(|url| !url.is_empty())?;
        let optional = |index: usize| {
            fields
                .get(index)
                .map(|field| field.trim())
                .filter(|field| !field.is_empty())
        };

        Some(Self {
            url: (*url).to_string(),
            filename: optional(1).map(ToString::to_string),
            folder: optional(2).map_or_else(|| root.to_path_buf(), |sub| root.join(sub)),
        })
    }
}

/// Parses every descriptor in `raw`, dropping malformed ones.
#[must_use]
pub fn parse_jobs<S: AsRef<str>>(raw: &[S], root: &Path) -> Vec<JobDescriptor> {
    raw.iter()
        .filter_map(|line| {
            let job = JobDescriptor::parse(line.as_ref(), root);
            if job.is_none() {
                warn!(descriptor = line.as_ref(), "skipping malformed job descriptor");
            }
            job
        })
        .collect()
}

/// Running totals for one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub downloaded_count: usize,
    pub downloaded_bytes: u64,
    pub warning_count: usize,
    pub error_count: usize,
}

impl BatchStats {
    /// Counts one finished download.
    pub fn record(&mut self, outcome: &DownloadOutcome) {
        match outcome {
            DownloadOutcome::Success { bytes, .. } => {
                self.downloaded_count += 1;
                self.downloaded_bytes += bytes;
            }
            DownloadOutcome::Warning { .. } => self.warning_count += 1,
            DownloadOutcome::Error { .. } => self.error_count += 1,
        }
    }

    /// Number of downloads counted so far.
    #[must_use]
    pub fn total(&self) -> usize {
        self.downloaded_count + self.warning_count + self.error_count
    }

    /// The one-line summary shown on the batch bar.
    #[must_use]
    pub fn summary(&self) -> String {
        summary_message(
            self.downloaded_count,
            &natural_size(self.downloaded_bytes, None),
            self.warning_count,
            self.error_count,
        )
    }
}

/// What a finished batch returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    /// Absolute destination root.
    pub root: PathBuf,
    pub stats: BatchStats,
}

/// Downloads every job in `raw` under `root` (default: the downloads directory).
///
/// # Errors
///
/// - [`BatchError::InvalidConcurrency`] if `max_workers` is outside 1..=100
/// - [`BatchError::Destination`] if no destination root can be created
/// - [`BatchError::Downloader`] if the HTTP client cannot be built
/// - [`BatchError::PoolClosed`] if the semaphore is closed
///
/// Individual download failures never cause this function to error.
#[instrument(skip(raw, options), fields(jobs = raw.len(), workers = options.max_workers))]
pub async fn download_files<S: AsRef<str>>(
    raw: &[S],
    root: Option<&Path>,
    options: &BatchOptions,
) -> Result<BatchSummary, BatchError> {
    let workers = options.max_workers;
    if !(MIN_WORKERS..=MAX_WORKERS).contains(&workers) {
        return Err(BatchError::InvalidConcurrency { value: workers });
    }

    let root = create_downloads_dir(root, options.download.mount_drive)
        .map_err(|source| BatchError::Destination { source })?;
    let jobs = parse_jobs(raw, &root);
    info!(root = %root.display(), jobs = jobs.len(), "starting batch");

    let downloader = FileDownloader::new(options.download.clone())
        .map_err(|source| BatchError::Downloader { source })?;
    let bar = downloader.progress().batch_bar(jobs.len() as u64);
    let mut stats = BatchStats::default();
    bar.set_message(stats.summary());

    let semaphore = Arc::new(Semaphore::new(workers));
    let mut tasks = JoinSet::new();

    for job in jobs {
        let permit = loop {
            tokio::select! {
                biased;
                Some(done) = tasks.join_next(), if !tasks.is_empty() => {
                    settle(&mut stats, done);
                    bar.inc(1);
                    bar.set_message(stats.summary());
                }
                permit = Arc::clone(&semaphore).acquire_owned() => {
                    break permit.map_err(|_| BatchError::PoolClosed)?;
                }
            }
        };

        debug!(url = %job.url, folder = %job.folder.display(), "dispatching job");
        let downloader = downloader.clone();
        tasks.spawn(async move {
            // Permit is released when the task ends.
            let _permit = permit;
            downloader
                .download(&job.url, job.filename.as_deref(), Some(&job.folder))
                .await
        });
    }

    while let Some(done) = tasks.join_next().await {
        settle(&mut stats, done);
        bar.inc(1);
        bar.set_message(stats.summary());
    }
    bar.finish();

    info!(
        downloaded = stats.downloaded_count,
        bytes = stats.downloaded_bytes,
        warnings = stats.warning_count,
        errors = stats.error_count,
        "batch complete"
    );

    Ok(BatchSummary { root, stats })
}

fn settle(stats: &mut BatchStats, done: Result<DownloadOutcome, JoinError>) {
    match done {
        Ok(outcome) => stats.record(&outcome),
        Err(e) => {
            // A panicked task still counts, so totals always match the job count.
            warn!(error = %e, "download task panicked");
            stats.error_count += 1;
        }
    }
}
