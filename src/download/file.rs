//! Single-file download: validate, name, check, stream, log.
//!
//! ```text
//! validate_url ─┬─ error ──────────────────────────────► Error(invalid_url)
//!               └─ check_size ─┬─ 0 / absent ───────────► Warning(empty_file)
//!                              └─ check_existing ─┬─ exists, keep ─► Warning(already_exists)
//!                                                 ├─ rename ─┬─ exhausted ─► Error(rename_exhausted)
//!                                                 │          └─ stream_write
//!                                                 └─ stream_write ─┬─ ok ─► Success(path)
//!                                                                  └─ err ─► Error(download_failed)
//! ```
//!
//! Every terminal state is logged and returned as a [`DownloadOutcome`];
//! nothing inside a download escapes as an error.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::fs::File;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::client::{
    HttpClient, UrlStatus, content_disposition, declared_length, stream_to_file,
};
use super::filename::{Claim, OnConflict, claim_destination, resolve_filename};
use super::log::{DownloadLog, LogEntry, LogKind};
use super::options::DownloadOptions;
use super::outcome::{DownloadOutcome, OutcomeReason};
use super::progress::ProgressDisplay;
use super::DownloadError;
use crate::paths::{absolute_path, downloads_path};

/// Downloads single files with shared client, log and progress display.
///
/// Cloning is cheap; clones share the connection pool and the log lock.
#[derive(Debug, Clone)]
pub struct FileDownloader {
    client: HttpClient,
    log: Arc<DownloadLog>,
    progress: ProgressDisplay,
    options: Arc<DownloadOptions>,
}

impl FileDownloader {
    /// Builds a downloader from `options`.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Client`] if the HTTP client cannot be built.
    pub fn new(options: DownloadOptions) -> Result<Self, DownloadError> {
        let client = HttpClient::new(options.timeout)?;
        let log = Arc::new(DownloadLog::new(options.write_logs, options.log_path.clone()));
        let progress = if options.show_progress {
            ProgressDisplay::new()
                .with_bar(options.show_bar)
                .with_leave(options.leave_progress)
                .with_label_len(options.label_len)
        } else {
            ProgressDisplay::hidden()
        };
        Ok(Self {
            client,
            log,
            progress,
            options: Arc::new(options),
        })
    }

    /// Replaces the progress display, e.g. to share one with a batch bar.
    #[must_use]
    pub fn with_progress(mut self, progress: ProgressDisplay) -> Self {
        self.progress = progress;
        self
    }

    #[must_use]
    pub fn options(&self) -> &DownloadOptions {
        &self.options
    }

    #[must_use]
    pub fn progress(&self) -> &ProgressDisplay {
        &self.progress
    }

    /// Downloads `url` into `dest` (default: the downloads directory).
    ///
    /// `filename` overrides the name taken from headers or the URL.
    #[instrument(skip(self, filename, dest), fields(url = %url))]
    pub async fn download(
        &self,
        url: &str,
        filename: Option<&str>,
        dest: Option<&Path>,
    ) -> DownloadOutcome {
        let folder = match self.resolve_folder(dest) {
            Ok(folder) => folder,
            Err(detail) => {
                warn!(error = %detail, "cannot resolve destination folder");
                return self
                    .fail(Path::new(""), url, OutcomeReason::DownloadFailed, None, detail)
                    .await;
            }
        };

        let response = match self.client.validate_url(url, true).await {
            Ok(UrlStatus::Reachable(response)) => response,
            Ok(UrlStatus::Valid) => {
                // validate_url only answers Valid when reachability is not checked.
                return self
                    .fail(&folder, url, OutcomeReason::InvalidUrl, None, String::new())
                    .await;
            }
            Err(e) => {
                debug!(error = %e, "url rejected");
                return self
                    .fail(&folder, url, OutcomeReason::InvalidUrl, None, e.to_string())
                    .await;
            }
        };

        let total_bytes = match declared_length(&response) {
            Some(len) if len > 0 => len,
            _ => {
                warn!("server declared no content");
                self.log
                    .append(&folder, &LogEntry::new(LogKind::EmptyFile, url))
                    .await;
                return DownloadOutcome::warning(OutcomeReason::EmptyFile, url);
            }
        };

        let source_url = Url::parse(url).unwrap_or_else(|_| response.url().clone());
        let name = resolve_filename(
            filename,
            content_disposition(&response),
            &source_url,
            &self.options.missing_name,
        );
        let target = folder.join(&name);

        if let Err(e) = tokio::fs::create_dir_all(&folder).await {
            let detail = DownloadError::io(&folder, e).to_string();
            return self
                .fail(&folder, url, OutcomeReason::DownloadFailed, Some(&target), detail)
                .await;
        }

        let (path, file) = match claim_destination(&target, self.on_conflict()).await {
            Ok(Claim::Created { path, file }) => (path, file),
            Ok(Claim::Exists(path)) => {
                warn!(path = %path.display(), "file already exists");
                self.log
                    .append(
                        &folder,
                        &LogEntry::new(LogKind::ExistsFile, url).with_path(&path),
                    )
                    .await;
                return DownloadOutcome::warning(OutcomeReason::AlreadyExists, url);
            }
            Err(e) => {
                let reason = if matches!(e, DownloadError::RenameExhausted { .. }) {
                    OutcomeReason::RenameExhausted
                } else {
                    OutcomeReason::DownloadFailed
                };
                return self
                    .fail(&folder, url, reason, Some(&target), e.to_string())
                    .await;
            }
        };
        if path != target {
            debug!(path = %path.display(), "renamed to avoid conflict");
        }

        match self.write(response, file, &path, total_bytes, url).await {
            Ok(bytes) => {
                info!(path = %path.display(), bytes, "file downloaded");
                self.log
                    .append(
                        &folder,
                        &LogEntry::new(LogKind::Downloaded, url).with_path(&path),
                    )
                    .await;
                DownloadOutcome::Success { path, bytes }
            }
            Err(e) => {
                self.fail(
                    &folder,
                    url,
                    OutcomeReason::DownloadFailed,
                    Some(&path),
                    e.to_string(),
                )
                .await
            }
        }
    }

    /// Conflict policy from the options; rename wins over overwrite.
    fn on_conflict(&self) -> OnConflict {
        if self.options.rename {
            OnConflict::Rename {
                max_attempts: self.options.max_rename_attempts,
            }
        } else if self.options.overwrite {
            OnConflict::Overwrite
        } else {
            OnConflict::Keep
        }
    }

    fn resolve_folder(&self, dest: Option<&Path>) -> Result<PathBuf, String> {
        let folder = match dest {
            Some(dest) => absolute_path(dest),
            None => downloads_path(None, self.options.mount_drive),
        };
        folder.map_err(|e| e.to_string())
    }

    /// Streams the body into the claimed `file`, removing it on failure.
    async fn write(
        &self,
        response: reqwest::Response,
        file: File,
        path: &Path,
        total_bytes: u64,
        url: &str,
    ) -> Result<u64, DownloadError> {
        let label = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let progress = self.progress.file_bar(total_bytes, &label);

        match stream_to_file(response, file, self.options.chunk_size, &progress, url, path).await {
            Ok(bytes) => {
                progress.finish();
                Ok(bytes)
            }
            Err(e) => {
                progress.abandon();
                if let Err(cleanup) = tokio::fs::remove_file(path).await {
                    debug!(path = %path.display(), error = %cleanup, "partial file not removed");
                }
                Err(e)
            }
        }
    }

    async fn fail(
        &self,
        folder: &Path,
        url: &str,
        reason: OutcomeReason,
        path: Option<&Path>,
        detail: String,
    ) -> DownloadOutcome {
        let kind = match reason {
            OutcomeReason::InvalidUrl => LogKind::InvalidUrl,
            OutcomeReason::RenameExhausted => LogKind::RenameExhausted,
            _ => LogKind::DownloadFailed,
        };
        let detail = Some(detail).filter(|d| !d.is_empty());
        warn!(reason = %reason, detail = detail.as_deref().unwrap_or(""), "download failed");

        let mut entry = LogEntry::new(kind, url).with_detail(detail.clone());
        if let Some(path) = path {
            entry = entry.with_path(path);
        }
        self.log.append(folder, &entry).await;

        DownloadOutcome::error(reason, url, detail)
    }
}

/// Downloads one file with a throwaway [`FileDownloader`].
///
/// Prefer a shared [`FileDownloader`] when downloading many files.
pub async fn download_file(
    url: &str,
    filename: Option<&str>,
    dest: Option<&Path>,
    options: DownloadOptions,
) -> DownloadOutcome {
    match FileDownloader::new(options) {
        Ok(downloader) => downloader.download(url, filename, dest).await,
        Err(e) => DownloadOutcome::error(OutcomeReason::DownloadFailed, url, Some(e.to_string())),
    }
}
