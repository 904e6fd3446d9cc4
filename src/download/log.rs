//! Append-only text log of download events.
//!
//! Each event becomes one entry:
//!
//! ```text
//! 2024-05-01 09:15:02PM	SUCCESS - [Downloaded File]: File downloaded successfully.
//! 			PATH: /data/Downloads/report.pdf
//! 			URL: https://example.com/report.pdf
//! ```
//!
//! Appends from concurrent downloads are serialized by a lock held for the
//! duration of each write, so entries never interleave.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::Local;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::constants::LOG_FILE_NAME;

/// `strftime` pattern for entry timestamps (`2024-05-01 09:15:02PM`).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %I:%M:%S%p";

/// Kind of event being logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogKind {
    InvalidUrl,
    EmptyFile,
    ExistsFile,
    Downloaded,
    DownloadFailed,
    RenameExhausted,
}

impl LogKind {
    /// Severity label written before the kind.
    #[must_use]
    pub fn level(self) -> &'static str {
        match self {
            Self::ExistsFile => "WARNING",
            Self::Downloaded => "SUCCESS",
            Self::InvalidUrl | Self::EmptyFile | Self::DownloadFailed | Self::RenameExhausted => {
                "ERROR"
            }
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::InvalidUrl => "Invalid URL",
            Self::EmptyFile => "Empty File",
            Self::ExistsFile => "Exists File",
            Self::Downloaded => "Downloaded File",
            Self::DownloadFailed => "Download File",
            Self::RenameExhausted => "Rename File",
        }
    }

    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::InvalidUrl => "URL is not valid or not reachable",
            Self::EmptyFile => "The file was not found or is empty",
            Self::ExistsFile => "The file to download already exists",
            Self::Downloaded => "File downloaded successfully",
            Self::DownloadFailed => "Error while downloading the file",
            Self::RenameExhausted => "No free name left for the file",
        }
    }
}

/// One log event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub kind: LogKind,
    pub url: String,
    pub path: Option<PathBuf>,
    pub detail: Option<String>,
}

impl LogEntry {
    #[must_use]
    pub fn new(kind: LogKind, url: impl Into<String>) -> Self {
        Self {
            kind,
            url: url.into(),
            path: None,
            detail: None,
        }
    }

    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_detail(mut self, detail: Option<String>) -> Self {
        self.detail = detail;
        self
    }

    /// Renders the entry text with the given timestamp.
    #[must_use]
    pub fn render(&self, timestamp: &str) -> String {
        let mut body = format!(
            "{} - [{}]: {}.\n",
            self.kind.level(),
            self.kind.label(),
            self.kind.message()
        );
        if let Some(path) = &self.path {
            let _ = writeln!(body, "\t\t\tPATH: {}", path.display());
        }
        let _ = writeln!(body, "\t\t\tURL: {}", self.url);

        match &self.detail {
            Some(detail) => format!("{timestamp}\t{body}\n\t\t\t{detail}\n"),
            None => format!("{timestamp}\t{body}"),
        }
    }
}

/// Writer for the download log.
///
/// When no explicit path is configured, entries go to `logs.txt` inside the
/// destination folder of the download that produced them.
#[derive(Debug)]
pub struct DownloadLog {
    enabled: bool,
    path: Option<PathBuf>,
    lock: Mutex<()>,
}

impl DownloadLog {
    #[must_use]
    pub fn new(enabled: bool, path: Option<PathBuf>) -> Self {
        Self {
            enabled,
            path,
            lock: Mutex::new(()),
        }
    }

    /// A writer that drops every entry.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(false, None)
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Path entries for downloads into `folder` are written to.
    #[must_use]
    pub fn path_for(&self, folder: &Path) -> PathBuf {
        self.path
            .clone()
            .unwrap_or_else(|| folder.join(LOG_FILE_NAME))
    }

    /// Appends `entry`, stamped with the current local time.
    ///
    /// Failures are reported through `tracing` and otherwise ignored: a log
    /// that cannot be written never changes a download's outcome.
    pub async fn append(&self, folder: &Path, entry: &LogEntry) {
        if !self.enabled {
            return;
        }

        let path = self.path_for(folder);
        let text = entry.render(&Local::now().format(TIMESTAMP_FORMAT).to_string());

        let _guard = self.lock.lock().await;
        if let Err(e) = append_text(&path, &text).await {
            warn!(path = %path.display(), error = %e, "failed to write download log");
        } else {
            debug!(path = %path.display(), kind = entry.kind.label(), "download log updated");
        }
    }
}

async fn append_text(path: &Path, text: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(text.as_bytes()).await?;
    file.flush().await
}
