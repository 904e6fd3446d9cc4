//! Tagged result of a single download attempt.

use std::fmt;
use std::path::{Path, PathBuf};

/// Why a download ended the way it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutcomeReason {
    /// The URL is malformed or the server could not be reached.
    InvalidUrl,
    /// The server declared no content (length 0 or absent).
    EmptyFile,
    /// The destination exists and neither overwrite nor rename was requested.
    AlreadyExists,
    /// The file was written to disk.
    Downloaded,
    /// Streaming the body to disk failed.
    DownloadFailed,
    /// No free numbered name was found for a conflicting destination.
    RenameExhausted,
}

impl OutcomeReason {
    /// Stable snake_case tag.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidUrl => "invalid_url",
            Self::EmptyFile => "empty_file",
            Self::AlreadyExists => "already_exists",
            Self::Downloaded => "downloaded",
            Self::DownloadFailed => "download_failed",
            Self::RenameExhausted => "rename_exhausted",
        }
    }
}

impl fmt::Display for OutcomeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one download, returned instead of an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// The file was saved.
    Success {
        /// Absolute path of the saved file.
        path: PathBuf,
        /// Bytes written to disk.
        bytes: u64,
    },
    /// Nothing was downloaded, but nothing went wrong either.
    Warning {
        /// Why the download was skipped.
        reason: OutcomeReason,
        /// The requested URL.
        url: String,
    },
    /// The download failed.
    Error {
        /// What failed.
        reason: OutcomeReason,
        /// The requested URL.
        url: String,
        /// Underlying error message, when there is one.
        detail: Option<String>,
    },
}

impl DownloadOutcome {
    pub(crate) fn warning(reason: OutcomeReason, url: impl Into<String>) -> Self {
        Self::Warning {
            reason,
            url: url.into(),
        }
    }

    pub(crate) fn error(
        reason: OutcomeReason,
        url: impl Into<String>,
        detail: Option<String>,
    ) -> Self {
        Self::Error {
            reason,
            url: url.into(),
            detail,
        }
    }

    /// Returns the reason tag; successes report [`OutcomeReason::Downloaded`].
    #[must_use]
    pub fn reason(&self) -> OutcomeReason {
        match self {
            Self::Success { .. } => OutcomeReason::Downloaded,
            Self::Warning { reason, .. } | Self::Error { reason, .. } => *reason,
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    #[must_use]
    pub fn is_warning(&self) -> bool {
        matches!(self, Self::Warning { .. })
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    /// Path of the saved file, for successes.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Success { path, .. } => Some(path),
            _ => None,
        }
    }
}
