//! Filename extraction, sanitization, and collision handling for downloads.
//!
//! A destination name comes from, in order: the caller, the
//! Content-Disposition header, or the last segment of the URL path.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use tokio::fs::{File, OpenOptions};
use url::Url;

use super::constants::MAX_RENAME_ATTEMPTS;
use super::error::DownloadError;

/// Resolves the destination filename for a download.
///
/// 1. A non-empty `explicit` name is sanitized and used.
/// 2. A name found in `content_disposition` is used as sent, unless it
///    would escape the destination directory (then it is sanitized).
/// 3. Otherwise the name is derived from the URL (see [`name_from_url`]).
#[must_use]
pub fn resolve_filename(
    explicit: Option<&str>,
    content_disposition: Option<&str>,
    url: &Url,
    missing_name: &str,
) -> String {
    if let Some(name) = explicit.map(str::trim).filter(|name| !name.is_empty()) {
        return sanitize_filename(name);
    }

    if let Some(name) = content_disposition.and_then(parse_content_disposition) {
        if is_single_component(&name) {
            return name;
        }
        return sanitize_filename(&name);
    }

    name_from_url(url, missing_name)
}

/// Derives a filename from the last non-empty URL path segment.
///
/// A segment without an extension becomes `"<missing_name> (<segment>)"`.
/// URLs without any path segment fall back to the host name.
#[must_use]
pub fn name_from_url(url: &Url, missing_name: &str) -> String {
    let segment = url
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).next_back())
        .map(|last| {
            urlencoding::decode(last).map_or_else(|_| last.to_string(), |d| d.into_owned())
        })
        .or_else(|| url.host_str().map(ToString::to_string))
        .unwrap_or_default();

    let segment = sanitize_filename(&segment);
    if split_extension(&segment).1.is_empty() {
        format!("{missing_name} ({segment})")
    } else {
        segment
    }
}

/// Parses Content-Disposition header to extract filename.
///
/// Handles:
/// - `attachment; filename="example.pdf"`
/// - `attachment; filename=example.pdf`
/// - `attachment; filename*=UTF-8''example.pdf` (RFC 5987)
pub(crate) fn parse_content_disposition(header: &str) -> Option<String> {
    if let Some(pos) = header.find("filename*=") {
        let value = header[pos + 10..].trim();
        // charset'language'encoded_value
        if let Some(quote_pos) = value.find("''") {
            let encoded = &value[quote_pos + 2..];
            let end = encoded.find(';').unwrap_or(encoded.len());
            if let Ok(decoded) = urlencoding::decode(encoded[..end].trim()) {
                let decoded = decoded.into_owned();
                if !decoded.is_empty() {
                    return Some(decoded);
                }
            }
        }
    }

    let pos = header.find("filename=")?;
    let value = header[pos + 9..].trim();

    if let Some(stripped) = value.strip_prefix('"') {
        let end = stripped.find('"')?;
        let filename = &stripped[..end];
        return (!filename.is_empty()).then(|| filename.to_string());
    }

    let end = value.find(';').unwrap_or(value.len());
    let filename = value[..end].trim();
    (!filename.is_empty()).then(|| filename.to_string())
}

/// Sanitizes filename for filesystem safety.
///
/// Replaces characters that are invalid on common filesystems
/// (`/ \ : * ? " < > |`) and control characters with `_`.
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if sanitized.is_empty() {
        return "_".to_string();
    }

    if is_single_component(&sanitized) {
        sanitized
    } else {
        sanitized
            .chars()
            .map(|c| if c == '.' { '_' } else { c })
            .collect()
    }
}

/// Shortens a filename to `max_len` characters, keeping its extension.
///
/// `a_very_long_report_name.pdf` with `max_len = 16` becomes `a_very_lo....pdf`.
#[must_use]
pub fn truncate_filename(name: &str, max_len: usize) -> String {
    if name.chars().count() <= max_len {
        return name.to_string();
    }

    let (stem, ext) = split_extension(name);
    let keep = max_len.saturating_sub(3 + ext.chars().count());
    let head: String = stem.chars().take(keep).collect();
    format!("{head}...{ext}")
}

/// Finds the first free `<stem>_<n><ext>` next to `path`, probing `n = 1, 2, ...`.
///
/// # Errors
///
/// Returns [`DownloadError::RenameExhausted`] when all
/// [`MAX_RENAME_ATTEMPTS`] candidates already exist.
pub fn rename_on_conflict(path: &Path) -> Result<PathBuf, DownloadError> {
    rename_on_conflict_bounded(path, MAX_RENAME_ATTEMPTS)
}

pub(crate) fn rename_on_conflict_bounded(
    path: &Path,
    max_attempts: usize,
) -> Result<PathBuf, DownloadError> {
    suffixed_candidates(path, max_attempts)
        .find(|candidate| !candidate.exists())
        .ok_or_else(|| DownloadError::rename_exhausted(path, max_attempts))
}

/// What to do when the destination file already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OnConflict {
    /// Leave the existing file alone.
    Keep,
    /// Truncate and reuse the existing file.
    Overwrite,
    /// Move on to `<stem>_<n><ext>`, for `n` up to `max_attempts`.
    Rename { max_attempts: usize },
}

/// A destination after [`claim_destination`].
#[derive(Debug)]
pub(crate) enum Claim {
    /// The file was opened for writing and belongs to the caller.
    Created { path: PathBuf, file: File },
    /// The file exists and was kept.
    Exists(PathBuf),
}

/// Opens the destination for `path`, resolving conflicts per `on_conflict`.
///
/// Unless overwriting, files are created with `create_new`, so the
/// existence check and the creation are one atomic step: two downloads
/// racing for the same name never end up sharing a file.
pub(crate) async fn claim_destination(
    path: &Path,
    on_conflict: OnConflict,
) -> Result<Claim, DownloadError> {
    let created = |path: &Path, file| Claim::Created {
        path: path.to_path_buf(),
        file,
    };

    match on_conflict {
        OnConflict::Overwrite => {
            let file = File::create(path)
                .await
                .map_err(|e| DownloadError::io(path, e))?;
            Ok(created(path, file))
        }
        OnConflict::Keep => Ok(match create_new(path).await? {
            Some(file) => created(path, file),
            None => Claim::Exists(path.to_path_buf()),
        }),
        OnConflict::Rename { max_attempts } => {
            if let Some(file) = create_new(path).await? {
                return Ok(created(path, file));
            }
            for candidate in suffixed_candidates(path, max_attempts) {
                if let Some(file) = create_new(&candidate).await? {
                    return Ok(created(&candidate, file));
                }
            }
            Err(DownloadError::rename_exhausted(path, max_attempts))
        }
    }
}

/// Creates `path` exclusively; `None` if it already exists.
async fn create_new(path: &Path) -> Result<Option<File>, DownloadError> {
    match OpenOptions::new().write(true).create_new(true).open(path).await {
        Ok(file) => Ok(Some(file)),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(None),
        Err(e) => Err(DownloadError::io(path, e)),
    }
}

/// `<stem>_1<ext>` through `<stem>_<max_attempts><ext>` next to `path`.
fn suffixed_candidates(path: &Path, max_attempts: usize) -> impl Iterator<Item = PathBuf> {
    let parent = path.parent().unwrap_or_else(|| Path::new("")).to_path_buf();
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let (stem, ext) = split_extension(&filename);
    let (stem, ext) = (stem.to_string(), ext.to_string());

    (1..=max_attempts).map(move |i| parent.join(format!("{stem}_{i}{ext}")))
}

/// Splits `name` into stem and extension (including the dot).
///
/// Leading dots and trailing dots do not start an extension, so
/// `.bashrc` and `file.` have none.
fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(pos) if pos > 0 && pos + 1 < name.len() => (&name[..pos], &name[pos..]),
        _ => (name, ""),
    }
}

fn is_single_component(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !name.contains(['/', '\\'])
}
