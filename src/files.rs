//! Reading and appending UTF-8 text files.

use std::path::{Path, PathBuf};

use crate::error::FsError;
use crate::paths::{absolute_path, create_dir};

/// How [`read_file`] returns the content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadMode {
    Whole,
    Lines,
}

/// Content returned by [`read_file`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileContent {
    Text(String),
    /// Split on `\n`; a trailing newline yields a final empty line.
    Lines(Vec<String>),
}

/// What [`write_file`] writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteMode {
    /// Written as is; appended after a newline when the file exists.
    Text(String),
    /// Joined with `\n`; appended to the existing lines when the file exists.
    Lines(Vec<String>),
}

/// Reads a UTF-8 file.
///
/// # Errors
///
/// - [`FsError::NotFound`] if `path` does not exist
/// - [`FsError::NotAFile`] if `path` is not a regular file
/// - [`FsError::Io`] on read or decoding failure
pub fn read_file(path: &Path, mode: ReadMode) -> Result<FileContent, FsError> {
    let text = read_text(path)?;
    Ok(match mode {
        ReadMode::Whole => FileContent::Text(text),
        ReadMode::Lines => FileContent::Lines(split_lines(&text)),
    })
}

fn read_text(path: &Path) -> Result<String, FsError> {
    if path.exists() && !path.is_file() {
        return Err(FsError::not_a_file(path));
    }
    std::fs::read_to_string(path).map_err(|e| FsError::io(path, e))
}

fn split_lines(text: &str) -> Vec<String> {
    text.split('\n').map(ToString::to_string).collect()
}

/// Writes `content` to `path`, creating parent directories.
///
/// Existing files are extended, never truncated. Returns the absolute path.
///
/// # Errors
///
/// Returns [`FsError`] when the parent cannot be created or the file cannot
/// be read or written.
pub fn write_file(path: &Path, content: &WriteMode) -> Result<PathBuf, FsError> {
    let path = absolute_path(path)?;
    if let Some(parent) = path.parent() {
        create_dir(parent)?;
    }

    let exists = path.exists();
    let text = match content {
        WriteMode::Text(text) if exists => format!("{}\n{text}", read_text(&path)?),
        WriteMode::Text(text) => text.clone(),
        WriteMode::Lines(lines) if exists => {
            let mut current = split_lines(&read_text(&path)?);
            current.extend(lines.iter().cloned());
            current.join("\n")
        }
        WriteMode::Lines(lines) => lines.join("\n"),
    };

    std::fs::write(&path, text).map_err(|e| FsError::io(&path, e))?;
    Ok(path)
}
