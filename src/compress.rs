//! Zip and tar archives of files and directories.

use std::fmt;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::dirs::delete_path;
use crate::error::FsError;
use crate::paths::{absolute_path, create_dir};

/// Recognized archive name suffixes, longest first.
const SUFFIXES: [(&str, ArchiveFormat); 4] = [
    (".tar.gz", ArchiveFormat::TarGz),
    (".tgz", ArchiveFormat::TarGz),
    (".tar", ArchiveFormat::Tar),
    (".zip", ArchiveFormat::Zip),
];

/// Errors from [`compress`] and [`uncompress`].
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error(transparent)]
    Fs(#[from] FsError),

    /// The zip library rejected the archive.
    #[error("zip error in {path}: {source}")]
    Zip {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    /// The file name does not end in a supported archive suffix.
    #[error("unsupported archive: {path}")]
    Unsupported { path: PathBuf },

    /// Unknown format name.
    #[error("unknown archive format: {0}")]
    UnknownFormat(String),
}

impl ArchiveError {
    fn zip(path: &Path, source: zip::result::ZipError) -> Self {
        Self::Zip {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Archive container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    Tar,
    /// Gzip-compressed tar.
    TarGz,
}

impl ArchiveFormat {
    /// Suffix given to new archives.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Zip => ".zip",
            Self::Tar => ".tar",
            Self::TarGz => ".tar.gz",
        }
    }

    /// Splits an archive file name into its stem and format.
    #[must_use]
    pub fn split_name(name: &str) -> Option<(&str, Self)> {
        let lower = name.to_ascii_lowercase();
        SUFFIXES.into_iter().find_map(|(suffix, format)| {
            (lower.len() > suffix.len() && lower.ends_with(suffix))
                .then(|| (&name[..name.len() - suffix.len()], format))
        })
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Zip => "zip",
            Self::Tar => "tar",
            Self::TarGz => "gztar",
        })
    }
}

impl FromStr for ArchiveFormat {
    type Err = ArchiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "zip" => Ok(Self::Zip),
            "tar" => Ok(Self::Tar),
            "gztar" | "tar.gz" | "tgz" => Ok(Self::TarGz),
            _ => Err(ArchiveError::UnknownFormat(s.to_string())),
        }
    }
}

/// How [`compress`] builds the archive.
#[derive(Debug, Clone, Copy)]
pub struct CompressOptions {
    pub format: ArchiveFormat,
    /// Store a directory under its own name instead of its bare content.
    /// Files are always stored under their name.
    pub include_base: bool,
    /// Replace an existing archive.
    pub overwrite: bool,
    /// Delete the source once archived.
    pub delete_src: bool,
}

impl Default for CompressOptions {
    fn default() -> Self {
        Self {
            format: ArchiveFormat::Zip,
            include_base: true,
            overwrite: false,
            delete_src: false,
        }
    }
}

/// Archives `src` as `<dst_dir>/<stem><ext>`.
///
/// `dst_dir` defaults to the parent of `src` and is created when missing.
/// Returns the absolute path of the archive.
///
/// # Errors
///
/// - [`FsError::NotFound`] if `src` does not exist
/// - [`FsError::AlreadyExists`] if the archive exists and `overwrite` is off
/// - [`ArchiveError::Zip`] or [`FsError::Io`] if writing fails
pub fn compress(
    src: &Path,
    dst_dir: Option<&Path>,
    options: CompressOptions,
) -> Result<PathBuf, ArchiveError> {
    let src = absolute_path(src)?;
    if !src.exists() {
        return Err(FsError::not_found(&src).into());
    }
    let dst_dir = match dst_dir {
        Some(dir) => create_dir(dir)?,
        None => src.parent().map_or_else(|| src.clone(), Path::to_path_buf),
    };

    let stem = src
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .ok_or_else(|| FsError::invalid_name(src.display().to_string()))?;
    let archive = dst_dir.join(format!("{stem}{}", options.format.extension()));
    if archive.exists() && !options.overwrite {
        return Err(FsError::already_exists(&archive).into());
    }

    let base = if src.is_file() || options.include_base {
        src.parent().unwrap_or(src.as_path())
    } else {
        src.as_path()
    };
    let entries = archive_entries(&src, base, &archive)?;
    debug!(archive = %archive.display(), entries = entries.len(), "writing archive");

    let file = File::create(&archive).map_err(|e| FsError::io(&archive, e))?;
    match options.format {
        ArchiveFormat::Zip => write_zip(file, &entries, &archive)?,
        ArchiveFormat::Tar => {
            write_tar(file, &entries).map_err(|e| FsError::io(&archive, e))?;
        }
        ArchiveFormat::TarGz => {
            write_tar(GzEncoder::new(file, Compression::default()), &entries)
                .and_then(GzEncoder::finish)
                .map_err(|e| FsError::io(&archive, e))?;
        }
    }

    if options.delete_src {
        delete_path(&src)?;
    }
    info!(archive = %archive.display(), format = %options.format, "archive created");
    Ok(archive)
}

/// Extracts `archive` into `dst_dir` (default: the archive's parent).
///
/// Returns `<dst_dir>/<archive stem>`, where content archived with its base
/// directory ends up.
///
/// # Errors
///
/// - [`FsError::NotFound`] if `archive` does not exist
/// - [`ArchiveError::Unsupported`] for unknown suffixes
/// - [`ArchiveError::Zip`] or [`FsError::Io`] if extraction fails
pub fn uncompress(
    archive: &Path,
    dst_dir: Option<&Path>,
    delete_src: bool,
) -> Result<PathBuf, ArchiveError> {
    let archive = absolute_path(archive)?;
    let metadata = std::fs::metadata(&archive).map_err(|e| FsError::io(&archive, e))?;
    if !metadata.is_file() {
        return Err(FsError::not_a_file(&archive).into());
    }

    let name = archive
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let Some((stem, format)) = ArchiveFormat::split_name(&name) else {
        return Err(ArchiveError::Unsupported { path: archive });
    };

    let dst_dir = match dst_dir {
        Some(dir) => create_dir(dir)?,
        None => archive.parent().map_or_else(|| archive.clone(), Path::to_path_buf),
    };

    let file = File::open(&archive).map_err(|e| FsError::io(&archive, e))?;
    match format {
        ArchiveFormat::Zip => extract_zip(file, &archive, &dst_dir)?,
        ArchiveFormat::Tar => tar::Archive::new(file)
            .unpack(&dst_dir)
            .map_err(|e| FsError::io(&archive, e))?,
        ArchiveFormat::TarGz => tar::Archive::new(GzDecoder::new(file))
            .unpack(&dst_dir)
            .map_err(|e| FsError::io(&archive, e))?,
    }

    let extracted = dst_dir.join(stem);
    if delete_src {
        delete_path(&archive)?;
    }
    info!(archive = %archive.display(), to = %dst_dir.display(), "archive extracted");
    Ok(extracted)
}

/// `(path on disk, path inside the archive)` for `src` and everything below
/// it, skipping the archive being written.
fn archive_entries(
    src: &Path,
    base: &Path,
    archive: &Path,
) -> Result<Vec<(PathBuf, PathBuf)>, FsError> {
    let mut entries = Vec::new();
    for entry in WalkDir::new(src).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(src).to_path_buf();
            FsError::io(path, e.into())
        })?;
        if entry.path() == archive {
            continue;
        }
        let Ok(inner) = entry.path().strip_prefix(base) else {
            continue;
        };
        if inner.as_os_str().is_empty() {
            continue;
        }
        entries.push((entry.path().to_path_buf(), inner.to_path_buf()));
    }
    Ok(entries)
}

fn write_zip(file: File, entries: &[(PathBuf, PathBuf)], archive: &Path) -> Result<(), ArchiveError> {
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for (path, inner) in entries {
        let name = zip_name(inner);
        if path.is_dir() {
            writer
                .add_directory(name, options)
                .map_err(|e| ArchiveError::zip(archive, e))?;
            continue;
        }
        writer
            .start_file(name, options)
            .map_err(|e| ArchiveError::zip(archive, e))?;
        let mut input = File::open(path).map_err(|e| FsError::io(path, e))?;
        io::copy(&mut input, &mut writer).map_err(|e| FsError::io(archive, e))?;
    }

    writer.finish().map_err(|e| ArchiveError::zip(archive, e))?;
    Ok(())
}

fn write_tar<W: Write>(writer: W, entries: &[(PathBuf, PathBuf)]) -> io::Result<W> {
    let mut builder = tar::Builder::new(writer);
    for (path, inner) in entries {
        if path.is_dir() {
            builder.append_dir(inner, path)?;
        } else {
            builder.append_path_with_name(path, inner)?;
        }
    }
    builder.into_inner()
}

/// Archive member names always use `/`.
fn zip_name(inner: &Path) -> String {
    inner
        .components()
        .map(|part| part.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn extract_zip(file: File, archive: &Path, dst_dir: &Path) -> Result<(), ArchiveError> {
    let mut zip = ZipArchive::new(file).map_err(|e| ArchiveError::zip(archive, e))?;

    for index in 0..zip.len() {
        let mut entry = zip
            .by_index(index)
            .map_err(|e| ArchiveError::zip(archive, e))?;
        let Some(inner) = entry.enclosed_name() else {
            warn!(name = entry.name(), "skipping entry with unsafe path");
            continue;
        };
        let out = dst_dir.join(inner);

        if entry.is_dir() {
            std::fs::create_dir_all(&out).map_err(|e| FsError::io(&out, e))?;
            continue;
        }
        if let Some(parent) = out.parent() {
            std::fs::create_dir_all(parent).map_err(|e| FsError::io(parent, e))?;
        }
        let mut output = File::create(&out).map_err(|e| FsError::io(&out, e))?;
        io::copy(&mut entry, &mut output).map_err(|e| FsError::io(&out, e))?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_dir(root: &Path) -> PathBuf {
        let src = root.join("report");
        std::fs::create_dir_all(src.join("figures")).unwrap();
        std::fs::write(src.join("summary.txt"), b"summary").unwrap();
        std::fs::write(src.join("figures/plot.csv"), b"1,2,3").unwrap();
        src
    }

    fn assert_sample(dir: &Path) {
        assert_eq!(std::fs::read(dir.join("summary.txt")).unwrap(), b"summary");
        assert_eq!(std::fs::read(dir.join("figures/plot.csv")).unwrap(), b"1,2,3");
    }

    #[test]
    fn test_format_names() {
        assert_eq!("zip".parse::<ArchiveFormat>().unwrap(), ArchiveFormat::Zip);
        assert_eq!("GZTAR".parse::<ArchiveFormat>().unwrap(), ArchiveFormat::TarGz);
        assert!("bztar".parse::<ArchiveFormat>().is_err());
        assert_eq!(
            ArchiveFormat::split_name("data.Tar.GZ"),
            Some(("data", ArchiveFormat::TarGz))
        );
        assert_eq!(ArchiveFormat::split_name(".zip"), None);
        assert_eq!(ArchiveFormat::split_name("notes.txt"), None);
    }

    #[test]
    fn test_directory_with_base_every_format() {
        for format in [ArchiveFormat::Zip, ArchiveFormat::Tar, ArchiveFormat::TarGz] {
            let temp_dir = TempDir::new().unwrap();
            let src = sample_dir(temp_dir.path());
            let options = CompressOptions {
                format,
                ..CompressOptions::default()
            };

            let archive = compress(&src, Some(&temp_dir.path().join("out")), options).unwrap();
            assert_eq!(
                archive,
                temp_dir
                    .path()
                    .join("out")
                    .join(format!("report{}", format.extension()))
            );

            let unpacked = temp_dir.path().join("unpacked");
            let extracted = uncompress(&archive, Some(&unpacked), false).unwrap();
            assert_eq!(extracted, unpacked.join("report"));
            assert_sample(&extracted);
            assert!(archive.exists());
        }
    }

    #[test]
    fn test_directory_without_base_stores_content_only() {
        let temp_dir = TempDir::new().unwrap();
        let src = sample_dir(temp_dir.path());
        let options = CompressOptions {
            include_base: false,
            ..CompressOptions::default()
        };

        let archive = compress(&src, Some(&temp_dir.path().join("out")), options).unwrap();
        let unpacked = temp_dir.path().join("unpacked");
        uncompress(&archive, Some(&unpacked), false).unwrap();

        assert_sample(&unpacked);
        assert!(!unpacked.join("report").exists());
    }

    #[test]
    fn test_single_file_default_destination() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("notes.txt");
        std::fs::write(&file, b"hello").unwrap();

        let archive = compress(&file, None, CompressOptions::default()).unwrap();
        assert_eq!(archive, temp_dir.path().join("notes.zip"));

        std::fs::remove_file(&file).unwrap();
        uncompress(&archive, None, true).unwrap();
        assert_eq!(std::fs::read(&file).unwrap(), b"hello");
        assert!(!archive.exists());
    }

    #[test]
    fn test_existing_archive_needs_overwrite() {
        let temp_dir = TempDir::new().unwrap();
        let src = sample_dir(temp_dir.path());
        compress(&src, None, CompressOptions::default()).unwrap();

        let again = compress(&src, None, CompressOptions::default());
        assert!(matches!(
            again,
            Err(ArchiveError::Fs(FsError::AlreadyExists { .. }))
        ));

        let options = CompressOptions {
            overwrite: true,
            delete_src: true,
            ..CompressOptions::default()
        };
        let archive = compress(&src, None, options).unwrap();
        assert!(archive.exists());
        assert!(!src.exists());
    }

    #[test]
    fn test_uncompress_rejects_unknown_suffix() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("data.rar");
        std::fs::write(&file, b"not an archive").unwrap();

        assert!(matches!(
            uncompress(&file, None, false),
            Err(ArchiveError::Unsupported { .. })
        ));
    }

    #[test]
    fn test_uncompress_missing_archive() {
        let temp_dir = TempDir::new().unwrap();
        assert!(matches!(
            uncompress(&temp_dir.path().join("gone.zip"), None, false),
            Err(ArchiveError::Fs(FsError::NotFound { .. }))
        ));
    }
}
