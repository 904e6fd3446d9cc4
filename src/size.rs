//! Human-readable sizes and on-disk size computation.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use walkdir::WalkDir;

use crate::error::FsError;

/// Unit for [`natural_size`], base 1024.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeUnit {
    Bytes,
    Kb,
    Mb,
    Gb,
    Tb,
}

impl SizeUnit {
    /// Largest unit first, as probed by automatic selection.
    const DESCENDING: [Self; 5] = [Self::Tb, Self::Gb, Self::Mb, Self::Kb, Self::Bytes];

    /// Bytes per unit.
    #[must_use]
    pub fn factor(self) -> u64 {
        match self {
            Self::Bytes => 1,
            Self::Kb => 1 << 10,
            Self::Mb => 1 << 20,
            Self::Gb => 1 << 30,
            Self::Tb => 1 << 40,
        }
    }

    /// Label used in formatted sizes.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Bytes => "bytes",
            Self::Kb => "KB",
            Self::Mb => "MB",
            Self::Gb => "GB",
            Self::Tb => "TB",
        }
    }

    /// Largest unit not exceeding `bytes` (`Bytes` for anything under 1 KB).
    #[must_use]
    pub fn for_bytes(bytes: u64) -> Self {
        Self::DESCENDING
            .into_iter()
            .find(|unit| bytes >= unit.factor())
            .unwrap_or(Self::Bytes)
    }
}

impl fmt::Display for SizeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Unit name that is not one of `bytes`, `KB`, `MB`, `GB`, `TB`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown size unit '{0}': expected one of bytes, KB, MB, GB, TB")]
pub struct UnknownSizeUnit(pub String);

impl FromStr for SizeUnit {
    type Err = UnknownSizeUnit;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BYTES" => Ok(Self::Bytes),
            "KB" => Ok(Self::Kb),
            "MB" => Ok(Self::Mb),
            "GB" => Ok(Self::Gb),
            "TB" => Ok(Self::Tb),
            _ => Err(UnknownSizeUnit(s.to_string())),
        }
    }
}

/// Formats `bytes` in `unit`, or in the largest fitting unit when `None`.
///
/// Values are rounded to two decimals with trailing zeros dropped:
/// `natural_size(1536, None) == "1.5 KB"`, `natural_size(0, None) == "0 bytes"`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn natural_size(bytes: u64, unit: Option<SizeUnit>) -> String {
    if bytes == 0 {
        return format!("0 {}", SizeUnit::Bytes.label());
    }
    let unit = unit.unwrap_or_else(|| SizeUnit::for_bytes(bytes));
    let value = bytes as f64 / unit.factor() as f64;
    let rounded = (value * 100.0).round() / 100.0;
    format!("{rounded} {}", unit.label())
}

/// Size of a regular file.
///
/// # Errors
///
/// - [`FsError::NotFound`] if `path` does not exist
/// - [`FsError::NotAFile`] if `path` is not a regular file
pub fn file_size(path: &Path) -> Result<u64, FsError> {
    let metadata = std::fs::metadata(path).map_err(|e| FsError::io(path, e))?;
    if !metadata.is_file() {
        return Err(FsError::not_a_file(path));
    }
    Ok(metadata.len())
}

/// Total size of the files under `path`, recursively.
///
/// With `extension` (with or without the leading dot) only matching files
/// are counted. Unreadable entries are skipped.
///
/// # Errors
///
/// - [`FsError::NotFound`] if `path` does not exist
/// - [`FsError::NotADirectory`] if `path` is not a directory
pub fn dir_size(path: &Path, extension: Option<&str>) -> Result<u64, FsError> {
    let metadata = std::fs::metadata(path).map_err(|e| FsError::io(path, e))?;
    if !metadata.is_dir() {
        return Err(FsError::not_a_directory(path));
    }

    let extension = extension
        .map(|ext| ext.trim_start_matches('.'))
        .filter(|ext| !ext.is_empty() && *ext != "*");

    Ok(WalkDir::new(path)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| match extension {
            Some(ext) => entry.path().extension().is_some_and(|e| e == ext),
            None => true,
        })
        .filter_map(|entry| entry.metadata().ok())
        .map(|metadata| metadata.len())
        .sum())
}

/// Size of a file, or of a directory's contents (see [`dir_size`]).
///
/// # Errors
///
/// Returns [`FsError::NotFound`] if `path` does not exist.
pub fn path_size(path: &Path, extension: Option<&str>) -> Result<u64, FsError> {
    if path.is_dir() {
        dir_size(path, extension)
    } else {
        file_size(path)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_natural_size_zero() {
        assert_eq!(natural_size(0, None), "0 bytes");
        assert_eq!(natural_size(0, Some(SizeUnit::Mb)), "0 bytes");
    }

    #[test]
    fn test_natural_size_auto_unit() {
        assert_eq!(natural_size(1, None), "1 bytes");
        assert_eq!(natural_size(1023, None), "1023 bytes");
        assert_eq!(natural_size(1536, None), "1.5 KB");
        assert_eq!(natural_size(2 * 1024 * 1024, None), "2 MB");
        assert_eq!(natural_size(1_234_567_890, None), "1.15 GB");
        assert_eq!(natural_size(1 << 40, None), "1 TB");
    }

    #[test]
    fn test_natural_size_explicit_unit() {
        assert_eq!(natural_size(1024, Some(SizeUnit::Bytes)), "1024 bytes");
        assert_eq!(natural_size(512, Some(SizeUnit::Kb)), "0.5 KB");
        assert_eq!(natural_size(1024 * 1024, Some(SizeUnit::Kb)), "1024 KB");
    }

    #[test]
    fn test_size_unit_parse_is_case_insensitive() {
        assert_eq!("bytes".parse::<SizeUnit>().unwrap(), SizeUnit::Bytes);
        assert_eq!("BYTES".parse::<SizeUnit>().unwrap(), SizeUnit::Bytes);
        assert_eq!("kb".parse::<SizeUnit>().unwrap(), SizeUnit::Kb);
        assert_eq!(" Gb ".parse::<SizeUnit>().unwrap(), SizeUnit::Gb);
        assert!("PB".parse::<SizeUnit>().is_err());
    }

    #[test]
    fn test_file_size_and_errors() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("a.txt");
        std::fs::write(&file, b"12345").unwrap();

        assert_eq!(file_size(&file).unwrap(), 5);
        assert!(matches!(
            file_size(temp_dir.path()),
            Err(FsError::NotAFile { .. })
        ));
        assert!(matches!(
            file_size(&temp_dir.path().join("missing")),
            Err(FsError::NotFound { .. })
        ));
    }

    #[test]
    fn test_dir_size_recurses_and_filters_by_extension() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("nested");
        std::fs::create_dir(&nested).unwrap();
        std::fs::write(temp_dir.path().join("a.pdf"), vec![0u8; 100]).unwrap();
        std::fs::write(nested.join("b.pdf"), vec![0u8; 50]).unwrap();
        std::fs::write(nested.join("c.txt"), vec![0u8; 7]).unwrap();

        assert_eq!(dir_size(temp_dir.path(), None).unwrap(), 157);
        assert_eq!(dir_size(temp_dir.path(), Some("pdf")).unwrap(), 150);
        assert_eq!(dir_size(temp_dir.path(), Some(".txt")).unwrap(), 7);
        assert_eq!(dir_size(temp_dir.path(), Some("*")).unwrap(), 157);
    }

    #[test]
    fn test_path_size_dispatches() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("a.bin");
        std::fs::write(&file, vec![0u8; 10]).unwrap();

        assert_eq!(path_size(&file, None).unwrap(), 10);
        assert_eq!(path_size(temp_dir.path(), None).unwrap(), 10);
        assert!(path_size(&temp_dir.path().join("nope"), None).is_err());
    }
}
