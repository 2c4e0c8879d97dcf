//! Delivering export artifacts: file names, writing to disk, opening

use super::options::ExportFormat;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// What an export file shows, used in its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportKind {
    #[default]
    Resume,
    Card,
    Social,
    Hero,
}

impl ExportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportKind::Resume => "resume",
            ExportKind::Card => "card",
            ExportKind::Social => "social",
            ExportKind::Hero => "hero",
        }
    }
}

/// `<brand>-<kind>-<YYYY-MM-DD>-<last 6 digits of epoch ms>.<ext>`.
///
/// The date is the UTC calendar date. Links have no file form and get `txt`.
pub fn generate_export_filename(
    brand: &str,
    kind: ExportKind,
    format: ExportFormat,
    now: DateTime<Utc>,
) -> String {
    let millis = now.timestamp_millis().to_string();
    let suffix = &millis[millis.len().saturating_sub(6)..];
    format!(
        "{}-{}-{}-{}.{}",
        brand,
        kind.as_str(),
        now.format("%Y-%m-%d"),
        suffix,
        format.extension().unwrap_or("txt")
    )
}

/// Write an artifact into `dir` under `filename`, replacing any existing
/// file atomically. Returns the final path.
pub fn download_blob(bytes: &[u8], dir: &Path, filename: &str) -> Result<PathBuf> {
    let name = Path::new(filename)
        .file_name()
        .ok_or_else(|| Error::FileWrite {
            path: dir.join(filename),
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty file name"),
        })?;
    let path = dir.join(name);

    fs::create_dir_all(dir).map_err(|source| Error::FileWrite {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut partial = path.as_os_str().to_owned();
    partial.push(".part");
    let partial = PathBuf::from(partial);
    fs::write(&partial, bytes).map_err(|source| Error::FileWrite {
        path: partial.clone(),
        source,
    })?;
    fs::rename(&partial, &path).map_err(|source| {
        let _ = fs::remove_file(&partial);
        Error::FileWrite {
            path: path.clone(),
            source,
        }
    })?;

    info!("Exported {} bytes to: {}", bytes.len(), path.display());
    Ok(path)
}

/// Open an exported file with the system handler. Failure is only logged.
pub fn open_exported(path: &Path) -> bool {
    match open::that(path) {
        Ok(()) => true,
        Err(e) => {
            warn!("Failed to open exported file: {}", e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    #[test]
    fn test_filename_format() {
        let now = Utc.timestamp_millis_opt(1_710_000_123_456).unwrap();
        assert_eq!(
            generate_export_filename("phantom-thief", ExportKind::Social, ExportFormat::Png, now),
            "phantom-thief-social-2024-03-09-123456.png"
        );
        assert_eq!(
            generate_export_filename("kaito", ExportKind::Resume, ExportFormat::Pdf, now),
            "kaito-resume-2024-03-09-123456.pdf"
        );
    }

    #[test]
    fn test_download_blob_writes_file() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("out");
        let path = download_blob(b"\x89PNG", &target, "card.png").unwrap();
        assert_eq!(path, target.join("card.png"));
        assert_eq!(fs::read(&path).unwrap(), b"\x89PNG");
        assert!(!target.join("card.png.part").exists());
    }

    #[test]
    fn test_download_blob_replaces_and_strips_directories() {
        let dir = TempDir::new().unwrap();
        download_blob(b"old", dir.path(), "a.jpg").unwrap();
        let path = download_blob(b"new", dir.path(), "../../a.jpg").unwrap();
        assert_eq!(path, dir.path().join("a.jpg"));
        assert_eq!(fs::read(&path).unwrap(), b"new");
    }

    #[test]
    fn test_download_blob_rejects_empty_name() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            download_blob(b"x", dir.path(), ".."),
            Err(Error::FileWrite { .. })
        ));
    }
}
