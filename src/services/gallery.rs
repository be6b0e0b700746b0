//! Listing and deleting stored results
//!
//! A result is any file in the document directory named `processed_*` with a
//! `.png` or `.jpg` extension.

use crate::error::{RemovalError, Result};
use crate::services::io::PROCESSED_PREFIX;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

const RESULT_EXTENSIONS: &[&str] = &[".png", ".jpg"];

/// One stored result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GalleryEntry {
    pub path: PathBuf,
    pub name: String,
    pub modified: Option<DateTime<Utc>>,
    pub size_bytes: u64,
}

impl GalleryEntry {
    /// File name without the `processed_` prefix and extension
    #[must_use]
    pub fn display_label(&self) -> &str {
        let name = self.name.strip_prefix(PROCESSED_PREFIX).unwrap_or(&self.name);
        name.rsplit_once('.').map_or(name, |(stem, _)| stem)
    }
}

/// Whether a file name belongs to the result gallery
#[must_use]
pub fn is_gallery_file(name: &str) -> bool {
    name.starts_with(PROCESSED_PREFIX) && RESULT_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
}

/// Results stored in one document directory
#[derive(Debug, Clone)]
pub struct Gallery {
    dir: PathBuf,
}

impl Gallery {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory being listed
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// All stored results, newest first
    ///
    /// A missing directory is an empty gallery. Entries without a known
    /// modification time sort last.
    ///
    /// # Errors
    /// - The directory exists but cannot be read
    pub async fn list(&self) -> Result<Vec<GalleryEntry>> {
        let mut entries = Vec::new();

        let mut dir = match tokio::fs::read_dir(&self.dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(entries),
            Err(e) => {
                return Err(RemovalError::file_io_error("read document directory", &self.dir, &e))
            },
        };

        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| RemovalError::file_io_error("read document directory", &self.dir, &e))?
        {
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if !is_gallery_file(&name) {
                continue;
            }

            let metadata = match entry.metadata().await {
                Ok(metadata) if metadata.is_file() => metadata,
                Ok(_) => continue,
                Err(e) => {
                    log::warn!("Skipping {}: {}", name, e);
                    continue;
                },
            };

            entries.push(GalleryEntry {
                path: entry.path(),
                name,
                modified: metadata.modified().ok().map(DateTime::<Utc>::from),
                size_bytes: metadata.len(),
            });
        }

        // Newest first; ties broken by name so the order is stable
        entries.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| b.name.cmp(&a.name)));
        Ok(entries)
    }

    /// Delete a stored result by file name
    ///
    /// Returns `false` when the file was already gone.
    ///
    /// # Errors
    /// - `InvalidInput` for names outside the gallery naming contract
    /// - I/O errors while deleting
    pub async fn delete(&self, name: &str) -> Result<bool> {
        if name.contains(['/', '\\']) || !is_gallery_file(name) {
            return Err(RemovalError::invalid_input(format!(
                "'{}' is not a processed image name",
                name
            )));
        }

        let path = self.dir.join(name);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                log::info!("Deleted {}", path.display());
                Ok(true)
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(RemovalError::file_io_error("delete result", &path, &e)),
        }
    }
}

/// Format a byte count for display: `0 Bytes`, `1.5 KB`, `2 MB`
#[must_use]
pub fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut size = bytes as f64;
    let mut unit_index = 0;
    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    let rounded = format!("{:.2}", size);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS.get(unit_index).unwrap_or(&"Bytes"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str, contents: &[u8], age_secs: u64) {
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        let file = std::fs::File::options().write(true).open(&path).unwrap();
        file.set_modified(SystemTime::now() - Duration::from_secs(age_secs))
            .unwrap();
    }

    #[test]
    fn test_is_gallery_file() {
        assert!(is_gallery_file("processed_1700000000000.png"));
        assert!(is_gallery_file("processed_1700000000000.jpg"));
        assert!(!is_gallery_file("processed_1700000000000.webp"));
        assert!(!is_gallery_file("photo.png"));
        assert!(!is_gallery_file("compressed_1.jpg"));
    }

    #[tokio::test]
    async fn test_list_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let gallery = Gallery::new(temp_dir.path().join("never-created"));
        assert!(gallery.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_filters_and_sorts() {
        let temp_dir = TempDir::new().unwrap();
        touch(temp_dir.path(), "processed_100.png", b"old", 300);
        touch(temp_dir.path(), "processed_200.jpg", b"newer!", 10);
        touch(temp_dir.path(), "processed_150.png", b"mid", 100);
        touch(temp_dir.path(), "settings.json", b"{}", 0);
        touch(temp_dir.path(), "processed_300.webp", b"skip", 0);
        std::fs::create_dir(temp_dir.path().join("processed_dir.png")).unwrap();

        let entries = Gallery::new(temp_dir.path()).list().await.unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["processed_200.jpg", "processed_150.png", "processed_100.png"]
        );
        assert_eq!(entries[0].size_bytes, 6);
        assert!(entries[0].modified.is_some());
    }

    #[tokio::test]
    async fn test_delete() {
        let temp_dir = TempDir::new().unwrap();
        touch(temp_dir.path(), "processed_1.png", b"x", 0);
        let gallery = Gallery::new(temp_dir.path());

        assert!(gallery.delete("processed_1.png").await.unwrap());
        assert!(!temp_dir.path().join("processed_1.png").exists());
        assert!(!gallery.delete("processed_1.png").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_rejects_foreign_names() {
        let temp_dir = TempDir::new().unwrap();
        touch(temp_dir.path(), "settings.json", b"{}", 0);
        let gallery = Gallery::new(temp_dir.path());

        assert!(gallery.delete("settings.json").await.is_err());
        assert!(gallery.delete("../processed_1.png").await.is_err());
        assert!(temp_dir.path().join("settings.json").exists());
    }

    #[test]
    fn test_display_label() {
        let entry = GalleryEntry {
            path: PathBuf::from("/docs/processed_1700000000000.png"),
            name: "processed_1700000000000.png".to_string(),
            modified: None,
            size_bytes: 0,
        };
        assert_eq!(entry.display_label(), "1700000000000");
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 Bytes");
        assert_eq!(format_size(512), "512 Bytes");
        assert_eq!(format_size(1024), "1 KB");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(10 * 1024 + 100), "10.1 KB");
        assert_eq!(format_size(2 * 1024 * 1024), "2 MB");
        assert_eq!(format_size(1024 * 1024 * 1024), "1 GB");
    }
}
