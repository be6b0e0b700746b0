//! Image and result file I/O
//!
//! This module keeps filesystem access out of the orchestration logic:
//! decoding/encoding uploads, and resolving and writing into the document
//! directory that holds processed results.

use crate::error::{RemovalError, Result};
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Environment variable overriding the document directory
pub const DOCUMENT_DIR_ENV: &str = "SNAPCUT_DOCUMENT_DIR";

/// File name prefix of every stored result
pub const PROCESSED_PREFIX: &str = "processed_";

/// Stateless helpers for reading and encoding images
pub struct ImageIOService;

impl ImageIOService {
    /// Load an image from a file path
    ///
    /// Tries extension-based format detection first, then content sniffing.
    pub fn load_image<P: AsRef<Path>>(path: P) -> Result<DynamicImage> {
        let path_ref = path.as_ref();

        if !path_ref.exists() {
            return Err(RemovalError::FileNotFound(path_ref.to_path_buf()));
        }

        match image::open(path_ref) {
            Ok(img) => Ok(img),
            Err(e) => {
                log::debug!(
                    "Extension-based loading failed for {}: {}. Trying content-based detection.",
                    path_ref.display(),
                    e
                );

                let data = std::fs::read(path_ref).map_err(|io_err| {
                    RemovalError::file_io_error("read image data", path_ref, &io_err)
                })?;

                image::load_from_memory(&data).map_err(|content_err| {
                    RemovalError::compression(format!(
                        "Failed to decode '{}' ({} bytes). Extension error: {}. Content error: {}",
                        path_ref.display(),
                        data.len(),
                        e,
                        content_err
                    ))
                })
            },
        }
    }

    /// Encode an image as baseline JPEG
    ///
    /// Alpha is dropped since JPEG has no transparency.
    pub fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
        let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
        let mut buffer = Vec::new();
        let encoder = JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
        rgb.write_with_encoder(encoder)
            .map_err(|e| RemovalError::compression(format!("Failed to encode JPEG: {}", e)))?;
        Ok(buffer)
    }

    /// Size of a file in bytes, `None` when the metadata is unavailable
    pub async fn file_size<P: AsRef<Path>>(path: P) -> Option<u64> {
        tokio::fs::metadata(path.as_ref()).await.ok().map(|m| m.len())
    }
}

/// The directory holding processed results
#[derive(Debug, Clone, Default)]
pub struct OutputStorage {
    document_dir: Option<PathBuf>,
}

impl OutputStorage {
    /// Storage rooted at an explicit directory, or the platform default when `None`
    #[must_use]
    pub fn new(document_dir: Option<PathBuf>) -> Self {
        Self { document_dir }
    }

    /// Resolve the document directory
    ///
    /// Order: explicit directory, `$SNAPCUT_DOCUMENT_DIR`,
    /// `<data_dir>/snapcut/documents`.
    ///
    /// # Errors
    /// - `StorageUnavailable` when none of these can be determined
    pub fn resolve_document_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.document_dir {
            return Ok(dir.clone());
        }

        if let Ok(dir_override) = std::env::var(DOCUMENT_DIR_ENV) {
            if !dir_override.trim().is_empty() {
                return Ok(PathBuf::from(dir_override));
            }
        }

        dirs::data_dir()
            .map(|dir| dir.join("snapcut").join("documents"))
            .ok_or_else(|| {
                RemovalError::storage_unavailable(format!(
                    "Cannot access the document directory. Set {} environment variable.",
                    DOCUMENT_DIR_ENV
                ))
            })
    }

    /// `processed_<millis>.<extension>`
    #[must_use]
    pub fn output_file_name(timestamp_millis: i64, extension: &str) -> String {
        format!("{}{}.{}", PROCESSED_PREFIX, timestamp_millis, extension)
    }

    /// Write a result into the document directory
    ///
    /// The file name carries the current Unix time in milliseconds; an
    /// existing file is never overwritten (the timestamp is bumped instead).
    ///
    /// # Errors
    /// - `StorageUnavailable` when the directory cannot be resolved or created
    /// - I/O errors while writing
    pub async fn write_output(&self, bytes: &[u8], extension: &str) -> Result<PathBuf> {
        let dir = self.resolve_document_dir()?;
        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            RemovalError::storage_unavailable(format!(
                "Failed to create document directory '{}': {}",
                dir.display(),
                e
            ))
        })?;

        let path = create_unique_file(
            &dir,
            |millis| Self::output_file_name(millis, extension),
            bytes,
        )
        .await?;
        log::debug!("Wrote {} bytes to {}", bytes.len(), path.display());
        Ok(path)
    }
}

/// Write `bytes` into a new file named `name_for(<unix millis>)` inside `dir`
///
/// Opens with `create_new`, bumping the timestamp while the name is taken, so
/// concurrent writers never share a file. A partially written file is removed
/// before the error is returned.
pub(crate) async fn create_unique_file<F>(dir: &Path, name_for: F, bytes: &[u8]) -> Result<PathBuf>
where
    F: Fn(i64) -> String,
{
    let mut timestamp = chrono::Utc::now().timestamp_millis();
    loop {
        let path = dir.join(name_for(timestamp));
        let file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await;

        match file {
            Ok(file) => {
                write_or_remove(file, &path, bytes).await?;
                return Ok(path);
            },
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                timestamp += 1;
            },
            Err(e) => return Err(RemovalError::file_io_error("create", &path, &e)),
        }
    }
}

async fn write_or_remove<W>(mut writer: W, path: &Path, bytes: &[u8]) -> Result<()>
where
    W: tokio::io::AsyncWrite + Unpin,
{
    let written = match writer.write_all(bytes).await {
        Ok(()) => writer.flush().await,
        Err(e) => Err(e),
    };
    drop(writer);

    if let Err(e) = written {
        if let Err(remove_err) = tokio::fs::remove_file(path).await {
            log::warn!(
                "Could not remove incomplete file {}: {}",
                path.display(),
                remove_err
            );
        }
        return Err(RemovalError::file_io_error("write", path, &e));
    }
    Ok(())
}
