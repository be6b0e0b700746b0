//! Upload preconditions: existence and size checks, plus best-effort shrinking
//!
//! Providers reject uploads above a hard ceiling (10–12 MB). Camera captures
//! regularly exceed that, so oversized inputs are downscaled and re-encoded
//! as JPEG before upload.

use crate::config::{CompressionPolicy, CompressionSettings};
use crate::error::{RemovalError, Result};
use crate::providers::Provider;
use crate::services::io::{create_unique_file, ImageIOService};
use image::imageops::FilterType;
use image::DynamicImage;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const SCRATCH_PREFIX: &str = "compressed_";

/// Validates and prepares images for upload to a provider
#[derive(Debug, Clone)]
pub struct UploadPreparer {
    settings: CompressionSettings,
    policy: CompressionPolicy,
    scratch_dir: PathBuf,
}

impl UploadPreparer {
    pub fn new<P: Into<PathBuf>>(
        settings: CompressionSettings,
        policy: CompressionPolicy,
        scratch_dir: P,
    ) -> Self {
        Self {
            settings,
            policy,
            scratch_dir: scratch_dir.into(),
        }
    }

    /// Check that the file exists and fits the provider's ceiling
    ///
    /// A file exactly at the limit passes. If the filesystem cannot report a
    /// size the size check is skipped.
    ///
    /// # Errors
    /// - `FileNotFound` for a missing path
    /// - `TooLarge` for a file above `provider.max_upload_bytes`
    pub async fn validate(&self, path: &Path, provider: &Provider) -> Result<()> {
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            return Err(RemovalError::FileNotFound(path.to_path_buf()));
        }

        match ImageIOService::file_size(path).await {
            Some(size) if size > provider.max_upload_bytes => Err(RemovalError::TooLarge {
                path: path.to_path_buf(),
                size,
                limit: provider.max_upload_bytes,
                provider: provider.name.clone(),
            }),
            Some(size) => {
                debug!(path = %path.display(), size, "Image passed validation");
                Ok(())
            },
            None => {
                debug!(path = %path.display(), "File size unavailable, skipping size check");
                Ok(())
            },
        }
    }

    /// Return a path whose contents fit the provider's ceiling
    ///
    /// Files within the limit are returned unchanged. Larger files are
    /// downscaled to `max_width` and re-encoded as JPEG into the scratch
    /// directory.
    ///
    /// # Errors
    /// - `CompressionFailed` when re-encoding fails under [`CompressionPolicy::FailFast`]
    pub async fn prepare_for_upload(&self, path: &Path, provider: &Provider) -> Result<PathBuf> {
        let size = match ImageIOService::file_size(path).await {
            Some(size) if size > provider.max_upload_bytes => size,
            _ => return Ok(path.to_path_buf()),
        };

        info!(
            path = %path.display(),
            size,
            limit = provider.max_upload_bytes,
            "Compressing image"
        );

        match self.compress(path).await {
            Ok(compressed) => {
                info!(path = %compressed.display(), "Image compressed");
                Ok(compressed)
            },
            Err(e) => match self.policy {
                CompressionPolicy::BestEffort => {
                    warn!(error = %e, "Compression failed, uploading original image");
                    Ok(path.to_path_buf())
                },
                CompressionPolicy::FailFast => Err(match e {
                    RemovalError::CompressionFailed(_) => e,
                    other => RemovalError::compression(other.to_string()),
                }),
            },
        }
    }

    async fn compress(&self, path: &Path) -> Result<PathBuf> {
        let source = path.to_path_buf();
        let settings = self.settings;

        let encoded = tokio::task::spawn_blocking(move || -> Result<Vec<u8>> {
            let image = ImageIOService::load_image(&source)?;
            let resized = downscale_to_width(image, settings.max_width);
            ImageIOService::encode_jpeg(&resized, settings.jpeg_quality)
        })
        .await
        .map_err(|e| RemovalError::compression(format!("Compression task failed: {}", e)))??;

        tokio::fs::create_dir_all(&self.scratch_dir)
            .await
            .map_err(|e| {
                RemovalError::file_io_error("create scratch directory", &self.scratch_dir, &e)
            })?;

        create_unique_file(
            &self.scratch_dir,
            |millis| format!("{}{}.jpg", SCRATCH_PREFIX, millis),
            &encoded,
        )
        .await
    }

    /// Whether a path was produced by this preparer
    #[must_use]
    pub fn is_scratch_file(&self, path: &Path) -> bool {
        path.starts_with(&self.scratch_dir)
            && path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(SCRATCH_PREFIX))
    }
}

/// Shrink so width ≤ `max_width`, keeping aspect ratio; never upscales
fn downscale_to_width(image: DynamicImage, max_width: u32) -> DynamicImage {
    let (width, height) = (image.width(), image.height());
    if width <= max_width {
        return image;
    }

    let new_height = ((u64::from(height) * u64::from(max_width)) / u64::from(width)).max(1) as u32;
    image.resize_exact(max_width, new_height, FilterType::Triangle)
}
