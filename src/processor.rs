//! Background removal orchestrator
//!
//! [`BackgroundRemovalService`] runs one removal end to end: configuration
//! snapshot, input checks, optional shrinking, a single provider request and
//! storage of the returned bytes. Every failure comes back as a
//! [`RemovalError`]; nothing panics across this boundary.

use crate::{
    backends::BackendRegistry,
    config::{RemovalOptions, ServiceConfig},
    error::{RemovalError, Result},
    providers::Provider,
    services::{
        NoOpProgressReporter, OutputStorage, ProgressReporter, ProgressUpdate, RemovalStage,
        UploadPreparer,
    },
    settings::ConfigStore,
};
use instant::Instant;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// A stored background-removal result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedImage {
    /// Where the result was written
    pub output_path: PathBuf,
    /// Provider that produced it
    pub provider: String,
    /// Size of the stored file
    pub bytes_written: u64,
    /// Wall time of the whole removal
    pub elapsed: Duration,
}

/// Outcome of one removal; the error carries the taxonomy tag via [`RemovalError::kind`]
pub type RemovalResult = std::result::Result<ProcessedImage, RemovalError>;

/// Sends images to the active provider and stores the results
pub struct BackgroundRemovalService {
    config: Arc<ConfigStore>,
    backends: BackendRegistry,
    preparer: UploadPreparer,
    client: reqwest::Client,
    storage: OutputStorage,
    reporter: Box<dyn ProgressReporter>,
}

impl std::fmt::Debug for BackgroundRemovalService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackgroundRemovalService")
            .field("config", &self.config)
            .field("backends", &self.backends)
            .field("preparer", &self.preparer)
            .field("storage", &self.storage)
            .finish_non_exhaustive()
    }
}

impl BackgroundRemovalService {
    /// Create a service with the built-in backends and no progress reporting
    ///
    /// # Errors
    /// - `InvalidConfig` when `service_config` fails validation
    /// - `Network` when the HTTP client cannot be created
    pub fn new(config: Arc<ConfigStore>, service_config: ServiceConfig) -> Result<Self> {
        service_config.validate()?;

        let mut client_builder = reqwest::Client::builder();
        if let Some(timeout) = service_config.request_timeout {
            client_builder = client_builder.timeout(timeout);
        }
        let client = client_builder
            .build()
            .map_err(|e| RemovalError::network_error("Failed to create HTTP client", e))?;

        Ok(Self {
            config,
            backends: BackendRegistry::builtin(),
            preparer: UploadPreparer::new(
                service_config.compression,
                service_config.compression_policy,
                service_config.scratch_dir,
            ),
            client,
            storage: OutputStorage::new(service_config.document_dir),
            reporter: Box::new(NoOpProgressReporter),
        })
    }

    /// Replace the request builders
    #[must_use]
    pub fn with_backends(mut self, backends: BackendRegistry) -> Self {
        self.backends = backends;
        self
    }

    /// Receive stage notifications
    #[must_use]
    pub fn with_progress_reporter(mut self, reporter: Box<dyn ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Remove the background of the image at `path`
    ///
    /// Steps run in order and stop at the first failure: credential check,
    /// path check, size validation, preparation, one provider request, empty
    /// body check and storage. The provider and credential are read once at
    /// the start, so configuration changes made meanwhile do not affect this
    /// call.
    #[instrument(skip(self, path, options), fields(path = %path.display(), size = %options.size))]
    pub async fn remove_background(&self, path: &Path, options: &RemovalOptions) -> RemovalResult {
        let start = Instant::now();
        let mut stage = RemovalStage::Validating;

        match self.run(path, options, start, &mut stage).await {
            Ok(processed) => {
                info!(
                    provider = %processed.provider,
                    output = %processed.output_path.display(),
                    elapsed_ms = processed.elapsed.as_millis() as u64,
                    "✅ Background removed"
                );
                Ok(processed)
            },
            Err(e) => {
                warn!(stage = ?stage, kind = %e.kind(), error = %e, "Background removal failed");
                self.reporter.report_error(stage, &e);
                Err(e)
            },
        }
    }

    async fn run(
        &self,
        path: &Path,
        options: &RemovalOptions,
        start: Instant,
        stage: &mut RemovalStage,
    ) -> RemovalResult {
        let active = self.config.snapshot().ok_or(RemovalError::NotConfigured)?;
        let provider = &active.provider;
        self.enter(stage, RemovalStage::Validating, provider, start);

        if path.as_os_str().to_string_lossy().trim().is_empty() {
            return Err(RemovalError::invalid_input("Image path is empty"));
        }

        self.preparer.validate(path, provider).await?;

        self.enter(stage, RemovalStage::Compressing, provider, start);
        let upload_path = self.preparer.prepare_for_upload(path, provider).await?;

        self.enter(stage, RemovalStage::Uploading, provider, start);
        let sent = self
            .upload(&upload_path, provider, &active.credential, options)
            .await;

        if upload_path != path && self.preparer.is_scratch_file(&upload_path) {
            if let Err(e) = tokio::fs::remove_file(&upload_path).await {
                debug!(path = %upload_path.display(), error = %e, "Could not remove scratch file");
            }
        }

        let body = sent?;
        if body.is_empty() {
            return Err(RemovalError::EmptyResponse {
                provider: provider.name.clone(),
            });
        }

        self.enter(stage, RemovalStage::Saving, provider, start);
        let output_path = self
            .storage
            .write_output(&body, options.output_extension())
            .await?;

        self.enter(stage, RemovalStage::Completed, provider, start);
        Ok(ProcessedImage {
            output_path,
            provider: provider.name.clone(),
            bytes_written: body.len() as u64,
            elapsed: start.elapsed(),
        })
    }

    /// Send the image once and return the response body of a 2xx answer
    async fn upload(
        &self,
        path: &Path,
        provider: &Provider,
        credential: &str,
        options: &RemovalOptions,
    ) -> Result<Vec<u8>> {
        let backend = self.backends.get(&provider.name)?;

        let image_bytes = tokio::fs::read(path)
            .await
            .map_err(|e| RemovalError::file_io_error("read upload", path, &e))?;
        debug!(
            provider = %provider.name,
            endpoint = %provider.endpoint,
            bytes = image_bytes.len(),
            "Uploading image"
        );

        let request =
            backend.build_upload_request(&self.client, provider, image_bytes, credential, options)?;

        let response = self.client.execute(request).await.map_err(|e| {
            RemovalError::network_error(format!("POST {}", provider.endpoint), e)
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.map_err(|e| {
                RemovalError::network_error(
                    format!("Reading error response from {}", provider.name),
                    e,
                )
            })?;
            return Err(RemovalError::ProviderError {
                provider: provider.name.clone(),
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await.map_err(|e| {
            RemovalError::network_error(format!("Reading response from {}", provider.name), e)
        })?;
        debug!(provider = %provider.name, bytes = bytes.len(), "Received response");
        Ok(bytes.to_vec())
    }

    fn enter(
        &self,
        current: &mut RemovalStage,
        next: RemovalStage,
        provider: &Provider,
        start: Instant,
    ) {
        *current = next;
        self.reporter
            .report_progress(ProgressUpdate::new(next, &provider.name, start));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[derive(Default)]
    struct RecordingReporter {
        stages: Mutex<Vec<RemovalStage>>,
        failures: Mutex<Vec<(RemovalStage, ErrorKind)>>,
    }

    impl ProgressReporter for Arc<RecordingReporter> {
        fn report_progress(&self, update: ProgressUpdate) {
            self.stages.lock().unwrap().push(update.stage);
        }

        fn report_error(&self, stage: RemovalStage, error: &RemovalError) {
            self.failures.lock().unwrap().push((stage, error.kind()));
        }
    }

    fn service(temp_dir: &TempDir, config: Arc<ConfigStore>) -> BackgroundRemovalService {
        let service_config = ServiceConfig::builder()
            .document_dir(temp_dir.path().join("docs"))
            .scratch_dir(temp_dir.path().join("scratch"))
            .build()
            .unwrap();
        BackgroundRemovalService::new(config, service_config).unwrap()
    }

    #[tokio::test]
    async fn test_not_configured_comes_first() {
        let temp_dir = TempDir::new().unwrap();
        let service = service(&temp_dir, Arc::new(ConfigStore::in_memory()));

        // Even a blank path reports the missing credential first
        let err = service
            .remove_background(Path::new(""), &RemovalOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotConfigured);
    }

    #[tokio::test]
    async fn test_blank_path() {
        let temp_dir = TempDir::new().unwrap();
        let config = Arc::new(ConfigStore::in_memory());
        config.set_credential("key", None).await.unwrap();
        let service = service(&temp_dir, config);

        for blank in ["", "   "] {
            let err = service
                .remove_background(Path::new(blank), &RemovalOptions::default())
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInput);
        }
    }

    #[tokio::test]
    async fn test_missing_file_is_reported_at_validation() {
        let temp_dir = TempDir::new().unwrap();
        let config = Arc::new(ConfigStore::in_memory());
        config.set_credential("key", None).await.unwrap();

        let reporter = Arc::new(RecordingReporter::default());
        let service =
            service(&temp_dir, config).with_progress_reporter(Box::new(Arc::clone(&reporter)));

        let err = service
            .remove_background(&temp_dir.path().join("gone.jpg"), &RemovalOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FileNotFound);
        assert_eq!(*reporter.stages.lock().unwrap(), vec![RemovalStage::Validating]);
        assert_eq!(
            *reporter.failures.lock().unwrap(),
            vec![(RemovalStage::Validating, ErrorKind::FileNotFound)]
        );
        assert!(!temp_dir.path().join("docs").exists());
    }

    #[tokio::test]
    async fn test_unregistered_backend() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("photo.jpg");
        std::fs::write(&input, b"jpeg bytes").unwrap();

        let config = Arc::new(ConfigStore::in_memory());
        config.set_credential("key", None).await.unwrap();
        let service = service(&temp_dir, config).with_backends(BackendRegistry::empty());

        let err = service
            .remove_background(&input, &RemovalOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedProvider);
        assert_eq!(err.to_string(), "Unsupported provider: Remove.bg");
    }

    #[test]
    fn test_invalid_service_config_is_rejected() {
        let service_config = ServiceConfig {
            compression: crate::config::CompressionSettings {
                max_width: 0,
                jpeg_quality: 70,
            },
            ..ServiceConfig::default()
        };
        let result =
            BackgroundRemovalService::new(Arc::new(ConfigStore::in_memory()), service_config);
        assert!(matches!(result, Err(RemovalError::InvalidConfig(_))));
    }
}
