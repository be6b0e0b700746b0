//! Progress reporting service
//!
//! Stage notifications for the presentation layer; the orchestrator never
//! prints anything itself.

use instant::Instant;
use std::time::Duration;

/// Stages of one background removal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalStage {
    /// Checking credential, path and upload size
    Validating,
    /// Shrinking an oversized image
    Compressing,
    /// Waiting for the provider
    Uploading,
    /// Writing the result to the document directory
    Saving,
    /// Result stored
    Completed,
}

impl RemovalStage {
    /// Get a human-readable description of the stage
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            RemovalStage::Validating => "Validating image",
            RemovalStage::Compressing => "Compressing image",
            RemovalStage::Uploading => "Removing background",
            RemovalStage::Saving => "Saving result",
            RemovalStage::Completed => "Background removed",
        }
    }

    /// Get the typical progress percentage for this stage
    #[must_use]
    pub fn progress_percentage(&self) -> u8 {
        match self {
            RemovalStage::Validating => 5,
            RemovalStage::Compressing => 15,
            RemovalStage::Uploading => 30,
            RemovalStage::Saving => 95,
            RemovalStage::Completed => 100,
        }
    }
}

/// Progress update containing stage and timing information
#[derive(Debug, Clone)]
pub struct ProgressUpdate {
    /// Current stage
    pub stage: RemovalStage,
    /// Progress percentage (0-100)
    pub progress: u8,
    /// Provider handling the removal
    pub provider: String,
    /// Elapsed time since the removal started
    pub elapsed: Duration,
}

impl ProgressUpdate {
    #[must_use]
    pub fn new(stage: RemovalStage, provider: &str, start_time: Instant) -> Self {
        Self {
            progress: stage.progress_percentage(),
            provider: provider.to_string(),
            elapsed: start_time.elapsed(),
            stage,
        }
    }
}

/// Receives stage notifications from the removal service
pub trait ProgressReporter: Send + Sync {
    /// A new stage started
    fn report_progress(&self, update: ProgressUpdate);

    /// The removal failed during `stage`
    fn report_error(&self, stage: RemovalStage, error: &crate::error::RemovalError);
}

/// Reporter that ignores every notification
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpProgressReporter;

impl ProgressReporter for NoOpProgressReporter {
    fn report_progress(&self, _update: ProgressUpdate) {}

    fn report_error(&self, _stage: RemovalStage, _error: &crate::error::RemovalError) {}
}

/// Reporter that forwards notifications to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleProgressReporter {
    verbose: bool,
}

impl ConsoleProgressReporter {
    #[must_use]
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl ProgressReporter for ConsoleProgressReporter {
    fn report_progress(&self, update: ProgressUpdate) {
        if self.verbose {
            log::info!(
                "[{}%] {} via {} ({}ms elapsed)",
                update.progress,
                update.stage.description(),
                update.provider,
                update.elapsed.as_millis()
            );
        } else {
            log::info!("[{}%] {}", update.progress, update.stage.description());
        }
    }

    fn report_error(&self, stage: RemovalStage, error: &crate::error::RemovalError) {
        log::error!("❌ Error during {}: {}", stage.description(), error);
    }
}
