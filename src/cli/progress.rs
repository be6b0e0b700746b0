//! Terminal spinner for a running removal

use crate::error::RemovalError;
use crate::services::{ProgressReporter, ProgressUpdate, RemovalStage};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Shows the current stage next to a spinner on stderr
pub struct SpinnerProgressReporter {
    bar: ProgressBar,
}

impl SpinnerProgressReporter {
    #[must_use]
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar }
    }

    /// Hidden spinner, for `--quiet` style runs and tests
    #[must_use]
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }
}

impl Default for SpinnerProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for SpinnerProgressReporter {
    fn report_progress(&self, update: ProgressUpdate) {
        match update.stage {
            RemovalStage::Completed => self.bar.finish_and_clear(),
            stage => self
                .bar
                .set_message(format!("{} ({})", stage.description(), update.provider)),
        }
    }

    fn report_error(&self, stage: RemovalStage, error: &RemovalError) {
        self.bar
            .abandon_with_message(format!("❌ {} failed: {}", stage.description(), error.kind()));
    }
}
