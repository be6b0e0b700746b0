//! Services supporting the removal orchestrator

pub mod gallery;
pub mod io;
pub mod precondition;
pub mod progress;

pub use gallery::{format_size, Gallery, GalleryEntry};
pub use io::{ImageIOService, OutputStorage};
pub use precondition::UploadPreparer;
pub use progress::{
    ConsoleProgressReporter, NoOpProgressReporter, ProgressReporter, ProgressUpdate, RemovalStage,
};
