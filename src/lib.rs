#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::unused_async)]

//! # snapcut
//!
//! Background removal through hosted provider APIs.
//!
//! A captured photo is checked against the active provider's upload ceiling,
//! sent once as a multipart upload, and the returned cut-out is written to a
//! local document directory as `processed_<unix_millis>.png`.
//!
//! ## Features
//!
//! - **Providers**: remove.bg, Photroom and Clipdrop, each with its own request builder
//! - **Persistent configuration**: API key and provider selection stored as JSON
//! - **Upload preconditions**: size validation with optional JPEG downscaling
//! - **Typed failures**: every error carries a stable [`ErrorKind`] tag
//! - **Gallery**: list and delete stored results
//! - **CLI Integration**: optional command-line interface (enable with `cli` feature)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use snapcut::{BackgroundRemovalService, ConfigStore, RemovalOptions, ServiceConfig};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = Arc::new(ConfigStore::in_memory());
//! config.set_credential("my-api-key", Some("Photroom")).await?;
//!
//! let service = BackgroundRemovalService::new(Arc::clone(&config), ServiceConfig::default())?;
//! match service.remove_background(Path::new("photo.jpg"), &RemovalOptions::default()).await {
//!     Ok(processed) => println!("Saved {}", processed.output_path.display()),
//!     Err(e) => eprintln!("{} ({})", e.user_guidance(), e.kind()),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ### Feature Flags
//!
//! - `cli` (default): command-line interface and progress spinner
//! - `webp-support` (default): WebP decoding for oversized uploads
//! - `tracing-json`: JSON log output for the CLI

pub mod backends;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod processor;
pub mod providers;
pub mod services;
pub mod settings;
#[cfg(feature = "cli")]
pub mod tracing_config;

// Public API exports
pub use backends::{BackendRegistry, ProviderBackend};
pub use config::{
    CompressionPolicy, CompressionSettings, OutputSize, RemovalOptions, ResultFormat,
    ServiceConfig, ServiceConfigBuilder,
};
pub use error::{ErrorKind, RemovalError, Result};
pub use processor::{BackgroundRemovalService, ProcessedImage, RemovalResult};
pub use providers::{Provider, ProviderRegistry};
pub use services::{
    format_size, ConsoleProgressReporter, Gallery, GalleryEntry, NoOpProgressReporter,
    OutputStorage, ProgressReporter, ProgressUpdate, RemovalStage, UploadPreparer,
};
pub use settings::{ActiveConfig, ConfigStore, JsonFileStore, KeyValueStore, MemoryStore};

#[cfg(feature = "cli")]
pub use tracing_config::{init_cli_tracing, TracingConfig, TracingFormat};
