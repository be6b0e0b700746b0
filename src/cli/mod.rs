//! CLI module for the snapcut library
//!
//! This module is only available when the "cli" feature is enabled.

mod config;
#[path = "main.rs"]
mod main_impl;
mod progress;

pub use main_impl::{
    main, Cli, CliLogFormat, CliOutputSize, CliResultFormat, Commands, ConfigCommand,
    GalleryCommand,
};
pub use progress::SpinnerProgressReporter;
