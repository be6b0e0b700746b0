//! snapcut CLI
//!
//! Command-line interface for removing photo backgrounds through a hosted provider.

use super::config::{CliConfigBuilder, RemoveArgs};
use super::progress::SpinnerProgressReporter;
use crate::{
    processor::BackgroundRemovalService,
    providers::ProviderRegistry,
    services::{format_size, ConsoleProgressReporter, Gallery, OutputStorage, ProgressReporter},
    settings::{ConfigStore, JsonFileStore},
    tracing_config::TracingFormat,
};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Remove photo backgrounds with remove.bg, Photroom or Clipdrop
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "snapcut")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging (-v: DEBUG, -vv: TRACE including HTTP internals)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log output format; non-console formats replace the spinner with log lines
    #[arg(long, value_enum, default_value_t = CliLogFormat::Console, global = true)]
    pub log_format: CliLogFormat,

    /// Directory holding processed images [default: <data dir>/snapcut/documents]
    #[arg(long, value_name = "PATH", global = true, env = "SNAPCUT_DOCUMENT_DIR")]
    pub document_dir: Option<PathBuf>,

    /// Settings file [default: <config dir>/snapcut/settings.json]
    #[arg(long, value_name = "FILE", global = true)]
    pub settings: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Remove the background of an image
    Remove {
        /// Input image
        #[arg(value_name = "IMAGE")]
        image: PathBuf,

        /// Result size requested from the provider
        #[arg(long, value_enum, default_value_t = CliOutputSize::Auto)]
        size: CliOutputSize,

        /// Result format [default: png]
        #[arg(short, long, value_enum)]
        format: Option<CliResultFormat>,

        /// Use this provider for this run only
        #[arg(short, long)]
        provider: Option<String>,

        /// Fail when an oversized image cannot be compressed instead of uploading it as is
        #[arg(long)]
        fail_fast_compression: bool,

        /// Request timeout in seconds [default: none]
        #[arg(long, value_name = "SECONDS")]
        timeout: Option<u64>,
    },

    /// Manage the API key and provider selection
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// List available providers
    Providers,

    /// Browse processed images
    Gallery {
        #[command(subcommand)]
        command: GalleryCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Save the API key, optionally switching provider
    Set {
        /// Provider API key
        #[arg(long, env = "SNAPCUT_API_KEY", hide_env_values = true)]
        api_key: String,

        /// Provider name (e.g. "Photroom")
        #[arg(short, long)]
        provider: Option<String>,
    },
    /// Show the active provider and whether a key is set
    Show,
    /// Forget the saved API key
    Clear,
}

#[derive(Subcommand, Debug)]
pub enum GalleryCommand {
    /// List processed images, newest first
    List,
    /// Delete a processed image by file name
    Delete {
        /// File name, e.g. processed_1700000000000.png
        name: String,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, Default, ValueEnum, Debug)]
pub enum CliOutputSize {
    #[default]
    Auto,
    Hd,
    #[value(name = "4k")]
    FourK,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum CliResultFormat {
    Png,
    Jpg,
}

#[derive(Copy, Clone, PartialEq, Eq, Default, ValueEnum, Debug)]
pub enum CliLogFormat {
    /// Colored output with a progress spinner
    #[default]
    Console,
    /// Plain output for CI and pipes
    Compact,
    /// JSON lines (requires the `tracing-json` feature)
    Json,
}

impl CliLogFormat {
    fn tracing_format(self) -> Result<TracingFormat> {
        match self {
            CliLogFormat::Console => Ok(TracingFormat::Console),
            CliLogFormat::Compact => Ok(TracingFormat::Compact),
            #[cfg(feature = "tracing-json")]
            CliLogFormat::Json => Ok(TracingFormat::Json),
            #[cfg(not(feature = "tracing-json"))]
            CliLogFormat::Json => {
                anyhow::bail!("JSON logs need snapcut built with the `tracing-json` feature")
            },
        }
    }

    /// The spinner only makes sense next to human-readable console logs
    fn progress_reporter(self, verbose: bool) -> Box<dyn ProgressReporter> {
        match self {
            CliLogFormat::Console => Box::new(SpinnerProgressReporter::new()),
            CliLogFormat::Compact | CliLogFormat::Json => {
                Box::new(ConsoleProgressReporter::new(verbose))
            },
        }
    }
}

pub async fn main() -> Result<()> {
    let cli = Cli::parse();

    crate::tracing_config::init_cli_tracing(cli.verbose, cli.log_format.tracing_format()?)
        .context("Failed to initialize tracing")?;
    debug!(verbosity = cli.verbose, format = ?cli.log_format, "Tracing initialized");

    let config = open_config_store(cli.settings.clone()).await?;

    match cli.command {
        Commands::Remove {
            image,
            size,
            format,
            provider,
            fail_fast_compression,
            timeout,
        } => {
            let args = RemoveArgs {
                size,
                format,
                fail_fast_compression,
                timeout_secs: timeout,
            };
            let reporter = cli.log_format.progress_reporter(cli.verbose > 0);
            remove(config, cli.document_dir, image, provider, &args, reporter).await
        },
        Commands::Config { command } => match command {
            ConfigCommand::Set { api_key, provider } => {
                config_set(&config, &api_key, provider.as_deref()).await
            },
            ConfigCommand::Show => {
                config_show(&config);
                Ok(())
            },
            ConfigCommand::Clear => {
                config.clear_credential().await.context("Failed to clear API key")?;
                println!("🗑️  API key removed");
                Ok(())
            },
        },
        Commands::Providers => {
            show_providers(&config);
            Ok(())
        },
        Commands::Gallery { command } => {
            let dir = OutputStorage::new(cli.document_dir)
                .resolve_document_dir()
                .context("Cannot locate the document directory")?;
            let gallery = Gallery::new(dir);
            match command {
                GalleryCommand::List => gallery_list(&gallery).await,
                GalleryCommand::Delete { name } => gallery_delete(&gallery, &name).await,
            }
        },
    }
}

async fn open_config_store(settings: Option<PathBuf>) -> Result<Arc<ConfigStore>> {
    let storage = match settings {
        Some(path) => JsonFileStore::new(path),
        None => JsonFileStore::at_default_location().context("Cannot locate the settings file")?,
    };
    info!("Using settings at {}", storage.path().display());

    let config = ConfigStore::new(ProviderRegistry::builtin(), Arc::new(storage));
    config.load_saved_config().await;
    Ok(Arc::new(config))
}

async fn remove(
    config: Arc<ConfigStore>,
    document_dir: Option<PathBuf>,
    image: PathBuf,
    provider: Option<String>,
    args: &RemoveArgs,
    reporter: Box<dyn ProgressReporter>,
) -> Result<()> {
    if let Some(name) = provider {
        if !config.select_provider(&name) {
            anyhow::bail!(
                "Unknown provider '{}'. Available: {}",
                name,
                config.registry().names().join(", ")
            );
        }
    }

    let service_config = CliConfigBuilder::service_config(args, document_dir)?;
    let options = CliConfigBuilder::removal_options(args);
    let service = BackgroundRemovalService::new(config, service_config)
        .context("Failed to create removal service")?
        .with_progress_reporter(reporter);

    match service.remove_background(&image, &options).await {
        Ok(processed) => {
            println!("✅ Background removed with {}", processed.provider);
            println!("   Saved: {}", processed.output_path.display());
            println!(
                "   Size: {} in {:.1}s",
                format_size(processed.bytes_written),
                processed.elapsed.as_secs_f64()
            );
            Ok(())
        },
        Err(e) => {
            let guidance = e.user_guidance();
            Err(anyhow::Error::new(e).context(guidance))
        },
    }
}

async fn config_set(config: &ConfigStore, api_key: &str, provider: Option<&str>) -> Result<()> {
    let api_key = api_key.trim();
    if api_key.is_empty() {
        anyhow::bail!("API key must not be empty");
    }

    if let Some(name) = provider {
        if config.registry().find_by_name(name).is_none() {
            anyhow::bail!(
                "Unknown provider '{}'. Available: {}",
                name,
                config.registry().names().join(", ")
            );
        }
    }

    config
        .set_credential(api_key, provider)
        .await
        .context("Failed to save configuration")?;

    println!("✅ Configuration saved");
    println!("   Provider: {}", config.current_provider().name);
    println!("   Settings: {}", config.storage_location());
    Ok(())
}

fn config_show(config: &ConfigStore) {
    println!("⚙️  Configuration");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Provider: {}", config.current_provider().name);
    println!(
        "API key:  {}",
        if config.is_configured() { "set" } else { "not set" }
    );
    println!("Settings: {}", config.storage_location());
}

fn show_providers(config: &ConfigStore) {
    let active = config.current_provider();
    println!("🔌 Providers");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for provider in config.providers() {
        let marker = if provider.name == active.name { "▶" } else { " " };
        println!("{} {}", marker, provider.name);
        println!("  └─ Endpoint: {}", provider.endpoint);
        println!("  └─ Max upload: {}", format_size(provider.max_upload_bytes));
        println!("  └─ Formats: {}", provider.supported_formats.join(", "));
    }
}

async fn gallery_list(gallery: &Gallery) -> Result<()> {
    let entries = gallery.list().await.context("Failed to list processed images")?;

    println!("🖼️  Processed images in {}", gallery.dir().display());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    if entries.is_empty() {
        println!("No processed images found.");
        println!("\n💡 To create one, use:");
        println!("  snapcut remove photo.jpg");
        return Ok(());
    }

    for entry in &entries {
        let modified = entry.modified.map_or_else(
            || "unknown".to_string(),
            |m| m.format("%Y-%m-%d %H:%M:%S").to_string(),
        );
        println!(
            "{}  {:>10}  {}",
            modified,
            format_size(entry.size_bytes),
            entry.name
        );
    }
    Ok(())
}

async fn gallery_delete(gallery: &Gallery, name: &str) -> Result<()> {
    if gallery.delete(name).await.context("Failed to delete image")? {
        println!("🗑️  Deleted {}", name);
    } else {
        println!("⚠️  {} was already gone", name);
    }
    Ok(())
}
