//! Configuration conversion utilities for CLI arguments

use crate::cli::main_impl::{CliOutputSize, CliResultFormat};
use crate::config::{CompressionPolicy, OutputSize, RemovalOptions, ResultFormat, ServiceConfig};
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Arguments of `snapcut remove` that shape the service and the request
#[derive(Debug, Clone, Default)]
pub(crate) struct RemoveArgs {
    pub(crate) size: CliOutputSize,
    pub(crate) format: Option<CliResultFormat>,
    pub(crate) fail_fast_compression: bool,
    pub(crate) timeout_secs: Option<u64>,
}

/// Convert CLI arguments to library configuration
pub(crate) struct CliConfigBuilder;

impl CliConfigBuilder {
    /// Build the service configuration
    pub(crate) fn service_config(
        args: &RemoveArgs,
        document_dir: Option<PathBuf>,
    ) -> Result<ServiceConfig> {
        let policy = if args.fail_fast_compression {
            CompressionPolicy::FailFast
        } else {
            CompressionPolicy::BestEffort
        };
        let mut builder = ServiceConfig::builder().compression_policy(policy);

        if let Some(dir) = document_dir {
            builder = builder.document_dir(dir);
        }

        if let Some(secs) = args.timeout_secs {
            if secs == 0 {
                anyhow::bail!("Timeout must be at least one second");
            }
            builder = builder.request_timeout(Duration::from_secs(secs));
        }

        builder.build().context("Invalid service configuration")
    }

    /// Build the per-call removal options
    pub(crate) fn removal_options(args: &RemoveArgs) -> RemovalOptions {
        let options = RemovalOptions::default().with_size(match args.size {
            CliOutputSize::Auto => OutputSize::Auto,
            CliOutputSize::Hd => OutputSize::Hd,
            CliOutputSize::FourK => OutputSize::FourK,
        });

        match args.format {
            Some(CliResultFormat::Png) => options.with_format(ResultFormat::Png),
            Some(CliResultFormat::Jpg) => options.with_format(ResultFormat::Jpg),
            None => options,
        }
    }
}
