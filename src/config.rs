//! Configuration types for background removal operations

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Result size requested from the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputSize {
    /// Provider picks the largest size the plan allows
    #[default]
    Auto,
    /// HD resolution (up to 4 megapixels)
    Hd,
    /// Full resolution (up to 10 megapixels)
    #[serde(rename = "4k")]
    FourK,
}

impl OutputSize {
    /// Form value understood by the providers
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Hd => "hd",
            Self::FourK => "4k",
        }
    }
}

impl std::fmt::Display for OutputSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Encoding of the stored result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultFormat {
    /// PNG with alpha channel transparency
    #[default]
    Png,
    /// JPEG (no transparency)
    Jpg,
}

impl ResultFormat {
    /// File extension without the dot
    #[must_use]
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpg => "jpg",
        }
    }
}

/// Per-call options for one removal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RemovalOptions {
    /// Requested result size
    pub size: OutputSize,
    /// Requested result encoding; `None` lets the provider decide (stored as PNG)
    pub format: Option<ResultFormat>,
}

impl RemovalOptions {
    #[must_use]
    pub fn with_size(mut self, size: OutputSize) -> Self {
        self.size = size;
        self
    }

    #[must_use]
    pub fn with_format(mut self, format: ResultFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// Extension of the stored result file
    #[must_use]
    pub fn output_extension(&self) -> &'static str {
        self.format.unwrap_or_default().extension()
    }
}

/// Downscaling applied to uploads above the provider's ceiling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompressionSettings {
    /// Widest allowed result, aspect ratio preserved
    pub max_width: u32,
    /// JPEG quality (1-100)
    pub jpeg_quality: u8,
}

impl Default for CompressionSettings {
    fn default() -> Self {
        Self {
            max_width: 1024,
            jpeg_quality: 70,
        }
    }
}

/// What to do when re-encoding an oversized upload fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CompressionPolicy {
    /// Log and upload the original file
    #[default]
    BestEffort,
    /// Abort the removal with `CompressionFailed`
    FailFast,
}

/// Runtime configuration of the removal service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Where results are written; `None` resolves the platform default
    pub document_dir: Option<PathBuf>,

    /// Where compressed uploads are staged
    pub scratch_dir: PathBuf,

    /// Downscaling parameters for oversized uploads
    pub compression: CompressionSettings,

    /// Behaviour when compression fails
    pub compression_policy: CompressionPolicy,

    /// Whole-request timeout; `None` keeps the transport default
    pub request_timeout: Option<Duration>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            document_dir: None,
            scratch_dir: std::env::temp_dir().join("snapcut"),
            compression: CompressionSettings::default(),
            compression_policy: CompressionPolicy::default(),
            request_timeout: None,
        }
    }
}

impl ServiceConfig {
    /// Create a new configuration builder
    ///
    /// # Examples
    /// ```rust
    /// use snapcut::{CompressionPolicy, ServiceConfig};
    ///
    /// let config = ServiceConfig::builder()
    ///     .document_dir("/tmp/snapcut-docs")
    ///     .compression_policy(CompressionPolicy::FailFast)
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(config.compression.max_width, 1024);
    /// ```
    #[must_use]
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder::default()
    }

    /// Validate all configuration parameters
    ///
    /// # Errors
    /// - JPEG quality outside 1-100
    /// - Zero maximum width
    pub fn validate(&self) -> crate::Result<()> {
        if self.compression.jpeg_quality == 0 || self.compression.jpeg_quality > 100 {
            return Err(crate::error::RemovalError::invalid_config(format!(
                "Invalid JPEG quality: {} (valid range: 1-100). Recommended: 70",
                self.compression.jpeg_quality
            )));
        }

        if self.compression.max_width == 0 {
            return Err(crate::error::RemovalError::invalid_config(
                "Invalid maximum width: 0 (must be positive). Recommended: 1024",
            ));
        }

        Ok(())
    }
}

/// Builder for `ServiceConfig`
#[derive(Debug, Default)]
pub struct ServiceConfigBuilder {
    config: ServiceConfig,
}

impl ServiceConfigBuilder {
    /// Set the result directory
    #[must_use]
    pub fn document_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.config.document_dir = Some(dir.into());
        self
    }

    /// Set the staging directory for compressed uploads
    #[must_use]
    pub fn scratch_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.config.scratch_dir = dir.into();
        self
    }

    /// Set the widest allowed compressed upload
    #[must_use]
    pub fn max_width(mut self, width: u32) -> Self {
        self.config.compression.max_width = width;
        self
    }

    /// Set JPEG quality of compressed uploads
    #[must_use]
    pub fn jpeg_quality(mut self, quality: u8) -> Self {
        self.config.compression.jpeg_quality = quality.min(100);
        self
    }

    /// Set the compression failure policy
    #[must_use]
    pub fn compression_policy(mut self, policy: CompressionPolicy) -> Self {
        self.config.compression_policy = policy;
        self
    }

    /// Set a whole-request timeout
    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = Some(timeout);
        self
    }

    /// Build and validate the configuration
    ///
    /// # Errors
    /// - Any parameter fails [`ServiceConfig::validate`]
    pub fn build(self) -> crate::Result<ServiceConfig> {
        let config = self.config;
        config.validate()?;
        Ok(config)
    }
}
