//! Error types for background removal operations

use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for background removal operations
pub type Result<T> = std::result::Result<T, RemovalError>;

/// Comprehensive error types for background removal operations
#[derive(Error, Debug)]
pub enum RemovalError {
    /// No API credential has been configured
    #[error("API key not configured")]
    NotConfigured,

    /// The caller supplied an unusable argument (blank path, bad name)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Input image does not exist
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Input image exceeds the active provider's upload ceiling
    #[error(
        "File too large: {} is {size} bytes, {provider} accepts at most {limit} bytes",
        .path.display()
    )]
    TooLarge {
        path: PathBuf,
        size: u64,
        limit: u64,
        provider: String,
    },

    /// Re-encoding an oversized image failed and the policy forbids falling back
    #[error("Compression failed: {0}")]
    CompressionFailed(String),

    /// No request builder is registered for the active provider
    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),

    /// The provider answered with a non-success status
    #[error("{provider} error (HTTP {status}): {body}")]
    ProviderError {
        provider: String,
        status: u16,
        body: String,
    },

    /// Transport-level failure talking to the provider
    #[error("Network error: {0}")]
    Network(String),

    /// The provider answered 2xx with a zero-length body
    #[error("Empty response from {provider}")]
    EmptyResponse { provider: String },

    /// The document directory could not be resolved
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Invalid configuration or parameters
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Reading or writing persisted settings failed
    #[error("Settings storage error: {0}")]
    Persistence(String),

    /// Input/output errors (permission denied, disk full, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error for unexpected conditions
    #[error("Unexpected error: {0}")]
    Unknown(String),
}

/// Stable taxonomy tag for a [`RemovalError`]
///
/// Callers branch on this rather than on message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotConfigured,
    InvalidInput,
    FileNotFound,
    TooLarge,
    CompressionFailed,
    UnsupportedProvider,
    ProviderError,
    Network,
    EmptyResponse,
    StorageUnavailable,
    Unknown,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            Self::NotConfigured => "NotConfigured",
            Self::InvalidInput => "InvalidInput",
            Self::FileNotFound => "FileNotFound",
            Self::TooLarge => "TooLarge",
            Self::CompressionFailed => "CompressionFailed",
            Self::UnsupportedProvider => "UnsupportedProvider",
            Self::ProviderError => "ProviderError",
            Self::Network => "Network",
            Self::EmptyResponse => "EmptyResponse",
            Self::StorageUnavailable => "StorageUnavailable",
            Self::Unknown => "Unknown",
        };
        f.write_str(tag)
    }
}

impl RemovalError {
    /// Taxonomy tag of this error
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotConfigured => ErrorKind::NotConfigured,
            Self::InvalidInput(_) | Self::InvalidConfig(_) => ErrorKind::InvalidInput,
            Self::FileNotFound(_) => ErrorKind::FileNotFound,
            Self::TooLarge { .. } => ErrorKind::TooLarge,
            Self::CompressionFailed(_) => ErrorKind::CompressionFailed,
            Self::UnsupportedProvider(_) => ErrorKind::UnsupportedProvider,
            Self::ProviderError { .. } => ErrorKind::ProviderError,
            Self::Network(_) => ErrorKind::Network,
            Self::EmptyResponse { .. } => ErrorKind::EmptyResponse,
            Self::StorageUnavailable(_) => ErrorKind::StorageUnavailable,
            Self::Persistence(_) | Self::Io(_) | Self::Unknown(_) => ErrorKind::Unknown,
        }
    }

    /// End-user guidance for this error, chosen by taxonomy tag
    #[must_use]
    pub fn user_guidance(&self) -> String {
        match self.kind() {
            ErrorKind::NotConfigured => concat!(
                "API key not configured. ",
                "Run `snapcut config set --api-key <KEY>` first."
            )
            .to_string(),
            ErrorKind::TooLarge => {
                "The image is too large. Try a smaller image.".to_string()
            },
            ErrorKind::FileNotFound => {
                "The image could not be accessed. Try capturing it again.".to_string()
            },
            ErrorKind::Network => {
                "Connection error. Check your internet connection and try again.".to_string()
            },
            ErrorKind::EmptyResponse => {
                "The provider returned an empty image. Try again later.".to_string()
            },
            ErrorKind::StorageUnavailable => {
                "The document directory is not accessible. Set SNAPCUT_DOCUMENT_DIR.".to_string()
            },
            _ => self.to_string(),
        }
    }

    /// Create a new invalid input error
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a new invalid configuration error
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a new storage unavailable error
    pub fn storage_unavailable<S: Into<String>>(msg: S) -> Self {
        Self::StorageUnavailable(msg.into())
    }

    /// Create a new settings persistence error
    pub fn persistence<S: Into<String>>(msg: S) -> Self {
        Self::Persistence(msg.into())
    }

    /// Create a new compression error
    pub fn compression<S: Into<String>>(msg: S) -> Self {
        Self::CompressionFailed(msg.into())
    }

    /// Create a new catch-all error
    pub fn unknown<S: Into<String>>(msg: S) -> Self {
        Self::Unknown(msg.into())
    }

    /// Create a transport error with the operation that failed
    pub fn network_error<S: AsRef<str>, E: fmt::Display>(context: S, error: E) -> Self {
        Self::Network(format!("{}: {}", context.as_ref(), error))
    }

    /// Create file I/O error with operation context
    pub fn file_io_error<P: AsRef<Path>>(
        operation: &str,
        path: P,
        error: &std::io::Error,
    ) -> Self {
        let path_display = path.as_ref().display();
        Self::Io(std::io::Error::new(
            error.kind(),
            format!("Failed to {} '{}': {}", operation, path_display, error),
        ))
    }
}
