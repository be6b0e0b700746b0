//! Catalog of hosted background-removal providers
//!
//! Providers are plain data: name, endpoint, upload ceiling and accepted
//! input formats. The request shape for each one lives in [`crate::backends`].

use crate::error::{RemovalError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Name of the remove.bg provider
pub const REMOVE_BG: &str = "Remove.bg";
/// Name of the Photroom provider
pub const PHOTROOM: &str = "Photroom";
/// Name of the Clipdrop provider
pub const CLIPDROP: &str = "Clipdrop";

/// A remote background-removal service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provider {
    /// Unique provider name, also the persisted selection value
    pub name: String,
    /// HTTPS endpoint receiving the multipart upload
    pub endpoint: String,
    /// Largest upload the provider accepts, in bytes
    pub max_upload_bytes: u64,
    /// Accepted input file extensions (lowercase, without dot)
    pub supported_formats: Vec<String>,
}

impl Provider {
    /// Create a provider description
    pub fn new<N, E>(
        name: N,
        endpoint: E,
        max_upload_bytes: u64,
        supported_formats: &[&str],
    ) -> Self
    where
        N: Into<String>,
        E: Into<String>,
    {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
            max_upload_bytes,
            supported_formats: supported_formats.iter().map(|f| (*f).to_string()).collect(),
        }
    }

    /// remove.bg, 12 MB ceiling
    #[must_use]
    pub fn remove_bg() -> Self {
        Self::new(
            REMOVE_BG,
            "https://api.remove.bg/v1.0/removebg",
            12_000_000,
            &["jpg", "jpeg", "png", "webp"],
        )
    }

    /// Photroom segmentation API, 10 MB ceiling
    #[must_use]
    pub fn photroom() -> Self {
        Self::new(
            PHOTROOM,
            "https://image-api.photroom.com/v1/segment",
            10_000_000,
            &["jpg", "jpeg", "png"],
        )
    }

    /// Clipdrop remove-background API, 10 MB ceiling
    #[must_use]
    pub fn clipdrop() -> Self {
        Self::new(
            CLIPDROP,
            "https://clipdrop-api.co/remove-background/v1",
            10_000_000,
            &["jpg", "jpeg", "png", "webp"],
        )
    }

    /// Same provider, different endpoint (gateways, stubs)
    #[must_use]
    pub fn with_endpoint<E: Into<String>>(mut self, endpoint: E) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Same provider, different upload ceiling
    #[must_use]
    pub fn with_max_upload_bytes(mut self, max_upload_bytes: u64) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }

    /// Whether the provider accepts files with this extension
    #[must_use]
    pub fn supports_format(&self, extension: &str) -> bool {
        let extension = extension.trim_start_matches('.');
        self.supported_formats
            .iter()
            .any(|f| f.eq_ignore_ascii_case(extension))
    }
}

/// Ordered, immutable set of known providers
#[derive(Debug, Clone)]
pub struct ProviderRegistry {
    providers: Vec<Provider>,
}

impl ProviderRegistry {
    /// Registry with remove.bg, Photroom and Clipdrop, in that order
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            providers: vec![Provider::remove_bg(), Provider::photroom(), Provider::clipdrop()],
        }
    }

    /// Registry with a custom provider list
    ///
    /// # Errors
    /// - The list is empty
    /// - Two providers share a name
    pub fn new(providers: Vec<Provider>) -> Result<Self> {
        if providers.is_empty() {
            return Err(RemovalError::invalid_config(
                "Provider registry needs at least one provider",
            ));
        }

        let mut seen = HashSet::new();
        for provider in &providers {
            if !seen.insert(provider.name.as_str()) {
                return Err(RemovalError::invalid_config(format!(
                    "Duplicate provider name: {}",
                    provider.name
                )));
            }
        }

        Ok(Self { providers })
    }

    /// All providers in declaration order
    #[must_use]
    pub fn list_providers(&self) -> &[Provider] {
        &self.providers
    }

    /// Look up a provider by exact name
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<&Provider> {
        self.providers.iter().find(|p| p.name == name)
    }

    /// The provider used until another one is selected
    #[must_use]
    #[allow(clippy::indexing_slicing)]
    pub fn default_provider(&self) -> &Provider {
        // Construction guarantees at least one entry
        &self.providers[0]
    }

    /// Provider names in declaration order
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name.as_str()).collect()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
