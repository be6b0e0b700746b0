//! Request builders for the hosted providers
//!
//! Each provider expects the same multipart upload with small differences in
//! header casing and extra form fields:
//! - remove.bg (`X-Api-Key`, `size`, optional `format`)
//! - Photroom (`x-api-key`, optional `format`)
//! - Clipdrop (`x-api-key`, no extra fields)
//!
//! The orchestrator dispatches through [`BackendRegistry`] by provider name.

pub mod clipdrop;
pub mod photroom;
pub mod remove_bg;

pub use self::clipdrop::ClipdropBackend;
pub use self::photroom::PhotroomBackend;
pub use self::remove_bg::RemoveBgBackend;

use crate::config::RemovalOptions;
use crate::error::{RemovalError, Result};
use crate::providers::Provider;
use reqwest::multipart::{Form, Part};
use std::collections::HashMap;

/// Form field carrying the image
pub const IMAGE_FIELD: &str = "image_file";
/// File name announced for every upload
pub const UPLOAD_FILE_NAME: &str = "photo.jpg";
/// Content type announced for every upload
pub const UPLOAD_CONTENT_TYPE: &str = "image/jpeg";

/// Builds the upload request for one provider
pub trait ProviderBackend: Send + Sync {
    /// Provider name this backend serves
    fn name(&self) -> &str;

    /// Header carrying the API credential
    fn api_key_header(&self) -> &'static str;

    /// Text fields sent next to the image
    fn form_fields(&self, options: &RemovalOptions) -> Vec<(&'static str, String)>;

    /// Multipart POST to `provider.endpoint` with the image and credential
    ///
    /// # Errors
    /// - `InvalidConfig` when the endpoint or credential cannot form a valid request
    fn build_upload_request(
        &self,
        client: &reqwest::Client,
        provider: &Provider,
        image_bytes: Vec<u8>,
        credential: &str,
        options: &RemovalOptions,
    ) -> Result<reqwest::Request> {
        let part = Part::bytes(image_bytes)
            .file_name(UPLOAD_FILE_NAME)
            .mime_str(UPLOAD_CONTENT_TYPE)
            .map_err(|e| RemovalError::unknown(format!("Invalid upload content type: {}", e)))?;

        let form = self
            .form_fields(options)
            .into_iter()
            .fold(Form::new(), |form, (name, value)| form.text(name, value))
            .part(IMAGE_FIELD, part);

        client
            .post(&provider.endpoint)
            .header(self.api_key_header(), credential)
            .multipart(form)
            .build()
            .map_err(|e| {
                RemovalError::invalid_config(format!(
                    "Cannot build request for {} ({}): {}",
                    provider.name, provider.endpoint, e
                ))
            })
    }
}

/// Provider name → request builder
pub struct BackendRegistry {
    backends: HashMap<String, Box<dyn ProviderBackend>>,
}

impl BackendRegistry {
    /// Registry without any backend
    #[must_use]
    pub fn empty() -> Self {
        Self {
            backends: HashMap::new(),
        }
    }

    /// Builders for remove.bg, Photroom and Clipdrop
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(RemoveBgBackend));
        registry.register(Box::new(PhotroomBackend));
        registry.register(Box::new(ClipdropBackend));
        registry
    }

    /// Add a backend, replacing any backend with the same name
    pub fn register(&mut self, backend: Box<dyn ProviderBackend>) {
        self.backends.insert(backend.name().to_string(), backend);
    }

    /// Backend for a provider name
    ///
    /// # Errors
    /// - `UnsupportedProvider` when nothing is registered under `name`
    pub fn get(&self, name: &str) -> Result<&dyn ProviderBackend> {
        self.backends
            .get(name)
            .map(AsRef::as_ref)
            .ok_or_else(|| RemovalError::UnsupportedProvider(name.to_string()))
    }

    /// Registered provider names, sorted
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.backends.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl std::fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendRegistry")
            .field("backends", &self.names())
            .finish()
    }
}
