//! Clipdrop request builder

use super::ProviderBackend;
use crate::config::RemovalOptions;
use crate::providers::CLIPDROP;

/// Clipdrop: `x-api-key` header, image only
#[derive(Debug, Clone, Copy, Default)]
pub struct ClipdropBackend;

impl ProviderBackend for ClipdropBackend {
    fn name(&self) -> &str {
        CLIPDROP
    }

    fn api_key_header(&self) -> &'static str {
        "x-api-key"
    }

    fn form_fields(&self, _options: &RemovalOptions) -> Vec<(&'static str, String)> {
        Vec::new()
    }
}
