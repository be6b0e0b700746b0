//! Photroom request builder

use super::ProviderBackend;
use crate::config::RemovalOptions;
use crate::providers::PHOTROOM;

/// Photroom: `x-api-key` header, optional `format` field
#[derive(Debug, Clone, Copy, Default)]
pub struct PhotroomBackend;

impl ProviderBackend for PhotroomBackend {
    fn name(&self) -> &str {
        PHOTROOM
    }

    fn api_key_header(&self) -> &'static str {
        "x-api-key"
    }

    fn form_fields(&self, options: &RemovalOptions) -> Vec<(&'static str, String)> {
        options
            .format
            .map(|format| vec![("format", format.extension().to_string())])
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{OutputSize, ResultFormat};

    #[test]
    fn test_size_is_not_sent() {
        let options = RemovalOptions::default().with_size(OutputSize::FourK);
        assert!(PhotroomBackend.form_fields(&options).is_empty());
    }

    #[test]
    fn test_format_field() {
        let options = RemovalOptions::default().with_format(ResultFormat::Png);
        assert_eq!(
            PhotroomBackend.form_fields(&options),
            vec![("format", "png".to_string())]
        );
    }
}
