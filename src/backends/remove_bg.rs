//! remove.bg request builder

use super::ProviderBackend;
use crate::config::RemovalOptions;
use crate::providers::REMOVE_BG;

/// remove.bg: `X-Api-Key` header, `size` field, optional `format` field
#[derive(Debug, Clone, Copy, Default)]
pub struct RemoveBgBackend;

impl ProviderBackend for RemoveBgBackend {
    fn name(&self) -> &str {
        REMOVE_BG
    }

    fn api_key_header(&self) -> &'static str {
        "X-Api-Key"
    }

    fn form_fields(&self, options: &RemovalOptions) -> Vec<(&'static str, String)> {
        let mut fields = vec![("size", options.size.as_str().to_string())];
        if let Some(format) = options.format {
            fields.push(("format", format.extension().to_string()));
        }
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{OutputSize, ResultFormat};
    use crate::providers::Provider;

    #[test]
    fn test_default_fields() {
        let fields = RemoveBgBackend.form_fields(&RemovalOptions::default());
        assert_eq!(fields, vec![("size", "auto".to_string())]);
    }

    #[test]
    fn test_requested_size_and_format() {
        let options = RemovalOptions::default()
            .with_size(OutputSize::Hd)
            .with_format(ResultFormat::Jpg);
        let fields = RemoveBgBackend.form_fields(&options);
        assert_eq!(
            fields,
            vec![("size", "hd".to_string()), ("format", "jpg".to_string())]
        );
    }

    #[test]
    fn test_request_headers() {
        let client = reqwest::Client::new();
        let request = RemoveBgBackend
            .build_upload_request(
                &client,
                &Provider::remove_bg(),
                vec![0xFF, 0xD8],
                "rbg-key",
                &RemovalOptions::default(),
            )
            .unwrap();

        assert_eq!(request.url().as_str(), "https://api.remove.bg/v1.0/removebg");
        assert_eq!(request.headers()["X-Api-Key"], "rbg-key");
    }
}
