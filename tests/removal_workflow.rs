//! End-to-end removal tests against stubbed provider endpoints

use image::{codecs::jpeg::JpegEncoder, DynamicImage, Rgb, RgbImage};
use mockito::{Matcher, Server, ServerGuard};
use snapcut::{
    BackgroundRemovalService, ConfigStore, ErrorKind, Gallery, MemoryStore, Provider,
    ProviderRegistry, RemovalOptions, ResultFormat, ServiceConfig,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

struct Harness {
    server: ServerGuard,
    temp_dir: TempDir,
    config: Arc<ConfigStore>,
    service: BackgroundRemovalService,
}

impl Harness {
    async fn new() -> Self {
        Self::with_limit(None).await
    }

    async fn with_limit(max_upload_bytes: Option<u64>) -> Self {
        let server = Server::new_async().await;
        let temp_dir = TempDir::new().unwrap();

        let limit = |provider: Provider| match max_upload_bytes {
            Some(bytes) => provider.with_max_upload_bytes(bytes),
            None => provider,
        };
        let registry = ProviderRegistry::new(vec![
            limit(Provider::remove_bg().with_endpoint(format!("{}/removebg", server.url()))),
            limit(Provider::photroom().with_endpoint(format!("{}/segment", server.url()))),
            limit(Provider::clipdrop().with_endpoint(format!("{}/clipdrop", server.url()))),
        ])
        .unwrap();
        let config = Arc::new(ConfigStore::new(registry, Arc::new(MemoryStore::new())));

        let service_config = ServiceConfig::builder()
            .document_dir(temp_dir.path().join("docs"))
            .scratch_dir(temp_dir.path().join("scratch"))
            .build()
            .unwrap();
        let service = BackgroundRemovalService::new(Arc::clone(&config), service_config).unwrap();

        Self {
            server,
            temp_dir,
            config,
            service,
        }
    }

    fn docs(&self) -> PathBuf {
        self.temp_dir.path().join("docs")
    }

    fn stored_files(&self) -> Vec<String> {
        match std::fs::read_dir(self.docs()) {
            Ok(entries) => entries
                .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    /// A noisy JPEG of roughly half a megabyte
    fn write_photo(&self) -> PathBuf {
        let path = self.temp_dir.path().join("photo.jpg");
        write_noise_jpeg(&path, 800, 600);
        path
    }
}

fn write_noise_jpeg(path: &Path, width: u32, height: u32) {
    let mut state: u32 = 0xdead_beef;
    let image = RgbImage::from_fn(width, height, |_, _| {
        state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        let [_, r, g, b] = state.to_le_bytes();
        Rgb([r, g, b])
    });
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(image)
        .write_with_encoder(JpegEncoder::new_with_quality(&mut bytes, 90))
        .unwrap();
    std::fs::write(path, bytes).unwrap();
}

fn is_result_name(name: &str, extension: &str) -> bool {
    name.strip_prefix("processed_")
        .and_then(|rest| rest.strip_suffix(extension))
        .is_some_and(|millis| !millis.is_empty() && millis.chars().all(|c| c.is_ascii_digit()))
}

#[tokio::test]
async fn test_successful_removal_stores_payload_verbatim() {
    let mut h = Harness::new().await;
    h.config.set_credential("rbg-key", None).await.unwrap();
    let payload: Vec<u8> = (0..10 * 1024).map(|i| (i % 251) as u8).collect();

    let mock = h
        .server
        .mock("POST", "/removebg")
        .match_header("x-api-key", "rbg-key")
        .match_header("content-type", Matcher::Regex("^multipart/form-data".to_string()))
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r#"name="image_file"; filename="photo.jpg""#.to_string()),
            Matcher::Regex(r"Content-Type: image/jpeg".to_string()),
            Matcher::Regex("name=\"size\"\r\n\r\nauto\r\n".to_string()),
        ]))
        .with_status(200)
        .with_header("content-type", "image/png")
        .with_body(payload.clone())
        .expect(1)
        .create_async()
        .await;

    let photo = h.write_photo();
    let processed = h
        .service
        .remove_background(&photo, &RemovalOptions::default())
        .await
        .unwrap();
    mock.assert_async().await;

    let name = processed
        .output_path
        .file_name()
        .unwrap()
        .to_string_lossy()
        .into_owned();
    assert!(is_result_name(&name, ".png"), "unexpected name {}", name);
    assert!(processed.output_path.starts_with(h.docs()));
    assert_eq!(processed.provider, "Remove.bg");
    assert_eq!(processed.bytes_written, payload.len() as u64);
    assert_eq!(std::fs::read(&processed.output_path).unwrap(), payload);

    // The stored result shows up in the gallery
    let entries = Gallery::new(h.docs()).list().await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name, name);
}

#[tokio::test]
async fn test_jpg_format_selects_extension_and_provider_switch() {
    let mut h = Harness::new().await;
    h.config.set_credential("pr-key", Some("Photroom")).await.unwrap();

    let mock = h
        .server
        .mock("POST", "/segment")
        .match_header("x-api-key", "pr-key")
        .with_status(200)
        .with_body("jpeg-ish bytes")
        .expect(1)
        .create_async()
        .await;

    let photo = h.write_photo();
    let options = RemovalOptions::default().with_format(ResultFormat::Jpg);
    let processed = h.service.remove_background(&photo, &options).await.unwrap();
    mock.assert_async().await;

    assert_eq!(processed.provider, "Photroom");
    let name = processed.output_path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(is_result_name(&name, ".jpg"), "unexpected name {}", name);
}

#[tokio::test]
async fn test_empty_response_writes_nothing() {
    let mut h = Harness::new().await;
    h.config.set_credential("key", Some("Clipdrop")).await.unwrap();

    let mock = h
        .server
        .mock("POST", "/clipdrop")
        .with_status(200)
        .with_body("")
        .expect(1)
        .create_async()
        .await;

    let photo = h.write_photo();
    let err = h
        .service
        .remove_background(&photo, &RemovalOptions::default())
        .await
        .unwrap_err();
    mock.assert_async().await;

    assert_eq!(err.kind(), ErrorKind::EmptyResponse);
    assert!(h.stored_files().is_empty());
}

#[tokio::test]
async fn test_provider_error_carries_body_verbatim() {
    let mut h = Harness::new().await;
    h.config.set_credential("bad-key", None).await.unwrap();

    let mock = h
        .server
        .mock("POST", "/removebg")
        .with_status(402)
        .with_body("Insufficient credits")
        .expect(1)
        .create_async()
        .await;

    let photo = h.write_photo();
    let err = h
        .service
        .remove_background(&photo, &RemovalOptions::default())
        .await
        .unwrap_err();
    mock.assert_async().await;

    assert_eq!(err.kind(), ErrorKind::ProviderError);
    match err {
        snapcut::RemovalError::ProviderError {
            provider,
            status,
            body,
        } => {
            assert_eq!(provider, "Remove.bg");
            assert_eq!(status, 402);
            assert_eq!(body, "Insufficient credits");
        },
        other => panic!("expected ProviderError, got {:?}", other),
    }
    assert!(h.stored_files().is_empty());
}

#[tokio::test]
async fn test_not_configured_makes_no_request() {
    let mut h = Harness::new().await;
    let mock = h
        .server
        .mock("POST", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let photo = h.write_photo();
    let err = h
        .service
        .remove_background(&photo, &RemovalOptions::default())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotConfigured);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_too_large_makes_no_request() {
    let mut h = Harness::with_limit(Some(1_000)).await;
    h.config.set_credential("key", None).await.unwrap();
    let mock = h
        .server
        .mock("POST", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let photo = h.write_photo();
    let err = h
        .service
        .remove_background(&photo, &RemovalOptions::default())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::TooLarge);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_missing_input_and_blank_path() {
    let h = Harness::new().await;
    h.config.set_credential("key", None).await.unwrap();

    let err = h
        .service
        .remove_background(Path::new("  "), &RemovalOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);

    let err = h
        .service
        .remove_background(&h.temp_dir.path().join("nope.jpg"), &RemovalOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::FileNotFound);
}

#[tokio::test]
async fn test_unreachable_provider_is_network_error() {
    let temp_dir = TempDir::new().unwrap();
    let registry = ProviderRegistry::new(vec![
        Provider::clipdrop().with_endpoint("http://127.0.0.1:1/clipdrop")
    ])
    .unwrap();
    let config = Arc::new(ConfigStore::new(registry, Arc::new(MemoryStore::new())));
    config.set_credential("key", None).await.unwrap();

    let service_config = ServiceConfig::builder()
        .document_dir(temp_dir.path().join("docs"))
        .build()
        .unwrap();
    let service = BackgroundRemovalService::new(config, service_config).unwrap();

    let photo = temp_dir.path().join("photo.jpg");
    write_noise_jpeg(&photo, 64, 64);

    let err = service
        .remove_background(&photo, &RemovalOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Network);
    assert!(!temp_dir.path().join("docs").exists());
}

#[tokio::test]
async fn test_unknown_provider_in_custom_registry() {
    let temp_dir = TempDir::new().unwrap();
    let registry = ProviderRegistry::new(vec![Provider::new(
        "Acme",
        "http://127.0.0.1:1/acme",
        1_000_000,
        &["jpg"],
    )])
    .unwrap();
    let config = Arc::new(ConfigStore::new(registry, Arc::new(MemoryStore::new())));
    config.set_credential("key", None).await.unwrap();

    let service_config = ServiceConfig::builder()
        .document_dir(temp_dir.path().join("docs"))
        .build()
        .unwrap();
    let service = BackgroundRemovalService::new(config, service_config).unwrap();

    let photo = temp_dir.path().join("photo.jpg");
    write_noise_jpeg(&photo, 32, 32);

    let err = service
        .remove_background(&photo, &RemovalOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedProvider);
}

#[tokio::test]
async fn test_consecutive_removals_get_distinct_files() {
    let mut h = Harness::new().await;
    h.config.set_credential("key", None).await.unwrap();

    let mock = h
        .server
        .mock("POST", "/removebg")
        .with_status(200)
        .with_body("cutout")
        .expect(2)
        .create_async()
        .await;

    let photo = h.write_photo();
    let first = h
        .service
        .remove_background(&photo, &RemovalOptions::default())
        .await
        .unwrap();
    let second = h
        .service
        .remove_background(&photo, &RemovalOptions::default())
        .await
        .unwrap();
    mock.assert_async().await;

    assert_ne!(first.output_path, second.output_path);
    assert_eq!(h.stored_files().len(), 2);
}

/// Read one HTTP request from `stream`, headers and body
async fn read_request(stream: &mut tokio::net::TcpStream) -> Vec<u8> {
    let mut request = Vec::new();
    let mut chunk = [0u8; 8192];
    loop {
        let n = stream.read(&mut chunk).await.unwrap();
        if n == 0 {
            return request;
        }
        request.extend_from_slice(&chunk[..n]);

        let Some(header_end) = request.windows(4).position(|w| w == b"\r\n\r\n") else {
            continue;
        };
        let headers = String::from_utf8_lossy(&request[..header_end]).to_ascii_lowercase();
        let content_length = headers
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|value| value.trim().parse::<usize>().ok());
        let complete = match content_length {
            Some(length) => request.len() >= header_end + 4 + length,
            None => request.ends_with(b"0\r\n\r\n"),
        };
        if complete {
            return request;
        }
    }
}

#[tokio::test]
async fn test_truncated_error_body_is_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    let server = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        read_request(&mut stream).await;
        // Promises more body than it sends, then hangs up
        stream
            .write_all(b"HTTP/1.1 500 Internal Server Error\r\nContent-Length: 100\r\n\r\npartial")
            .await
            .unwrap();
        stream.shutdown().await.unwrap();
    });

    let temp_dir = TempDir::new().unwrap();
    let registry = ProviderRegistry::new(vec![
        Provider::clipdrop().with_endpoint(format!("http://{}/clipdrop", address))
    ])
    .unwrap();
    let config = Arc::new(ConfigStore::new(registry, Arc::new(MemoryStore::new())));
    config.set_credential("key", None).await.unwrap();

    let service_config = ServiceConfig::builder()
        .document_dir(temp_dir.path().join("docs"))
        .build()
        .unwrap();
    let service = BackgroundRemovalService::new(config, service_config).unwrap();

    let photo = temp_dir.path().join("photo.jpg");
    write_noise_jpeg(&photo, 32, 32);

    let err = service
        .remove_background(&photo, &RemovalOptions::default())
        .await
        .unwrap_err();
    server.await.unwrap();

    assert_eq!(err.kind(), ErrorKind::Network);
    assert!(!temp_dir.path().join("docs").exists());
}
