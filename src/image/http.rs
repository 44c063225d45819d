//! HTTP client for the external generate/edit service (multipart/form-data).

use crate::config::ServiceConfig;
use crate::error::{GenFormError, Result};
use crate::image::service::{ImageService, Submission};
use crate::image::types::GeneratedImage;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use std::time::Instant;

/// Builder for HttpImageService.
#[derive(Debug, Clone, Default)]
pub struct HttpImageServiceBuilder {
    config: Option<ServiceConfig>,
    base_url: Option<String>,
    client: Option<reqwest::Client>,
}

impl HttpImageServiceBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses a fully resolved endpoint config.
    pub fn config(mut self, config: ServiceConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the base URL with default routes. Ignored when `config` is given.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Supplies a preconfigured reqwest client.
    pub fn client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Builds the service, resolving the endpoint config.
    pub fn build(self) -> Result<HttpImageService> {
        let config = match self.config {
            Some(config) => config,
            None => {
                let mut builder = ServiceConfig::builder();
                if let Some(url) = self.base_url {
                    builder = builder.base_url(url);
                }
                builder.build()?
            }
        };

        let client = match self.client {
            Some(client) => client,
            None => {
                let mut builder = reqwest::Client::builder();
                if let Some(timeout) = config.timeout() {
                    builder = builder.timeout(timeout);
                }
                builder.build()?
            }
        };

        Ok(HttpImageService { client, config })
    }
}

/// Image service reached over HTTP.
pub struct HttpImageService {
    client: reqwest::Client,
    config: ServiceConfig,
}

impl HttpImageService {
    /// Creates a new `HttpImageServiceBuilder`.
    pub fn builder() -> HttpImageServiceBuilder {
        HttpImageServiceBuilder::new()
    }

    /// The endpoints this service posts to.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Builds the multipart body: text fields, then one `image` part per file.
    fn build_form(submission: &Submission) -> Result<Form> {
        let mut form = Form::new();
        for (name, value) in submission.text_fields() {
            form = form.text(name, value.to_string());
        }

        for file in &submission.images {
            let part = Part::bytes(file.data.clone())
                .file_name(file.name.clone())
                .mime_str(file.mime_type())?;
            form = form.part("image", part);
        }

        Ok(form)
    }

    /// Failure for a non-success response, carrying its status text.
    fn response_error(response: &reqwest::Response) -> GenFormError {
        // hyper only records the reason phrase when it differs from the canonical one.
        let reason = response
            .extensions()
            .get::<hyper::ext::ReasonPhrase>()
            .map(|r| String::from_utf8_lossy(r.as_bytes()).into_owned());
        Self::status_error(response.status(), reason)
    }

    fn status_error(status: StatusCode, reason: Option<String>) -> GenFormError {
        let message = reason
            .filter(|r| !r.trim().is_empty())
            .or_else(|| status.canonical_reason().map(str::to_string))
            .unwrap_or_else(|| status.as_str().to_string());
        GenFormError::Request {
            status: status.as_u16(),
            message,
        }
    }
}

#[async_trait]
impl ImageService for HttpImageService {
    async fn submit(&self, submission: &Submission) -> Result<GeneratedImage> {
        let start = Instant::now();
        let route = submission.route();
        let url = self.config.route_url(route).clone();
        let form = Self::build_form(submission)?;

        tracing::debug!(
            %route,
            url = %url,
            images = submission.images.len(),
            size = %submission.size,
            quality = %submission.quality,
            "submitting image request"
        );

        let response = self.client.post(url).multipart(form).send().await?;

        let status = response.status();
        if !status.is_success() {
            let err = Self::response_error(&response);
            let text = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), body = %text, "image request rejected");
            return Err(err);
        }

        let data = response.bytes().await?.to_vec();
        tracing::debug!(
            %route,
            bytes = data.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "image request complete"
        );

        Ok(GeneratedImage::from_bytes(data))
    }

    async fn health_check(&self) -> Result<()> {
        let response = self
            .client
            .get(self.config.health_url().clone())
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::response_error(&response))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::types::{OutputQuality, OutputSize, SourceFile};
    use crate::testing::png_bytes;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Accepts one connection, answers with `status_line` and `body`, and
    /// yields the raw request it received.
    async fn serve_once(status_line: &'static str, body: Vec<u8>) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 8192];
            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
                if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                    let head = String::from_utf8_lossy(&buf[..end]).to_lowercase();
                    let len = head
                        .lines()
                        .find_map(|l| l.strip_prefix("content-length:"))
                        .and_then(|v| v.trim().parse::<usize>().ok())
                        .unwrap_or(0);
                    if buf.len() >= end + 4 + len {
                        break;
                    }
                }
            }

            let head = format!(
                "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                status_line,
                body.len()
            );
            socket.write_all(head.as_bytes()).await.unwrap();
            socket.write_all(&body).await.unwrap();
            socket.shutdown().await.unwrap();

            String::from_utf8_lossy(&buf).into_owned()
        });

        (base, handle)
    }

    fn service(base: &str) -> HttpImageService {
        HttpImageService::builder().base_url(base).build().unwrap()
    }

    #[tokio::test]
    async fn test_generate_without_images() {
        let png = png_bytes(2, 2);
        let (base, server) = serve_once("200 OK", png.clone()).await;

        let submission = Submission {
            prompt: "a cat on a mat".into(),
            size: OutputSize::Square,
            quality: OutputQuality::Medium,
            images: vec![],
        };
        let image = service(&base).submit(&submission).await.unwrap();
        assert_eq!(image.data, png);

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /generate-image HTTP/1.1"));
        assert!(request.contains("multipart/form-data; boundary="));
        assert!(request.contains("name=\"prompt\"\r\n\r\na cat on a mat\r\n"));
        assert!(request.contains("name=\"size\"\r\n\r\n1024x1024\r\n"));
        assert!(request.contains("name=\"quality\"\r\n\r\nmedium\r\n"));
        assert!(!request.contains("name=\"image\""));
    }

    #[tokio::test]
    async fn test_edit_repeats_image_field_in_slot_order() {
        let (base, server) = serve_once("200 OK", png_bytes(1, 1)).await;

        let submission = Submission {
            prompt: "retouch this".into(),
            size: OutputSize::Auto,
            quality: OutputQuality::High,
            images: vec![
                SourceFile::new("a.png", png_bytes(1, 1)),
                SourceFile::new("b.png", png_bytes(1, 1)),
            ],
        };
        let _image = service(&base).submit(&submission).await.unwrap();

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /edit-image HTTP/1.1"));
        assert!(request.contains("name=\"size\"\r\n\r\nauto\r\n"));
        assert!(request.contains("name=\"quality\"\r\n\r\nhigh\r\n"));
        assert_eq!(request.matches("name=\"image\"").count(), 2);

        let first = request.find("filename=\"a.png\"").unwrap();
        let second = request.find("filename=\"b.png\"").unwrap();
        assert!(first < second);
        assert!(request.contains("Content-Type: image/png") || request.contains("content-type: image/png"));
    }

    #[tokio::test]
    async fn test_non_success_status_is_request_error() {
        let (base, server) = serve_once(
            "500 Internal Server Error",
            br#"{"error":"Image generation failed"}"#.to_vec(),
        )
        .await;

        let submission = Submission {
            prompt: "x".into(),
            size: OutputSize::Square,
            quality: OutputQuality::Low,
            images: vec![],
        };
        let err = service(&base).submit(&submission).await.unwrap_err();
        server.await.unwrap();

        match err {
            GenFormError::Request { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "Internal Server Error");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_transport_failure_is_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let submission = Submission {
            prompt: "x".into(),
            size: OutputSize::Square,
            quality: OutputQuality::Low,
            images: vec![],
        };
        let err = service(&base).submit(&submission).await.unwrap_err();
        assert!(matches!(err, GenFormError::Network(_)));
        assert!(!err.is_validation());
    }

    #[tokio::test]
    async fn test_health_check() {
        let (base, server) = serve_once("200 OK", br#"{"status":"healthy"}"#.to_vec()).await;
        service(&base).health_check().await.unwrap();
        let request = server.await.unwrap();
        assert!(request.starts_with("GET /health HTTP/1.1"));

        let (base, server) = serve_once("503 Service Unavailable", Vec::new()).await;
        let err = service(&base).health_check().await.unwrap_err();
        server.await.unwrap();
        assert_eq!(err.status(), Some(503));
    }

    #[tokio::test]
    async fn test_server_reason_phrase_is_kept() {
        let (base, server) = serve_once("500 INTERNAL SERVER ERROR", Vec::new()).await;

        let submission = Submission {
            prompt: "x".into(),
            size: OutputSize::Square,
            quality: OutputQuality::Low,
            images: vec![],
        };
        let err = service(&base).submit(&submission).await.unwrap_err();
        server.await.unwrap();

        assert_eq!(err.status(), Some(500));
        assert_eq!(err.to_string(), "Error: INTERNAL SERVER ERROR");
    }

    #[test]
    fn test_status_error_message() {
        let err = HttpImageService::status_error(StatusCode::NOT_FOUND, None);
        assert_eq!(err.to_string(), "Error: Not Found");

        let err = HttpImageService::status_error(StatusCode::NOT_FOUND, Some(String::new()));
        assert_eq!(err.to_string(), "Error: Not Found");

        let err = HttpImageService::status_error(StatusCode::from_u16(599).unwrap(), None);
        assert_eq!(err.to_string(), "Error: 599");
    }
}
