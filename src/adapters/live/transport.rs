//! Live HTTP transport backed by `reqwest`.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::{Client, Method, Url};

use crate::adapters::https_image_url;
use crate::error::ImageError;
use crate::ports::http_transport::{Download, TransportFuture};
use crate::ports::{HttpRequest, HttpResponse, HttpTransport};
use crate::redact::redact_api_key;

/// Hard ceiling on a downloaded image.
pub const MAX_IMAGE_BYTES: u64 = 50 * 1024 * 1024;

/// Deadline for a single image download.
const DOWNLOAD_TIMEOUT_MS: u64 = 30_000;

/// Sends requests and downloads images over the network.
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Create a transport with a fresh connection pool.
    #[must_use]
    pub fn new() -> Self {
        Self { client: Client::new() }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpTransport for ReqwestTransport {
    fn send<'a>(&'a self, request: &'a HttpRequest) -> TransportFuture<'a, HttpResponse> {
        Box::pin(async move {
            let method = Method::from_bytes(request.method.as_bytes())
                .map_err(|_| ImageError::InvalidInput(format!("unsupported HTTP method '{}'", request.method)))?;
            tracing::debug!(method = %method, url = %redact_api_key(&request.url), "sending request");

            let mut builder = self.client.request(method, &request.url);
            for (name, value) in &request.headers {
                builder = builder.header(name, value);
            }
            if let Some(body) = &request.body {
                builder = builder.json(body);
            }

            let exchange = async {
                let response = builder.send().await?;
                let status = response.status().as_u16();
                let headers = lowercase_headers(response.headers());
                let text = response.text().await?;
                Ok::<_, ImageError>(HttpResponse::from_text(status, headers, &text))
            };

            let response = tokio::time::timeout(Duration::from_millis(request.timeout_ms), exchange)
                .await
                .map_err(|_| ImageError::Timeout(request.timeout_ms))??;
            tracing::debug!(status = response.status, "received response");
            Ok(response)
        })
    }

    fn download<'a>(&'a self, url: &'a str) -> TransportFuture<'a, Download> {
        Box::pin(async move {
            let parsed = https_image_url(url)?;

            let data = tokio::time::timeout(
                Duration::from_millis(DOWNLOAD_TIMEOUT_MS),
                fetch_image(&self.client, parsed, MAX_IMAGE_BYTES),
            )
            .await
            .map_err(|_| ImageError::Timeout(DOWNLOAD_TIMEOUT_MS))??;

            tracing::debug!(url = %redact_api_key(url), bytes = data.len(), "downloaded image");
            Ok(Download { data })
        })
    }
}

/// GET `url` and collect the body, failing once it exceeds `max_bytes`.
///
/// The declared `content-length` is checked before reading; the running total
/// is checked while reading.
async fn fetch_image(client: &Client, url: Url, max_bytes: u64) -> Result<Vec<u8>, ImageError> {
    let mut response = client.get(url).send().await?;
    if !response.status().is_success() {
        return Err(ImageError::Decode(format!("image download failed with HTTP {}", response.status().as_u16())));
    }
    if let Some(declared) = response.content_length() {
        if declared > max_bytes {
            return Err(too_large(max_bytes));
        }
    }

    let mut data = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        if (data.len() + chunk.len()) as u64 > max_bytes {
            return Err(too_large(max_bytes));
        }
        data.extend_from_slice(&chunk);
    }

    if data.is_empty() {
        return Err(ImageError::Decode("downloaded image is empty".to_string()));
    }
    Ok(data)
}

fn too_large(max_bytes: u64) -> ImageError {
    ImageError::Decode(format!("image exceeds the {} MiB download limit", max_bytes / (1024 * 1024)))
}

fn lowercase_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value.to_str().ok().map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
        })
        .collect()
}
