//! HTTP transport port: outbound API calls and remote image downloads.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::error::ImageError;

/// Deadline for a generation call when the alias does not configure one.
pub const DEFAULT_TIMEOUT_MS: u64 = 60_000;

/// An outbound HTTP call built by a provider adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpRequest {
    /// HTTP method (`"POST"`, `"GET"`).
    pub method: String,
    /// Absolute URL.
    pub url: String,
    /// Request headers.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// JSON body, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
    /// Deadline for the whole exchange.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

impl HttpRequest {
    /// A JSON `POST` with the default deadline.
    #[must_use]
    pub fn post_json(url: impl Into<String>, body: serde_json::Value) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        Self {
            method: "POST".to_string(),
            url: url.into(),
            headers,
            body: Some(body),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    /// Add or replace a header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// A response as seen by provider adapters. Non-2xx statuses are not errors here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers (lower-cased names).
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Parsed JSON, or `{"rawText": ...}` when the body is not JSON.
    pub body: serde_json::Value,
}

impl HttpResponse {
    /// Build a response from the raw body text and declared content type.
    ///
    /// JSON is parsed only when the content type says so and the text is a
    /// valid, non-empty document; anything else is wrapped under `rawText`.
    #[must_use]
    pub fn from_text(status: u16, headers: BTreeMap<String, String>, text: &str) -> Self {
        let is_json = headers.get("content-type").is_some_and(|ct| ct.contains("application/json"));
        let body = if is_json && !text.is_empty() {
            serde_json::from_str(text).unwrap_or_else(|_| raw_text(text))
        } else {
            raw_text(text)
        };
        Self { status, headers, body }
    }
}

fn raw_text(text: &str) -> serde_json::Value {
    serde_json::json!({ "rawText": text })
}

/// Downloaded image bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Download {
    /// Raw bytes, never empty.
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
}

/// Boxed future type returned by [`HttpTransport`] methods.
pub type TransportFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ImageError>> + Send + 'a>>;

/// Issues outbound HTTP calls on behalf of provider adapters.
pub trait HttpTransport: Send + Sync {
    /// Send a request, bounded by `request.timeout_ms`.
    fn send<'a>(&'a self, request: &'a HttpRequest) -> TransportFuture<'a, HttpResponse>;

    /// Fetch a remote image over HTTPS with a size ceiling.
    fn download<'a>(&'a self, url: &'a str) -> TransportFuture<'a, Download>;
}

/// Serde helper for serializing `Vec<u8>` as base64 strings in cassettes.
mod base64_bytes {
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serialize bytes as base64 string.
    pub fn serialize<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(data);
        serializer.serialize_str(&encoded)
    }

    /// Deserialize base64 string to bytes.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        base64::engine::general_purpose::STANDARD.decode(&s).map_err(serde::de::Error::custom)
    }
}
