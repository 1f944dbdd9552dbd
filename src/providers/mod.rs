//! Provider adapters: vendor request shaping and response parsing.
//!
//! Each upstream API family implements [`ProviderAdapter`]. Adapters are
//! stateless; [`adapter_for`] picks one by [`ProviderKind`].

pub mod gemini;
pub mod normalize;
pub mod openai;
pub mod openai_chat;
pub mod openrouter;

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::config::ProviderConfig;
use crate::error::ImageError;
use crate::input::NormalizedInput;
use crate::mime::sniff_mime;
use crate::model::ProviderKind;
use crate::ports::{HttpRequest, HttpResponse, HttpTransport};
use crate::redact::diagnostic;

/// How an image arrived from the upstream API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageSource {
    /// Base64 in a JSON field, data URL or markdown.
    B64,
    /// Downloaded from a remote URL.
    Url,
    /// Vendor inline-data part (mime type + base64).
    Inline,
}

/// Image bytes ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedImage {
    /// Raw bytes, never empty.
    pub bytes: Vec<u8>,
    /// MIME type.
    pub mime_type: String,
    /// How the image arrived.
    pub source: ImageSource,
}

/// An image found in an upstream response.
#[derive(Debug, Clone, PartialEq)]
pub enum ImagePayload {
    /// Only a remote URL is known; bytes must still be downloaded.
    Pending {
        /// Remote image URL.
        url: String,
    },
    /// Bytes are in hand.
    Resolved(ResolvedImage),
}

impl ImagePayload {
    /// Decode base64 text into a resolved payload, sniffing the MIME type.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::Decode`] if the text is not base64 or decodes to nothing.
    pub fn from_base64(encoded: &str, source: ImageSource) -> Result<Self, ImageError> {
        let bytes = decode_base64(encoded)?;
        let mime_type = sniff_mime(&bytes).to_string();
        Ok(Self::Resolved(ResolvedImage { bytes, mime_type, source }))
    }
}

/// Vendor integration: validation, request building, response parsing.
pub trait ProviderAdapter: Send + Sync {
    /// Human-readable vendor name used in errors.
    fn name(&self) -> &'static str;

    /// Reject inputs this vendor cannot serve.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::ConfigMissing`] without credentials or
    /// [`ImageError::InvalidInput`] for unsatisfiable input.
    fn validate(&self, input: &NormalizedInput, config: &ProviderConfig) -> Result<(), ImageError>;

    /// Build the vendor HTTP request.
    fn build_request(&self, input: &NormalizedInput, config: &ProviderConfig) -> HttpRequest;

    /// Pull image payloads out of a successful response body.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::Decode`] for malformed embedded image data.
    fn extract_images(&self, body: &serde_json::Value) -> Result<Vec<ImagePayload>, ImageError>;

    /// Message reported for a non-200 response.
    fn error_message(&self, response: &HttpResponse) -> String {
        vendor_error_message(response)
    }

    /// Check status, extract images and reject empty results.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::Api`] for non-200 statuses and
    /// [`ImageError::NoImageData`] when nothing could be extracted.
    fn parse_response(&self, response: &HttpResponse) -> Result<Vec<ImagePayload>, ImageError> {
        if response.status != 200 {
            return Err(ImageError::Api {
                provider: self.name(),
                status: response.status,
                message: self.error_message(response),
            });
        }

        let images = self.extract_images(&response.body)?;
        if images.is_empty() {
            return Err(ImageError::NoImageData { provider: self.name(), diagnostic: diagnostic(&response.body) });
        }
        Ok(images)
    }
}

/// Select the adapter for a provider kind.
#[must_use]
pub fn adapter_for(kind: ProviderKind) -> &'static dyn ProviderAdapter {
    match kind {
        ProviderKind::OpenAi => &openai::OpenAiImages,
        ProviderKind::OpenAiChat => &openai_chat::OpenAiChat,
        ProviderKind::Gemini => &gemini::Gemini,
        ProviderKind::OpenRouter => &openrouter::OpenRouter,
    }
}

/// `error.message` from a vendor body, else `HTTP {status}`.
#[must_use]
pub fn vendor_error_message(response: &HttpResponse) -> String {
    response
        .body
        .pointer("/error/message")
        .and_then(serde_json::Value::as_str)
        .filter(|m| !m.is_empty())
        .map_or_else(|| format!("HTTP {}", response.status), str::to_string)
}

/// Fail with [`ImageError::ConfigMissing`] when the alias has no API key.
///
/// # Errors
///
/// Returns an error if the key is blank.
pub fn require_api_key(config: &ProviderConfig, vendor: &str) -> Result<(), ImageError> {
    if config.api_key.trim().is_empty() {
        return Err(ImageError::ConfigMissing(format!("{vendor} API key is not configured")));
    }
    Ok(())
}

/// Apply alias-level headers and deadline to a built request.
#[must_use]
pub fn with_alias_settings(mut request: HttpRequest, config: &ProviderConfig) -> HttpRequest {
    request.headers.extend(config.headers.iter().map(|(k, v)| (k.clone(), v.clone())));
    request.timeout_ms = config.timeout_ms;
    request
}

const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::RequireNone)
        .with_decode_allow_trailing_bits(true),
);

/// Decode base64 the way vendors actually emit it.
///
/// Accepts missing or extra padding, embedded whitespace and the URL-safe
/// alphabet. A dangling final symbol carries no full byte and is dropped.
///
/// # Errors
///
/// Returns [`ImageError::Decode`] on invalid symbols or an empty result.
pub fn decode_base64(encoded: &str) -> Result<Vec<u8>, ImageError> {
    let mut cleaned: String = encoded
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();
    while cleaned.ends_with('=') {
        cleaned.pop();
    }
    if cleaned.len() % 4 == 1 {
        cleaned.pop();
    }

    let bytes = LENIENT.decode(&cleaned).map_err(|e| ImageError::Decode(format!("invalid base64 image data: {e}")))?;
    if bytes.is_empty() {
        return Err(ImageError::Decode("image data is empty".to_string()));
    }
    Ok(bytes)
}

/// Download every pending payload concurrently, keeping the original order.
///
/// # Errors
///
/// Returns the first download failure.
pub async fn resolve_payloads(
    transport: &dyn HttpTransport,
    payloads: Vec<ImagePayload>,
) -> Result<Vec<ResolvedImage>, ImageError> {
    let jobs = payloads.into_iter().map(|payload| async move {
        match payload {
            ImagePayload::Resolved(image) => Ok::<_, ImageError>(image),
            ImagePayload::Pending { url } => {
                let download = transport.download(&url).await?;
                let mime_type = sniff_mime(&download.data).to_string();
                Ok(ResolvedImage { bytes: download.data, mime_type, source: ImageSource::Url })
            }
        }
    });
    futures::future::try_join_all(jobs).await
}
