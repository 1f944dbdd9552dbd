//! Image extraction from chat-completions style responses.
//!
//! Gateways return generated images in several shapes: a `message.images[]`
//! convenience field, markdown embedded in string content, or a content array
//! mixing `text`, `image_url` and `inline_data` parts. Every recognized image
//! is collected in scan order.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use super::{decode_base64, ImagePayload, ImageSource, ResolvedImage};
use crate::error::ImageError;
use crate::mime::{parse_data_url, sniff_mime};

fn markdown_data_image() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"!\[[^\]]*\]\((data:image/[^;\s)]+;base64,[^)\s]+)\)").expect("valid regex")
    })
}

fn markdown_url_image() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"!\[[^\]]*\]\((https?://[^)\s]+)\)").expect("valid regex"))
}

/// Collect images from every choice of a chat-completions body.
///
/// # Errors
///
/// Returns [`ImageError::Decode`] when an embedded base64 payload is malformed.
pub fn extract_chat_images(body: &Value) -> Result<Vec<ImagePayload>, ImageError> {
    let mut images = Vec::new();
    let choices = body.get("choices").and_then(Value::as_array).map(Vec::as_slice).unwrap_or_default();

    for message in choices.iter().filter_map(|choice| choice.get("message")) {
        for item in message.get("images").and_then(Value::as_array).into_iter().flatten() {
            match item {
                Value::String(url) => images.extend(url_payload(url)?),
                _ => images.extend(part_payload(item)?),
            }
        }

        match message.get("content") {
            Some(Value::String(text)) => images.extend(markdown_images(text)?),
            Some(Value::Array(parts)) => {
                for part in parts {
                    if let Some(text) = part.get("text").and_then(Value::as_str) {
                        images.extend(markdown_images(text)?);
                    } else {
                        images.extend(part_payload(part)?);
                    }
                }
            }
            _ => {}
        }
    }
    Ok(images)
}

/// Markdown `![..](data:image/..;base64,..)` matches first, then `![..](https://..)`.
///
/// # Errors
///
/// Returns [`ImageError::Decode`] when an embedded payload is malformed.
pub fn markdown_images(text: &str) -> Result<Vec<ImagePayload>, ImageError> {
    let mut images = Vec::new();
    for caps in markdown_data_image().captures_iter(text) {
        images.extend(url_payload(&caps[1])?);
    }
    for caps in markdown_url_image().captures_iter(text) {
        images.push(ImagePayload::Pending { url: caps[1].to_string() });
    }
    Ok(images)
}

/// Decode a vendor inline-data part, trusting its MIME type when it names an image.
///
/// # Errors
///
/// Returns [`ImageError::Decode`] when the payload is malformed.
pub fn inline_payload(mime_type: Option<&str>, data: &str) -> Result<ImagePayload, ImageError> {
    let bytes = decode_base64(data)?;
    let mime_type = match mime_type {
        Some(mime) if mime.starts_with("image/") => mime.to_string(),
        _ => sniff_mime(&bytes).to_string(),
    };
    Ok(ImagePayload::Resolved(ResolvedImage { bytes, mime_type, source: ImageSource::Inline }))
}

/// A data URL becomes a decoded `b64` payload, an http(s) URL a pending one.
fn url_payload(url: &str) -> Result<Option<ImagePayload>, ImageError> {
    if let Some((_, data)) = parse_data_url(url) {
        return ImagePayload::from_base64(data, ImageSource::B64).map(Some);
    }
    if url.starts_with("https://") || url.starts_with("http://") {
        return Ok(Some(ImagePayload::Pending { url: url.to_string() }));
    }
    Ok(None)
}

/// `image_url` (object or string), `inline_data`/`inlineData`, or a bare `url`.
fn part_payload(part: &Value) -> Result<Option<ImagePayload>, ImageError> {
    if let Some(image_url) = part.get("image_url") {
        let url = match image_url {
            Value::String(url) => Some(url.as_str()),
            other => other.get("url").and_then(Value::as_str),
        };
        return url.map_or(Ok(None), url_payload);
    }

    if let Some(inline) = part.get("inline_data").or_else(|| part.get("inlineData")) {
        let Some(data) = inline.get("data").and_then(Value::as_str) else { return Ok(None) };
        let mime = inline.get("mime_type").or_else(|| inline.get("mimeType")).and_then(Value::as_str);
        return inline_payload(mime, data).map(Some);
    }

    part.get("url").and_then(Value::as_str).map_or(Ok(None), url_payload)
}
