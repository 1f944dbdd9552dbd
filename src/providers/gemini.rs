//! Google Gemini `generateContent` API with image response modality.

use serde_json::Value;

use super::normalize::inline_payload;
use super::{require_api_key, vendor_error_message, with_alias_settings, ImagePayload, ProviderAdapter};
use crate::config::ProviderConfig;
use crate::error::ImageError;
use crate::input::{ChatMessage, ContentPart, MessageContent, NormalizedInput, Role};
use crate::mime::parse_data_url;
use crate::ports::{HttpRequest, HttpResponse};
use crate::redact::redact_api_key;

/// Adapter for `POST {base}/models/{model}:generateContent`.
pub struct Gemini;

impl ProviderAdapter for Gemini {
    fn name(&self) -> &'static str {
        "Gemini"
    }

    fn validate(&self, input: &NormalizedInput, config: &ProviderConfig) -> Result<(), ImageError> {
        require_api_key(config, self.name())?;
        if input.messages.is_empty() && input.prompt.trim().is_empty() {
            return Err(ImageError::InvalidInput("Gemini requires a prompt or messages".to_string()));
        }
        Ok(())
    }

    fn build_request(&self, input: &NormalizedInput, config: &ProviderConfig) -> HttpRequest {
        let (system, conversation): (Vec<&ChatMessage>, Vec<&ChatMessage>) =
            input.messages.iter().partition(|m| m.role == Role::System);

        let contents: Vec<Value> = conversation
            .iter()
            .map(|message| {
                let role = if message.role == Role::Assistant { "model" } else { "user" };
                serde_json::json!({ "role": role, "parts": gemini_parts(&message.content) })
            })
            .collect();

        let mut generation_config = serde_json::json!({ "responseModalities": ["TEXT", "IMAGE"] });
        let params = &input.params;
        if params.aspect_ratio.is_some() || params.image_size.is_some() {
            let mut image_config = serde_json::Map::new();
            if let Some(ratio) = &params.aspect_ratio {
                image_config.insert("aspectRatio".to_string(), ratio.as_str().into());
            }
            if let Some(size) = &params.image_size {
                image_config.insert("imageSize".to_string(), size.as_str().into());
            }
            generation_config["imageConfig"] = Value::Object(image_config);
        }

        let mut body = serde_json::json!({ "contents": contents, "generationConfig": generation_config });
        if !system.is_empty() {
            let parts: Vec<Value> = system.iter().flat_map(|m| gemini_parts(&m.content)).collect();
            body["systemInstruction"] = serde_json::json!({ "parts": parts });
        }

        let url = format!("{}/models/{}:generateContent?key={}", config.base_url, input.model, config.api_key);
        with_alias_settings(HttpRequest::post_json(url, body), config)
    }

    fn extract_images(&self, body: &Value) -> Result<Vec<ImagePayload>, ImageError> {
        let mut images = Vec::new();
        let candidates = body.get("candidates").and_then(Value::as_array).map(Vec::as_slice).unwrap_or_default();

        for candidate in candidates {
            let parts = candidate.pointer("/content/parts").and_then(Value::as_array).map(Vec::as_slice);
            for inline in parts.unwrap_or_default().iter().filter_map(|p| p.get("inlineData")) {
                let Some(data) = inline.get("data").and_then(Value::as_str) else { continue };
                let mime = inline.get("mimeType").and_then(Value::as_str);
                images.push(inline_payload(mime, data)?);
            }
        }
        Ok(images)
    }

    fn error_message(&self, response: &HttpResponse) -> String {
        redact_api_key(&vendor_error_message(response))
    }
}

fn gemini_parts(content: &MessageContent) -> Vec<Value> {
    match content {
        MessageContent::Text(text) => vec![serde_json::json!({ "text": text })],
        MessageContent::Parts(parts) => parts.iter().map(gemini_part).collect(),
    }
}

fn gemini_part(part: &ContentPart) -> Value {
    match part {
        ContentPart::Text { text } => serde_json::json!({ "text": text }),
        ContentPart::ImageUrl { image_url } => match parse_data_url(&image_url.url) {
            Some((mime_type, data)) => serde_json::json!({ "inlineData": { "mimeType": mime_type, "data": data } }),
            None => serde_json::json!({ "fileData": { "fileUri": image_url.url } }),
        },
        ContentPart::InlineData { inline_data } => serde_json::json!({
            "inlineData": { "mimeType": inline_data.mime_type, "data": inline_data.data }
        }),
    }
}
