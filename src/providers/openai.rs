//! `OpenAI` dedicated Images API (`/images/generations`).

use serde::Deserialize;

use super::{require_api_key, with_alias_settings, ImagePayload, ImageSource, ProviderAdapter};
use crate::config::ProviderConfig;
use crate::error::ImageError;
use crate::input::NormalizedInput;
use crate::ports::HttpRequest;

/// Adapter for `POST {base}/images/generations`.
pub struct OpenAiImages;

impl ProviderAdapter for OpenAiImages {
    fn name(&self) -> &'static str {
        "OpenAI"
    }

    fn validate(&self, input: &NormalizedInput, config: &ProviderConfig) -> Result<(), ImageError> {
        require_api_key(config, self.name())?;
        if input.prompt.trim().is_empty() {
            return Err(ImageError::InvalidInput("OpenAI image generation requires a prompt or user message".to_string()));
        }
        Ok(())
    }

    fn build_request(&self, input: &NormalizedInput, config: &ProviderConfig) -> HttpRequest {
        let params = &input.params;
        let mut body = serde_json::json!({
            "model": input.model,
            "prompt": input.prompt,
            "n": params.n.unwrap_or(1),
            "size": params.size.as_deref().unwrap_or("1024x1024"),
            "quality": params.quality.as_deref().unwrap_or("standard"),
            "response_format": params.response_format.as_deref().unwrap_or("b64_json"),
        });
        if let Some(style) = &params.style {
            body["style"] = style.as_str().into();
        }
        if let Some(background) = &params.background {
            body["background"] = background.as_str().into();
        }

        let request = HttpRequest::post_json(format!("{}/images/generations", config.base_url), body)
            .header("Authorization", format!("Bearer {}", config.api_key));
        with_alias_settings(request, config)
    }

    fn extract_images(&self, body: &serde_json::Value) -> Result<Vec<ImagePayload>, ImageError> {
        let Ok(parsed) = OpenAiResponse::deserialize(body) else {
            return Ok(Vec::new());
        };

        let mut images = Vec::new();
        for item in parsed.data {
            if let Some(b64) = item.b64_json.filter(|b| !b.is_empty()) {
                images.push(ImagePayload::from_base64(&b64, ImageSource::B64)?);
            } else if let Some(url) = item.url.filter(|u| !u.is_empty()) {
                images.push(ImagePayload::Pending { url });
            }
        }
        Ok(images)
    }
}

// --- OpenAI API response types ---

#[derive(Deserialize)]
struct OpenAiResponse {
    #[serde(default)]
    data: Vec<OpenAiImageData>,
}

#[derive(Deserialize)]
struct OpenAiImageData {
    b64_json: Option<String>,
    url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ProviderKind;
    use crate::providers::test_support::{config, input, ok};

    #[test]
    fn request_shape_and_defaults() {
        let mut call = input("a cat", Vec::new());
        call.params.style = Some("vivid".into());
        let request = OpenAiImages.build_request(&call, &config(ProviderKind::OpenAi));

        assert_eq!(request.method, "POST");
        assert_eq!(request.url, "https://api.example.com/v1/images/generations");
        assert_eq!(request.headers["Authorization"], "Bearer test-key");
        let body = request.body.unwrap();
        assert_eq!(body["model"], "test-model");
        assert_eq!(body["prompt"], "a cat");
        assert_eq!(body["n"], 1);
        assert_eq!(body["size"], "1024x1024");
        assert_eq!(body["response_format"], "b64_json");
        assert_eq!(body["style"], "vivid");
        assert!(body.get("background").is_none());
    }

    #[test]
    fn alias_headers_and_timeout_apply() {
        let mut cfg = config(ProviderKind::OpenAi);
        cfg.timeout_ms = 1234;
        cfg.headers.insert("OpenAI-Organization".into(), "org-1".into());
        let request = OpenAiImages.build_request(&input("x", Vec::new()), &cfg);
        assert_eq!(request.timeout_ms, 1234);
        assert_eq!(request.headers["OpenAI-Organization"], "org-1");
    }

    #[test]
    fn validation_requires_key_and_prompt() {
        let mut cfg = config(ProviderKind::OpenAi);
        assert!(matches!(OpenAiImages.validate(&input("", Vec::new()), &cfg), Err(ImageError::InvalidInput(_))));
        cfg.api_key = " ".into();
        assert!(matches!(OpenAiImages.validate(&input("x", Vec::new()), &cfg), Err(ImageError::ConfigMissing(_))));
    }

    #[test]
    fn extracts_base64_and_url_items_in_order() {
        let body = serde_json::json!({"data": [
            {"b64_json": "iVBORw0KGgo="},
            {"url": "https://cdn.example.com/img.png"},
            {"revised_prompt": "nothing here"}
        ]});
        let images = OpenAiImages.parse_response(&ok(body)).unwrap();
        assert_eq!(images.len(), 2);
        assert!(matches!(&images[0], ImagePayload::Resolved(img) if img.mime_type == "image/png" && img.source == ImageSource::B64));
        assert_eq!(images[1], ImagePayload::Pending { url: "https://cdn.example.com/img.png".into() });
    }

    #[test]
    fn missing_data_is_no_image_data() {
        let err = OpenAiImages.parse_response(&ok(serde_json::json!({"created": 1}))).unwrap_err();
        assert!(matches!(err, ImageError::NoImageData { provider: "OpenAI", .. }));
    }

    #[test]
    fn malformed_base64_is_decode_error() {
        let body = serde_json::json!({"data": [{"b64_json": "###"}]});
        assert!(matches!(OpenAiImages.parse_response(&ok(body)), Err(ImageError::Decode(_))));
    }
}
