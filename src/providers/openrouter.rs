//! `OpenRouter` chat-completions API with image output modality.

use serde_json::Value;

use super::normalize::extract_chat_images;
use super::openai_chat::chat_body;
use super::{require_api_key, with_alias_settings, ImagePayload, ProviderAdapter};
use crate::config::ProviderConfig;
use crate::error::ImageError;
use crate::input::NormalizedInput;
use crate::ports::HttpRequest;

const APP_TITLE: &str = "imagecast";

/// Adapter for `POST {base}/chat/completions` on `OpenRouter`.
pub struct OpenRouter;

impl ProviderAdapter for OpenRouter {
    fn name(&self) -> &'static str {
        "OpenRouter"
    }

    fn validate(&self, input: &NormalizedInput, config: &ProviderConfig) -> Result<(), ImageError> {
        require_api_key(config, self.name())?;
        if input.messages.is_empty() && input.prompt.trim().is_empty() {
            return Err(ImageError::InvalidInput("OpenRouter requires a prompt or messages".to_string()));
        }
        Ok(())
    }

    fn build_request(&self, input: &NormalizedInput, config: &ProviderConfig) -> HttpRequest {
        let body = chat_body(input);
        let request = HttpRequest::post_json(format!("{}/chat/completions", config.base_url), body)
            .header("Authorization", format!("Bearer {}", config.api_key))
            .header("X-Title", APP_TITLE);
        with_alias_settings(request, config)
    }

    fn extract_images(&self, body: &Value) -> Result<Vec<ImagePayload>, ImageError> {
        extract_chat_images(body)
    }
}
