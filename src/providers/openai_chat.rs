//! `OpenAI`-compatible chat-completions endpoint used for image generation.

use serde_json::Value;

use super::normalize::extract_chat_images;
use super::{require_api_key, with_alias_settings, ImagePayload, ProviderAdapter};
use crate::config::ProviderConfig;
use crate::error::ImageError;
use crate::input::{ChatMessage, ContentPart, MessageContent, NormalizedInput};
use crate::ports::HttpRequest;

const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Adapter for `POST {base}/chat/completions` on `OpenAI`-compatible servers.
pub struct OpenAiChat;

impl ProviderAdapter for OpenAiChat {
    fn name(&self) -> &'static str {
        "OpenAI chat"
    }

    fn validate(&self, input: &NormalizedInput, config: &ProviderConfig) -> Result<(), ImageError> {
        require_api_key(config, self.name())?;
        if input.messages.is_empty() {
            return Err(ImageError::InvalidInput("OpenAI chat image generation requires a prompt or messages".to_string()));
        }
        Ok(())
    }

    fn build_request(&self, input: &NormalizedInput, config: &ProviderConfig) -> HttpRequest {
        let body = chat_body(input);
        let request = HttpRequest::post_json(format!("{}/chat/completions", config.base_url), body)
            .header("Authorization", format!("Bearer {}", config.api_key));
        with_alias_settings(request, config)
    }

    fn extract_images(&self, body: &Value) -> Result<Vec<ImagePayload>, ImageError> {
        extract_chat_images(body)
    }
}

/// Chat-completions body with image output requested.
///
/// `modalities` defaults to `[image, text]` and `max_tokens` to 4096;
/// sampling params are sent only when set.
pub(crate) fn chat_body(input: &NormalizedInput) -> Value {
    let params = &input.params;
    let modalities = params.modalities.clone().unwrap_or_else(|| vec!["image".to_string(), "text".to_string()]);

    let mut body = serde_json::json!({
        "model": input.model,
        "messages": chat_messages(&input.messages),
        "modalities": modalities,
        "max_tokens": params.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
    });
    if let Some(temperature) = params.temperature {
        body["temperature"] = temperature.into();
    }
    if let Some(top_p) = params.top_p {
        body["top_p"] = top_p.into();
    }
    body
}

/// Render messages in the chat-completions wire shape.
///
/// Inline-data parts have no chat-completions equivalent and are sent as
/// `image_url` parts carrying a data URL.
pub(crate) fn chat_messages(messages: &[ChatMessage]) -> Value {
    messages
        .iter()
        .map(|message| {
            let content = match &message.content {
                MessageContent::Text(text) => Value::String(text.clone()),
                MessageContent::Parts(parts) => parts.iter().map(chat_part).collect(),
            };
            serde_json::json!({ "role": message.role, "content": content })
        })
        .collect()
}

fn chat_part(part: &ContentPart) -> Value {
    match part {
        ContentPart::Text { text } => serde_json::json!({"type": "text", "text": text}),
        ContentPart::ImageUrl { image_url } => {
            serde_json::json!({"type": "image_url", "image_url": {"url": image_url.url}})
        }
        ContentPart::InlineData { inline_data } => serde_json::json!({
            "type": "image_url",
            "image_url": {"url": format!("data:{};base64,{}", inline_data.mime_type, inline_data.data)},
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{InlineData, Role};
    use crate::model::ProviderKind;
    use crate::providers::test_support::{config, input, ok, text, with_image};

    #[test]
    fn request_carries_chat_messages() {
        let call = input(
            "draw",
            vec![text(Role::System, "be brief"), with_image(Role::User, "draw", "https://x.example.com/ref.png")],
        );
        let request = OpenAiChat.build_request(&call, &config(ProviderKind::OpenAiChat));

        assert_eq!(request.url, "https://api.example.com/v1/chat/completions");
        assert_eq!(request.headers["Authorization"], "Bearer test-key");
        let body = request.body.unwrap();
        assert_eq!(body["model"], "test-model");
        assert_eq!(body["messages"][0], serde_json::json!({"role": "system", "content": "be brief"}));
        assert_eq!(body["messages"][1]["content"][1]["image_url"]["url"], "https://x.example.com/ref.png");
        assert_eq!(body["modalities"], serde_json::json!(["image", "text"]));
        assert_eq!(body["max_tokens"], 4096);
        assert!(body.get("temperature").is_none());
        assert!(body.get("top_p").is_none());
        assert!(!request.headers.contains_key("X-Title"));
    }

    #[test]
    fn sampling_params_reach_the_body() {
        let mut call = input("draw", vec![text(Role::User, "draw")]);
        call.params.temperature = Some(0.5);
        call.params.top_p = Some(0.9);
        call.params.max_tokens = Some(512);
        call.params.modalities = Some(vec!["image".into()]);

        let body = OpenAiChat.build_request(&call, &config(ProviderKind::OpenAiChat)).body.unwrap();
        assert_eq!(body["temperature"], 0.5);
        assert_eq!(body["top_p"], 0.9);
        assert_eq!(body["max_tokens"], 512);
        assert_eq!(body["modalities"], serde_json::json!(["image"]));
    }

    #[test]
    fn inline_data_becomes_data_url() {
        let message = ChatMessage {
            role: Role::User,
            content: MessageContent::Parts(vec![ContentPart::InlineData {
                inline_data: InlineData { mime_type: "image/png".into(), data: "AAAA".into() },
            }]),
        };
        let rendered = chat_messages(&[message]);
        assert_eq!(rendered[0]["content"][0]["image_url"]["url"], "data:image/png;base64,AAAA");
    }

    #[test]
    fn validation_requires_messages() {
        let err = OpenAiChat.validate(&input("", Vec::new()), &config(ProviderKind::OpenAiChat)).unwrap_err();
        assert!(matches!(err, ImageError::InvalidInput(_)));
        assert!(OpenAiChat.validate(&input("x", vec![text(Role::User, "x")]), &config(ProviderKind::OpenAiChat)).is_ok());
    }

    #[test]
    fn parses_markdown_images_from_assistant_text() {
        let body = serde_json::json!({"choices": [{"message": {
            "role": "assistant",
            "content": "Done!\n![result](data:image/png;base64,iVBORw0KGgo=)\n![alt](https://cdn.example.com/2.png)"
        }}]});
        let images = OpenAiChat.parse_response(&ok(body)).unwrap();
        assert_eq!(images.len(), 2);
        assert_eq!(images[1], ImagePayload::Pending { url: "https://cdn.example.com/2.png".into() });
    }
}
