//! Tool-call input: the raw `generate_image` arguments and their normalized form.

use std::path::Path;

use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::config::{DefaultsConfig, ProviderConfig};
use crate::error::ImageError;
use crate::mime::{mime_for_extension, parse_data_url};
use crate::model::resolve_model;
use crate::output::{default_filename, resolve_output_dir, OutputOptions, OverwritePolicy};
use crate::params::ProviderParams;

/// Chat role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// Image reference carried by an `image_url` part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageUrl {
    /// Remote URL or `data:` URL.
    pub url: String,
}

/// Mime type plus base64 payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InlineData {
    #[serde(alias = "mimeType")]
    pub mime_type: String,
    pub data: String,
}

/// One typed piece of a multi-part message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text {
        text: String,
    },
    ImageUrl {
        image_url: ImageUrl,
    },
    InlineData {
        #[serde(alias = "inlineData")]
        inline_data: InlineData,
    },
}

/// Plain text or a list of typed parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl MessageContent {
    /// Concatenated text of the message, ignoring image parts.
    #[must_use]
    pub fn text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Parts(parts) => parts
                .iter()
                .filter_map(|part| match part {
                    ContentPart::Text { text } => Some(text.as_str()),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: MessageContent,
}

/// Optional output overrides on the tool call.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct OutputInput {
    pub dir: Option<String>,
    pub filename: Option<String>,
    pub overwrite: Option<OverwritePolicy>,
}

/// Raw `generate_image` arguments as received.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolInput {
    /// Provider alias.
    pub provider: Option<String>,
    pub model: Option<String>,
    pub prompt: Option<String>,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    /// Local file paths or `data:` URLs to attach.
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub params: ProviderParams,
    pub output: Option<OutputInput>,
}

impl ToolInput {
    /// Check that the call names a provider and carries something to generate from.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::InvalidInput`] describing what is missing.
    pub fn validate_shape(&self) -> Result<&str, ImageError> {
        let provider = self
            .provider
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| ImageError::InvalidInput("provider is required".to_string()))?;

        let has_prompt = self.prompt.as_deref().is_some_and(|p| !p.trim().is_empty());
        if !has_prompt && self.messages.is_empty() && self.images.is_empty() {
            return Err(ImageError::InvalidInput("one of prompt, messages or images is required".to_string()));
        }
        Ok(provider)
    }
}

/// Canonical request handed to provider adapters. Built once, never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedInput {
    pub provider: String,
    pub model: String,
    pub prompt: String,
    pub messages: Vec<ChatMessage>,
    pub params: ProviderParams,
    pub output: OutputOptions,
}

impl NormalizedInput {
    /// Merge the call with alias and default settings.
    ///
    /// Relative attachment paths and output directories resolve against `cwd`.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::InvalidInput`] for unreadable or disallowed attachments.
    pub fn build(
        input: ToolInput,
        provider: &str,
        config: &ProviderConfig,
        defaults: &DefaultsConfig,
        cwd: &Path,
    ) -> Result<Self, ImageError> {
        let model = resolve_model(input.model.as_deref().filter(|m| !m.trim().is_empty()).unwrap_or(&config.model));

        let mut messages = input.messages;
        let prompt = match input.prompt.filter(|p| !p.trim().is_empty()) {
            Some(prompt) => prompt,
            None => last_user_text(&messages).unwrap_or_default(),
        };
        if messages.is_empty() && !prompt.is_empty() {
            messages.push(ChatMessage { role: Role::User, content: MessageContent::Text(prompt.clone()) });
        }

        let attachments = input
            .images
            .iter()
            .map(|image| attachment_part(image, cwd))
            .collect::<Result<Vec<_>, _>>()?;
        attach_to_last_user(&mut messages, attachments);

        let out = input.output.unwrap_or_default();
        let output = OutputOptions {
            dir: resolve_output_dir(out.dir.as_deref().unwrap_or(&defaults.output_dir), cwd),
            filename: out.filename.unwrap_or_else(|| default_filename(&defaults.filename_prefix)),
            overwrite: out.overwrite.unwrap_or(defaults.overwrite),
        };

        Ok(Self { provider: provider.to_string(), model, prompt, messages, params: input.params, output })
    }
}

fn last_user_text(messages: &[ChatMessage]) -> Option<String> {
    messages
        .iter()
        .rev()
        .find(|m| m.role == Role::User)
        .map(|m| m.content.text())
        .filter(|text| !text.trim().is_empty())
}

/// Turn a local path or data URL into an `image_url` part carrying a data URL.
fn attachment_part(image: &str, cwd: &Path) -> Result<ContentPart, ImageError> {
    let url = if image.trim_start().starts_with("data:") {
        if parse_data_url(image).is_none() {
            return Err(ImageError::InvalidInput("image data URL must be data:image/<type>;base64,<data>".to_string()));
        }
        image.trim().to_string()
    } else {
        let path = cwd.join(image);
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
        let mime = mime_for_extension(ext).ok_or_else(|| {
            ImageError::InvalidInput(format!("Unsupported image type '{image}'. Allowed: png, jpg, jpeg, webp, gif"))
        })?;
        let bytes = std::fs::read(&path)
            .map_err(|e| ImageError::InvalidInput(format!("Failed to read image {}: {e}", path.display())))?;
        tracing::debug!(path = %path.display(), bytes = bytes.len(), "attached image");
        format!("data:{mime};base64,{}", base64::engine::general_purpose::STANDARD.encode(bytes))
    };
    Ok(ContentPart::ImageUrl { image_url: ImageUrl { url } })
}

fn attach_to_last_user(messages: &mut Vec<ChatMessage>, attachments: Vec<ContentPart>) {
    if attachments.is_empty() {
        return;
    }
    let Some(message) = messages.iter_mut().rev().find(|m| m.role == Role::User) else {
        messages.push(ChatMessage { role: Role::User, content: MessageContent::Parts(attachments) });
        return;
    };
    let mut parts = match std::mem::replace(&mut message.content, MessageContent::Parts(Vec::new())) {
        MessageContent::Text(text) if text.is_empty() => Vec::new(),
        MessageContent::Text(text) => vec![ContentPart::Text { text }],
        MessageContent::Parts(parts) => parts,
    };
    parts.extend(attachments);
    message.content = MessageContent::Parts(parts);
}
