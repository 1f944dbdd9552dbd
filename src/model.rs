//! Provider kinds, model name resolution and per-kind defaults.

/// Upstream API families an alias can be wired to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// `OpenAI` dedicated images endpoint (`/images/generations`).
    OpenAi,
    /// `OpenAI`-compatible chat-completions gateway returning images in messages.
    OpenAiChat,
    /// Google Gemini `generateContent`.
    Gemini,
    /// `OpenRouter` chat-completions with image modalities.
    OpenRouter,
}

impl ProviderKind {
    /// Parse a kind name as written in config (`openai`, `openai-chat`, ...).
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "openai" | "open-ai" => Some(Self::OpenAi),
            "openai-chat" | "chat" => Some(Self::OpenAiChat),
            "gemini" | "google" => Some(Self::Gemini),
            "openrouter" | "open-router" => Some(Self::OpenRouter),
            _ => None,
        }
    }

    /// Infer the kind from an alias name when no explicit type is configured.
    ///
    /// `gemini-backup` resolves to Gemini, `openrouter_eu` to `OpenRouter`.
    #[must_use]
    pub fn infer_from_alias(alias: &str) -> Option<Self> {
        let alias = alias.to_ascii_lowercase().replace('_', "-");
        if let Some(kind) = Self::parse(&alias) {
            return Some(kind);
        }
        if alias.starts_with("openai-chat") {
            Some(Self::OpenAiChat)
        } else if alias.starts_with("openrouter") {
            Some(Self::OpenRouter)
        } else if alias.starts_with("openai") {
            Some(Self::OpenAi)
        } else if alias.starts_with("gemini") || alias.starts_with("google") {
            Some(Self::Gemini)
        } else {
            None
        }
    }

    /// Base URL used when an alias does not configure one.
    #[must_use]
    pub fn default_base_url(self) -> &'static str {
        match self {
            Self::OpenAi | Self::OpenAiChat => "https://api.openai.com/v1",
            Self::Gemini => "https://generativelanguage.googleapis.com/v1beta",
            Self::OpenRouter => "https://openrouter.ai/api/v1",
        }
    }

    /// Model used when neither the call nor the alias names one.
    #[must_use]
    pub fn default_model(self) -> &'static str {
        match self {
            Self::OpenAi => "dall-e-3",
            Self::OpenAiChat => "gpt-4o",
            Self::Gemini => "gemini-2.0-flash-exp-image-generation",
            Self::OpenRouter => "google/gemini-2.5-flash-image-preview",
        }
    }
}

/// Short name aliases for popular models.
const ALIASES: &[(&str, &str)] = &[
    ("nano-banana", "gemini-2.5-flash-image-preview"),
    ("nano-banana-pro", "gemini-3-pro-image-preview"),
    ("gpt-1.5", "gpt-image-1.5"),
    ("gpt-1", "gpt-image-1"),
    ("gpt-1-mini", "gpt-image-1-mini"),
];

/// Resolve a model name (alias or exact) to the full model identifier.
#[must_use]
pub fn resolve_model(name: &str) -> String {
    for &(alias, full) in ALIASES {
        if name == alias {
            return full.to_string();
        }
    }
    name.to_string()
}
