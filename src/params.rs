//! Provider-specific generation parameters and their validation.

use serde::{Deserialize, Serialize};

use crate::model::ProviderKind;

/// Optional tuning knobs; each adapter reads only the fields it understands.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderParams {
    /// Number of images (`OpenAI`).
    pub n: Option<u32>,
    /// Pixel size such as `1024x1024` (`OpenAI`).
    pub size: Option<String>,
    /// Quality level (`OpenAI`).
    pub quality: Option<String>,
    /// `vivid` or `natural` (`OpenAI`).
    pub style: Option<String>,
    /// `url` or `b64_json` (`OpenAI`).
    pub response_format: Option<String>,
    /// Background handling (`OpenAI`).
    pub background: Option<String>,
    /// Aspect ratio hint (Gemini).
    #[serde(alias = "aspectRatio")]
    pub aspect_ratio: Option<String>,
    /// Resolution hint `1K`/`2K`/`4K` (Gemini).
    #[serde(alias = "imageSize")]
    pub image_size: Option<String>,
    /// Output modalities (chat-completions providers).
    pub modalities: Option<Vec<String>>,
    /// Sampling temperature (chat-completions providers).
    pub temperature: Option<f64>,
    /// Nucleus sampling (chat-completions providers).
    pub top_p: Option<f64>,
    /// Completion token limit (chat-completions providers).
    pub max_tokens: Option<u32>,
}

const OPENAI_SIZES: &[&str] =
    &["256x256", "512x512", "1024x1024", "1792x1024", "1024x1792", "1536x1024", "1024x1536", "auto"];
const OPENAI_QUALITIES: &[&str] = &["standard", "hd", "low", "medium", "high", "auto"];
const OPENAI_STYLES: &[&str] = &["vivid", "natural"];
const OPENAI_RESPONSE_FORMATS: &[&str] = &["url", "b64_json"];
const OPENAI_BACKGROUNDS: &[&str] = &["transparent", "opaque", "auto"];
const GEMINI_ASPECT_RATIOS: &[&str] = &["1:1", "2:3", "3:2", "3:4", "4:3", "4:5", "5:4", "9:16", "16:9", "21:9"];
const GEMINI_IMAGE_SIZES: &[&str] = &["1K", "2K", "4K"];
const MODALITIES: &[&str] = &["image", "text"];

fn one_of(field: &str, value: Option<&String>, valid: &[&str]) -> Result<(), String> {
    match value {
        Some(v) if !valid.contains(&v.as_str()) => {
            Err(format!("Unsupported {field} '{v}'. Valid: {}", valid.join(", ")))
        }
        _ => Ok(()),
    }
}

fn in_range(field: &str, value: Option<f64>, min: f64, max: f64) -> Result<(), String> {
    match value {
        Some(v) if !(min..=max).contains(&v) => Err(format!("{field} must be between {min} and {max}, got {v}")),
        _ => Ok(()),
    }
}

/// Validate the params relevant to the given provider kind.
///
/// # Errors
///
/// Returns an error naming the first out-of-range or unknown value.
pub fn validate_params(params: &ProviderParams, kind: ProviderKind) -> Result<(), String> {
    match kind {
        ProviderKind::OpenAi => {
            if let Some(n) = params.n {
                if !(1..=10).contains(&n) {
                    return Err(format!("n must be between 1 and 10, got {n}"));
                }
            }
            one_of("size", params.size.as_ref(), OPENAI_SIZES)?;
            one_of("quality", params.quality.as_ref(), OPENAI_QUALITIES)?;
            one_of("style", params.style.as_ref(), OPENAI_STYLES)?;
            one_of("response_format", params.response_format.as_ref(), OPENAI_RESPONSE_FORMATS)?;
            one_of("background", params.background.as_ref(), OPENAI_BACKGROUNDS)
        }
        ProviderKind::Gemini => {
            one_of("aspect ratio", params.aspect_ratio.as_ref(), GEMINI_ASPECT_RATIOS)?;
            one_of("image size", params.image_size.as_ref(), GEMINI_IMAGE_SIZES)
        }
        ProviderKind::OpenAiChat | ProviderKind::OpenRouter => {
            for modality in params.modalities.iter().flatten() {
                one_of("modality", Some(modality), MODALITIES)?;
            }
            in_range("temperature", params.temperature, 0.0, 2.0)?;
            in_range("top_p", params.top_p, 0.0, 1.0)?;
            if params.max_tokens == Some(0) {
                return Err("max_tokens must be positive".to_string());
            }
            Ok(())
        }
    }
}
