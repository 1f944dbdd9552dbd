//! The `generate_image` tool: one call in, one manifest or error out.

use std::path::Path;

use serde::Serialize;
use tracing::Instrument;

use crate::config::Config;
use crate::context::ServiceContext;
use crate::error::ImageError;
use crate::input::{NormalizedInput, ToolInput};
use crate::output::{save_images, SavedImage};
use crate::params::validate_params;
use crate::providers::{adapter_for, resolve_payloads};

/// Tool name advertised to callers.
pub const TOOL_NAME: &str = "generate_image";

/// Successful result: every image written for this call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Manifest {
    /// Provider alias that served the call.
    pub provider: String,
    /// Model that generated the images.
    pub model: String,
    /// Saved images in response order.
    pub images: Vec<SavedImage>,
}

/// What the tool returns. Failures are values, never panics or `Err`s.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ToolResponse {
    /// Images were generated and saved.
    Success(Manifest),
    /// The call failed at some stage.
    Failure {
        /// Human-readable message.
        error: String,
        /// Stable machine-readable tag.
        code: &'static str,
    },
}

impl ToolResponse {
    /// Whether the call failed.
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Failure { .. })
    }
}

impl From<ImageError> for ToolResponse {
    fn from(err: ImageError) -> Self {
        Self::Failure { code: err.code(), error: err.to_string() }
    }
}

/// Serve one `generate_image` call.
///
/// Relative paths in the call resolve against `cwd`.
pub async fn generate_image(ctx: &ServiceContext, config: &Config, args: serde_json::Value, cwd: &Path) -> ToolResponse {
    let provider = args.get("provider").and_then(serde_json::Value::as_str).unwrap_or_default().to_string();
    let span = tracing::info_span!("generate_image", provider = %provider);

    match run(ctx, config, args, cwd).instrument(span).await {
        Ok(manifest) => ToolResponse::Success(manifest),
        Err(err) => {
            tracing::warn!(code = err.code(), "{TOOL_NAME} failed: {err}");
            err.into()
        }
    }
}

async fn run(ctx: &ServiceContext, config: &Config, args: serde_json::Value, cwd: &Path) -> Result<Manifest, ImageError> {
    let input: ToolInput =
        serde_json::from_value(args).map_err(|e| ImageError::InvalidInput(format!("malformed arguments: {e}")))?;
    let alias = input.validate_shape()?.to_ascii_lowercase();

    let provider_config = config.provider(&alias).ok_or_else(|| {
        let available = config.aliases();
        let available = if available.is_empty() { "none".to_string() } else { available.join(", ") };
        ImageError::ConfigMissing(format!("Provider '{alias}' is not configured. Available providers: {available}"))
    })?;

    let normalized = NormalizedInput::build(input, &alias, provider_config, &config.defaults, cwd)?;
    validate_params(&normalized.params, provider_config.kind).map_err(ImageError::InvalidInput)?;

    let adapter = adapter_for(provider_config.kind);
    adapter.validate(&normalized, provider_config)?;
    let request = adapter.build_request(&normalized, provider_config);
    tracing::info!(adapter = adapter.name(), model = %normalized.model, "generating");

    let response = ctx.transport.send(&request).await?;
    let payloads = adapter.parse_response(&response)?;
    let images = resolve_payloads(ctx.transport.as_ref(), payloads).await?;
    let saved = save_images(&images, &normalized.output)?;
    tracing::info!(count = saved.len(), dir = %normalized.output.dir.display(), "saved images");

    Ok(Manifest { provider: normalized.provider, model: normalized.model, images: saved })
}
