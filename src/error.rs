//! Unified error type for imagecast.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while serving a `generate_image` call.
#[derive(Debug, Error)]
pub enum ImageError {
    /// The requested provider alias has no usable configuration.
    #[error("{0}")]
    ConfigMissing(String),

    /// The tool input or provider params are invalid.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// An upstream API answered with a non-200 status.
    #[error("{provider} API error ({status}): {message}")]
    Api {
        /// Provider adapter name.
        provider: &'static str,
        /// HTTP status code.
        status: u16,
        /// Error message from the API, or the bare status.
        message: String,
    },

    /// A network error occurred before a response was received.
    #[error("Network error: {0}")]
    Network(String),

    /// An outbound call did not finish within its deadline.
    #[error("Request timed out after {0} ms")]
    Timeout(u64),

    /// Image bytes could not be decoded or fetched.
    #[error("Decode error: {0}")]
    Decode(String),

    /// The output path exists and the overwrite policy is `error`.
    #[error("File already exists: {}", .0.display())]
    AlreadyExists(PathBuf),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The upstream response parsed fine but carried no image.
    #[error("{provider} response contained no image data. Body: {diagnostic}")]
    NoImageData {
        /// Provider adapter name.
        provider: &'static str,
        /// Bounded, redacted excerpt of the upstream body.
        diagnostic: String,
    },

    /// Configuration file error.
    #[error("Config error: {0}")]
    Config(String),
}

impl ImageError {
    /// Stable machine-readable tag reported alongside the message.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigMissing(_) | Self::Config(_) => "CONFIG_MISSING",
            Self::InvalidInput(_) => "INVALID_PARAMS",
            Self::Api { .. } | Self::Network(_) | Self::Timeout(_) => "HTTP_ERROR",
            Self::Decode(_) => "DECODE_ERROR",
            Self::AlreadyExists(_) | Self::Io(_) => "SAVE_ERROR",
            Self::NoImageData { .. } => "PROVIDER_ERROR",
        }
    }
}

impl From<reqwest::Error> for ImageError {
    fn from(err: reqwest::Error) -> Self {
        // The URL may carry a `key=` query parameter.
        Self::Network(err.without_url().to_string())
    }
}
