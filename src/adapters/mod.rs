//! Adapter implementations for port traits.
//!
//! - `live/`: Real network implementations
//! - `recording/`: Record interactions to cassettes
//! - `replaying/`: Replay interactions from cassettes

pub mod live;
pub mod recording;
pub mod replaying;

use reqwest::Url;

use crate::error::ImageError;

/// Parse an image link, refusing anything but https.
///
/// Live and replayed downloads both go through this check.
///
/// # Errors
///
/// Returns [`ImageError::Decode`] for unparseable or non-https URLs.
pub fn https_image_url(url: &str) -> Result<Url, ImageError> {
    let parsed = Url::parse(url).map_err(|e| ImageError::Decode(format!("invalid image URL: {e}")))?;
    if parsed.scheme() != "https" {
        return Err(ImageError::Decode(format!(
            "refusing to download image over '{}'; only https is allowed",
            parsed.scheme()
        )));
    }
    Ok(parsed)
}
