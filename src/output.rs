//! File naming, collision handling and image saving.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ImageError;
use crate::mime::extension_for_mime;
use crate::providers::{ImageSource, ResolvedImage};

/// What to do when the target output path already exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverwritePolicy {
    /// Fail with an "already exists" error.
    Error,
    /// Replace the existing file.
    Overwrite,
    /// Probe `name-1`, `name-2`, ... until a free path is found.
    #[default]
    Suffix,
}

impl OverwritePolicy {
    /// Parse a policy name.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "error" => Some(Self::Error),
            "overwrite" => Some(Self::Overwrite),
            "suffix" => Some(Self::Suffix),
            _ => None,
        }
    }
}

/// Fully resolved output options for one call.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputOptions {
    /// Absolute destination directory.
    pub dir: PathBuf,
    /// Base filename without extension (sanitized on save).
    pub filename: String,
    /// Collision policy.
    pub overwrite: OverwritePolicy,
}

/// A persisted image, as reported in the manifest.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedImage {
    /// Absolute path of the written file.
    pub path: PathBuf,
    /// MIME type of the written bytes.
    pub mime_type: String,
    /// Number of bytes written.
    pub size_bytes: usize,
    /// Position of the image in the upstream response.
    pub index: usize,
    /// How the image arrived.
    pub source: ImageSource,
}

/// Reduce a requested filename to a safe single path segment.
///
/// Keeps only the final segment, strips leading dots and replaces anything
/// outside `[A-Za-z0-9_.-]` with `_`. An empty result becomes `image`.
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    let last_segment = name.trim_end_matches(['/', '\\']).rsplit(['/', '\\']).next().unwrap_or_default();
    let safe: String = last_segment
        .trim_start_matches('.')
        .chars()
        .map(|ch| if ch.is_ascii_alphanumeric() || matches!(ch, '_' | '.' | '-') { ch } else { '_' })
        .collect();

    if safe.is_empty() {
        "image".to_string()
    } else {
        safe
    }
}

/// Default base filename: `{prefix}-{YYYY-MM-DDTHH-MM-SS}`.
#[must_use]
pub fn default_filename(prefix: &str) -> String {
    let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H-%M-%S");
    format!("{prefix}-{timestamp}")
}

/// Resolve a possibly relative output directory against `cwd`.
#[must_use]
pub fn resolve_output_dir(dir: &str, cwd: &Path) -> PathBuf {
    let dir = Path::new(dir);
    if dir.is_absolute() {
        dir.to_path_buf()
    } else {
        cwd.join(dir)
    }
}

/// Write every image to disk, in order, and return the manifest entries.
///
/// Image 0 is saved as `filename.ext`, image `i` as `filename-{i+1:02}.ext`,
/// with the extension taken from each image's own MIME type.
///
/// # Errors
///
/// Returns an error if the directory cannot be created, a path collides
/// under [`OverwritePolicy::Error`], or a write fails.
pub fn save_images(images: &[ResolvedImage], options: &OutputOptions) -> Result<Vec<SavedImage>, ImageError> {
    let filename = sanitize_filename(&options.filename);
    std::fs::create_dir_all(&options.dir)?;

    let mut saved = Vec::with_capacity(images.len());
    for (index, image) in images.iter().enumerate() {
        let ext = extension_for_mime(&image.mime_type);
        let base = if index == 0 { filename.clone() } else { format!("{filename}-{:02}", index + 1) };
        let path = unique_path(&options.dir, &base, ext, options.overwrite)?;

        std::fs::write(&path, &image.bytes)?;
        tracing::debug!(path = %path.display(), bytes = image.bytes.len(), "saved image");

        saved.push(SavedImage {
            path,
            mime_type: image.mime_type.clone(),
            size_bytes: image.bytes.len(),
            index,
            source: image.source,
        });
    }
    Ok(saved)
}

/// Pick the output path for `base` + `ext` under the given policy.
fn unique_path(dir: &Path, base: &str, ext: &str, policy: OverwritePolicy) -> Result<PathBuf, ImageError> {
    let path = dir.join(format!("{base}{ext}"));
    if policy == OverwritePolicy::Overwrite || !path.exists() {
        return Ok(path);
    }
    if policy == OverwritePolicy::Error {
        return Err(ImageError::AlreadyExists(path));
    }

    let mut counter = 1u32;
    loop {
        let candidate = dir.join(format!("{base}-{counter}{ext}"));
        if !candidate.exists() {
            return Ok(candidate);
        }
        counter += 1;
    }
}
