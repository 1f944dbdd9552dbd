//! Image format sniffing, MIME/extension mapping and data URLs.

use std::sync::OnceLock;

use regex::Regex;

/// Classify image bytes by magic number. Unknown or short input is PNG.
#[must_use]
pub fn sniff_mime(data: &[u8]) -> &'static str {
    if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
        "image/png"
    } else if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        "image/jpeg"
    } else if data.starts_with(b"RIFF") {
        "image/webp"
    } else if data.starts_with(b"GIF8") {
        "image/gif"
    } else {
        "image/png"
    }
}

/// File extension (with dot) for a MIME type; unknown types map to `.png`.
#[must_use]
pub fn extension_for_mime(mime: &str) -> &'static str {
    match mime {
        "image/jpeg" | "image/jpg" => ".jpg",
        "image/webp" => ".webp",
        "image/gif" => ".gif",
        _ => ".png",
    }
}

/// MIME type for an attachment file extension, if it is an allowed image type.
#[must_use]
pub fn mime_for_extension(ext: &str) -> Option<&'static str> {
    match ext.to_ascii_lowercase().as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        _ => None,
    }
}

fn data_url_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^data:(image/[A-Za-z0-9.+-]+);base64,(\S+)$").expect("valid regex")
    })
}

/// Split a `data:image/<subtype>;base64,<payload>` URL into MIME type and payload.
#[must_use]
pub fn parse_data_url(url: &str) -> Option<(&str, &str)> {
    let caps = data_url_pattern().captures(url.trim())?;
    Some((caps.get(1)?.as_str(), caps.get(2)?.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniff_known_magic_numbers() {
        assert_eq!(sniff_mime(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A]), "image/png");
        assert_eq!(sniff_mime(&[0xFF, 0xD8, 0xFF, 0xE0]), "image/jpeg");
        assert_eq!(sniff_mime(b"RIFF\x24\0\0\0WEBPVP8 "), "image/webp");
        assert_eq!(sniff_mime(b"GIF89a"), "image/gif");
        assert_eq!(sniff_mime(b"GIF87a"), "image/gif");
    }

    #[test]
    fn sniff_defaults_to_png() {
        assert_eq!(sniff_mime(&[]), "image/png");
        assert_eq!(sniff_mime(&[0xFF, 0xD8]), "image/png");
        assert_eq!(sniff_mime(b"GIF"), "image/png");
        assert_eq!(sniff_mime(b"BM\0\0\0\0"), "image/png");
        assert_eq!(sniff_mime(b"<html>"), "image/png");
    }

    #[test]
    fn extension_mapping() {
        assert_eq!(extension_for_mime("image/png"), ".png");
        assert_eq!(extension_for_mime("image/jpeg"), ".jpg");
        assert_eq!(extension_for_mime("image/webp"), ".webp");
        assert_eq!(extension_for_mime("image/gif"), ".gif");
        assert_eq!(extension_for_mime("image/bmp"), ".png");
    }

    #[test]
    fn attachment_allow_list() {
        assert_eq!(mime_for_extension("JPG"), Some("image/jpeg"));
        assert_eq!(mime_for_extension("jpeg"), Some("image/jpeg"));
        assert_eq!(mime_for_extension("webp"), Some("image/webp"));
        assert_eq!(mime_for_extension("svg"), None);
        assert_eq!(mime_for_extension("txt"), None);
    }

    #[test]
    fn data_url_parts() {
        assert_eq!(
            parse_data_url("data:image/png;base64,iVBORw0KGgo="),
            Some(("image/png", "iVBORw0KGgo="))
        );
        assert_eq!(parse_data_url("data:image/svg+xml;base64,PHN2Zz4="), Some(("image/svg+xml", "PHN2Zz4=")));
        assert_eq!(parse_data_url("data:text/plain;base64,aGk="), None);
        assert_eq!(parse_data_url("data:image/png,rawbytes"), None);
        assert_eq!(parse_data_url("https://example.com/a.png"), None);
    }
}
