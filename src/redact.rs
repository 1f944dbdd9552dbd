//! Scrubbing secrets and bounding diagnostics before they leave the process.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;

/// Upper bound on upstream text echoed back in error messages.
pub const DIAGNOSTIC_LIMIT: usize = 500;

const SECRET_HEADERS: &[&str] = &["authorization", "x-goog-api-key", "x-api-key", "api-key"];

fn key_param() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(?i)key=[^&\s"']+"#).expect("valid regex"))
}

/// Replace every `key=<value>` query parameter with `key=***`.
#[must_use]
pub fn redact_api_key(text: &str) -> String {
    key_param().replace_all(text, "key=***").into_owned()
}

/// Truncate to `max` characters, marking the cut with `...`.
#[must_use]
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// Bounded, redacted rendering of an upstream body for error messages.
#[must_use]
pub fn diagnostic(body: &serde_json::Value) -> String {
    let text = match body.get("rawText").and_then(serde_json::Value::as_str) {
        Some(raw) => raw.to_string(),
        None => body.to_string(),
    };
    truncate_chars(&redact_api_key(&text), DIAGNOSTIC_LIMIT)
}

/// Copy of `headers` with credential-bearing values masked.
#[must_use]
pub fn redact_headers(headers: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    headers
        .iter()
        .map(|(name, value)| {
            let masked = if SECRET_HEADERS.contains(&name.to_ascii_lowercase().as_str()) {
                "***".to_string()
            } else {
                value.clone()
            };
            (name.clone(), masked)
        })
        .collect()
}
