//! Configuration file loading with environment variable overrides.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;

use crate::model::ProviderKind;
use crate::output::OverwritePolicy;
use crate::ports::http_transport::DEFAULT_TIMEOUT_MS;

/// Resolved, read-only configuration: output defaults plus provider aliases.
#[derive(Debug, Default)]
pub struct Config {
    /// Output defaults applied when a call leaves them unset.
    pub defaults: DefaultsConfig,
    entries: BTreeMap<String, ProviderEntry>,
    providers: BTreeMap<String, ProviderConfig>,
}

/// Output defaults from the config file or `IMAGE_GEN_*` variables.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    /// Directory images are written to.
    pub output_dir: String,
    /// Prefix for generated filenames.
    pub filename_prefix: String,
    /// Collision policy.
    pub overwrite: OverwritePolicy,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            output_dir: ".".to_string(),
            filename_prefix: "image".to_string(),
            overwrite: OverwritePolicy::Suffix,
        }
    }
}

/// A usable provider alias.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderConfig {
    /// Adapter this alias is wired to.
    pub kind: ProviderKind,
    /// API credential.
    pub api_key: String,
    /// Base URL without trailing slash.
    pub base_url: String,
    /// Model used when the call does not name one.
    pub model: String,
    /// Deadline for the generation call.
    pub timeout_ms: u64,
    /// Extra headers sent with every call.
    pub headers: BTreeMap<String, String>,
}

/// Raw alias as written in the file or assembled from the environment.
#[derive(Debug, Clone, Default, Deserialize)]
struct ProviderEntry {
    #[serde(rename = "type")]
    kind: Option<String>,
    api_key: Option<String>,
    api_url: Option<String>,
    model: Option<String>,
    timeout_ms: Option<u64>,
    #[serde(default)]
    headers: BTreeMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    defaults: DefaultsConfig,
    #[serde(default)]
    providers: BTreeMap<String, ProviderEntry>,
}

fn provider_var() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^PROVIDER_([A-Z0-9_]+)_(API_KEY|API_URL|MODEL|TYPE|TIMEOUT_MS)$")
            .expect("valid regex")
    })
}

impl Config {
    /// Load configuration from the given path, or return defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
        Self::from_toml(&contents)
            .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))
    }

    /// Parse configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns the TOML error if the text is malformed.
    pub fn from_toml(contents: &str) -> Result<Self, toml::de::Error> {
        let file: ConfigFile = toml::from_str(contents)?;
        let entries =
            file.providers.into_iter().map(|(alias, entry)| (alias.to_ascii_lowercase(), entry)).collect();
        let mut config = Self { defaults: file.defaults, entries, providers: BTreeMap::new() };
        config.rebuild();
        Ok(config)
    }

    /// Apply `IMAGE_GEN_*` and `PROVIDER_{NAME}_*` overrides.
    ///
    /// An alias that only exists in the environment must define `API_KEY`,
    /// `API_URL` and `MODEL`; otherwise it is left out without an error.
    #[must_use]
    pub fn with_env<I>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut from_env: BTreeMap<String, ProviderEntry> = BTreeMap::new();

        for (key, value) in vars {
            if value.is_empty() {
                continue;
            }
            match key.as_str() {
                "IMAGE_GEN_OUTPUT_DIR" => self.defaults.output_dir = value,
                "IMAGE_GEN_FILENAME_PREFIX" => self.defaults.filename_prefix = value,
                "IMAGE_GEN_OVERWRITE" => match OverwritePolicy::parse(&value) {
                    Some(policy) => self.defaults.overwrite = policy,
                    None => tracing::warn!(value = %value, "ignoring unknown IMAGE_GEN_OVERWRITE"),
                },
                _ => {
                    let Some(caps) = provider_var().captures(&key) else { continue };
                    let alias = caps[1].to_ascii_lowercase();
                    let entry = from_env.entry(alias).or_default();
                    match &caps[2] {
                        "API_KEY" => entry.api_key = Some(value),
                        "API_URL" => entry.api_url = Some(value),
                        "MODEL" => entry.model = Some(value),
                        "TYPE" => entry.kind = Some(value),
                        _ => match value.parse() {
                            Ok(ms) => entry.timeout_ms = Some(ms),
                            Err(_) => tracing::warn!(var = %key, "ignoring non-numeric timeout"),
                        },
                    }
                }
            }
        }

        for (alias, env_entry) in from_env {
            match self.entries.get_mut(&alias) {
                Some(entry) => entry.merge(env_entry),
                None if env_entry.is_complete() => {
                    self.entries.insert(alias, env_entry);
                }
                None => tracing::debug!(alias = %alias, "skipping incomplete provider alias"),
            }
        }

        self.rebuild();
        self
    }

    /// Look up a configured provider alias (case-insensitive).
    #[must_use]
    pub fn provider(&self, alias: &str) -> Option<&ProviderConfig> {
        self.providers.get(&alias.trim().to_ascii_lowercase())
    }

    /// Names of all usable aliases, sorted.
    #[must_use]
    pub fn aliases(&self) -> Vec<&str> {
        self.providers.keys().map(String::as_str).collect()
    }

    fn rebuild(&mut self) {
        self.providers = self
            .entries
            .iter()
            .filter_map(|(alias, entry)| entry.resolve(alias).map(|p| (alias.clone(), p)))
            .collect();
    }
}

impl ProviderEntry {
    fn is_complete(&self) -> bool {
        [&self.api_key, &self.api_url, &self.model]
            .iter()
            .all(|field| field.as_deref().is_some_and(|v| !v.trim().is_empty()))
    }

    fn merge(&mut self, other: Self) {
        self.kind = other.kind.or(self.kind.take());
        self.api_key = other.api_key.or(self.api_key.take());
        self.api_url = other.api_url.or(self.api_url.take());
        self.model = other.model.or(self.model.take());
        self.timeout_ms = other.timeout_ms.or(self.timeout_ms);
        self.headers.extend(other.headers);
    }

    fn resolve(&self, alias: &str) -> Option<ProviderConfig> {
        let kind = match &self.kind {
            Some(name) => ProviderKind::parse(name),
            None => ProviderKind::infer_from_alias(alias),
        };
        let Some(kind) = kind else {
            tracing::debug!(alias, "skipping provider alias with unknown type");
            return None;
        };
        let api_key = self.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty())?;
        let base_url = self
            .api_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .unwrap_or(kind.default_base_url())
            .trim_end_matches('/')
            .to_string();
        let model = self
            .model
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(kind.default_model())
            .to_string();
        Some(ProviderConfig {
            kind,
            api_key: api_key.to_string(),
            base_url,
            model,
            timeout_ms: self.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS),
            headers: self.headers.clone(),
        })
    }
}

/// Discover the config file path using the resolution order:
/// 1. Explicit path (from `--config` flag)
/// 2. `IMAGECAST_CONFIG` environment variable
/// 3. `~/.config/imagecast/config.toml`
#[must_use]
pub fn discover_config_path(explicit: Option<&str>) -> PathBuf {
    if let Some(p) = explicit {
        return PathBuf::from(p);
    }

    if let Ok(p) = std::env::var("IMAGECAST_CONFIG") {
        return PathBuf::from(p);
    }

    default_config_path()
}

/// Default config path: `~/.config/imagecast/config.toml`.
fn default_config_path() -> PathBuf {
    if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".config/imagecast/config.toml")
    } else {
        PathBuf::from("imagecast.toml")
    }
}
