//! Configuration file parser for the feed endpoint.
//!
//! The config file is optional — a missing file yields `Config::default()`.
//! Unknown keys are silently ignored by serde, though we log a warning when
//! the file contains potential typos. The config layer is the only place
//! that constructs the feed query URL; the loader treats URLs as opaque.
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;
use url::Url;

/// Env var that overrides the config-file API key.
pub const API_KEY_ENV: &str = "HEADLINES_API_KEY";

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config file exceeds the maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),

    /// The configured endpoint is not a parseable URL.
    #[error("Invalid feed endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),
}

// ============================================================================
// Configuration Struct
// ============================================================================

/// Application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be
/// specified; missing keys fall back to `Default::default()`.
///
/// The custom Debug impl masks `api_key` so the secret never reaches logs
/// or error output.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base content API endpoint queried for the feed page.
    pub endpoint: String,

    /// Optional section filter appended as the `section` query parameter.
    pub section: Option<String>,

    /// API key appended as the `api-key` query parameter.
    /// The HEADLINES_API_KEY env var takes precedence over this value.
    pub api_key: Option<String>,

    /// Number of feed URLs the loader keeps completed results for.
    pub cache_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: "https://content.guardianapis.com/search".to_string(),
            section: None,
            api_key: None,
            cache_capacity: crate::loader::DEFAULT_CACHE_CAPACITY,
        }
    }
}

/// Mask api_key in Debug output to prevent secret leakage.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("endpoint", &self.endpoint)
            .field("section", &self.section)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("cache_capacity", &self.cache_capacity)
            .finish()
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → silently accepted, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        // Check file size before reading so a corrupted or runaway config
        // file cannot exhaust memory.
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Race: file deleted between metadata and read
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        // Parse as a raw table first to warn about unknown keys
        if let Ok(raw) = content.parse::<toml::Table>() {
            let known_keys = ["endpoint", "section", "api_key", "cache_capacity"];
            for key in raw.keys() {
                if !known_keys.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(&content)?;
        tracing::info!(path = %path.display(), endpoint = %config.endpoint, "Loaded configuration");
        Ok(config)
    }

    /// Assemble the feed query URL: endpoint plus `section` and `api-key`
    /// query parameters. The env var key, when set, outranks the file key.
    pub fn query_url(&self) -> Result<String, ConfigError> {
        let mut url = Url::parse(&self.endpoint)?;
        let env_key = env_api_key();

        if self.section.is_some() || env_key.is_some() || self.api_key.is_some() {
            let mut pairs = url.query_pairs_mut();
            if let Some(section) = &self.section {
                pairs.append_pair("section", section);
            }
            if let Some(key) = &env_key {
                pairs.append_pair("api-key", key.expose_secret());
            } else if let Some(key) = &self.api_key {
                pairs.append_pair("api-key", key);
            }
        }
        Ok(url.into())
    }
}

fn env_api_key() -> Option<SecretString> {
    std::env::var(API_KEY_ENV).ok().map(SecretString::from)
}

// ============================================================================
// Tests
// ============================================================================
