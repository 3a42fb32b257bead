//! Configuration loading, validation, and management for GroundChat.
//!
//! Loads configuration from `~/.groundchat/config.toml` with environment
//! variable overrides. The chat API key and the search credential pool are
//! required: a missing or empty value fails at startup with a descriptive
//! [`ConfigError`] instead of running with degraded behavior.

pub mod preferences;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub use preferences::FilePreferences;

/// Environment variable holding the bearer key for the chat endpoint.
pub const API_KEY_ENV: &str = "GROUNDCHAT_API_KEY";
/// Environment variable holding the comma-separated search credential pool.
pub const SEARCH_KEYS_ENV: &str = "GROUNDCHAT_SEARCH_KEYS";
pub const BASE_URL_ENV: &str = "GROUNDCHAT_BASE_URL";
pub const MODEL_ENV: &str = "GROUNDCHAT_MODEL";

/// The root configuration structure.
///
/// Maps directly to `~/.groundchat/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Bearer key for the chat, models and image endpoints
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Search credential pool
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub search_keys: Vec<String>,

    /// Base URL of the OpenAI-compatible API (without trailing slash)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Default chat model
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Sampling temperature for chat requests
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Extra system prompt appended after the time stamp line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,

    /// Search client settings
    #[serde(default)]
    pub search: SearchConfig,

    /// Image generation settings
    #[serde(default)]
    pub image: ImageConfig,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_model() -> String {
    "gpt-4o-mini".into()
}
fn default_temperature() -> f32 {
    0.7
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("search_keys", &format_args!("[{} REDACTED]", self.search_keys.len()))
            .field("base_url", &self.base_url)
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("system_prompt", &self.system_prompt)
            .field("search", &self.search)
            .field("image", &self.image)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Search endpoint URL
    #[serde(default = "default_search_url")]
    pub url: String,

    /// Attempts per search, each with a fresh credential
    #[serde(default = "default_search_attempts")]
    pub max_attempts: u32,

    /// Per-request timeout in seconds
    #[serde(default = "default_search_timeout")]
    pub timeout_secs: u64,
}

fn default_search_url() -> String {
    "https://api.search.brave.com/res/v1/web/search".into()
}
fn default_search_attempts() -> u32 {
    3
}
fn default_search_timeout() -> u64 {
    10
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            url: default_search_url(),
            max_attempts: default_search_attempts(),
            timeout_secs: default_search_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageConfig {
    #[serde(default = "default_image_model")]
    pub model: String,

    #[serde(default = "default_image_size")]
    pub size: String,
}

fn default_image_model() -> String {
    "dall-e-3".into()
}
fn default_image_size() -> String {
    "1024x1024".into()
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            model: default_image_model(),
            size: default_image_size(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.groundchat/config.toml),
    /// apply environment overrides, and require both secrets.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        Self::load_with_env(&config_path, |key| std::env::var(key).ok())
    }

    /// Like [`AppConfig::load`] with an explicit file and environment lookup.
    pub fn load_with_env(
        path: &Path,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
        config.apply_env(env);
        config.require_credentials()?;
        Ok(config)
    }

    /// Load configuration from a specific file path without requiring secrets.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Environment variables take priority over the file.
    fn apply_env(&mut self, env: impl Fn(&str) -> Option<String>) {
        if let Some(key) = env(API_KEY_ENV) {
            self.api_key = Some(key);
        }
        if let Some(keys) = env(SEARCH_KEYS_ENV) {
            self.search_keys = parse_key_list(&keys);
        }
        if let Some(url) = env(BASE_URL_ENV) {
            self.base_url = url;
        }
        if let Some(model) = env(MODEL_ENV) {
            self.default_model = model;
        }
        self.base_url = self.base_url.trim_end_matches('/').to_string();
        self.search_keys = clean_keys(&self.search_keys);
    }

    /// Fail fast when either required secret is missing or blank.
    pub fn require_credentials(&self) -> Result<(), ConfigError> {
        match self.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => {}
            _ => return Err(ConfigError::Missing(API_KEY_ENV)),
        }

        if clean_keys(&self.search_keys).is_empty() {
            return Err(ConfigError::Missing(SEARCH_KEYS_ENV));
        }

        Ok(())
    }

    /// The chat API key. Only meaningful after [`AppConfig::require_credentials`].
    pub fn api_key(&self) -> &str {
        self.api_key.as_deref().unwrap_or_default()
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".groundchat")
    }

    /// Validate the non-secret settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.default_temperature < 0.0 || self.default_temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.search.max_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "search.max_attempts must be at least 1".into(),
            ));
        }

        Ok(())
    }

    /// Generate a default config TOML string (for the `init` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            search_keys: Vec::new(),
            base_url: default_base_url(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            system_prompt: None,
            search: SearchConfig::default(),
            image: ImageConfig::default(),
        }
    }
}

/// Split a comma-separated credential list, dropping blanks.
pub fn parse_key_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(String::from)
        .collect()
}

/// Trim every credential and drop the blank ones.
fn clean_keys(keys: &[String]) -> Vec<String> {
    keys.iter()
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .map(String::from)
        .collect()
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    #[error("Missing required setting: set {0} to a non-empty value")]
    Missing(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert_eq!(config.default_model, "gpt-4o-mini");
        assert_eq!(config.search.max_attempts, 3);
        assert_eq!(config.search.timeout_secs, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.base_url, config.base_url);
        assert_eq!(parsed.search.url, config.search.url);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let config = AppConfig {
            default_temperature: 5.0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn env_supplies_both_secrets() {
        let config = AppConfig::load_with_env(
            Path::new("/nonexistent/config.toml"),
            env_from(&[
                (API_KEY_ENV, "sk-test"),
                (SEARCH_KEYS_ENV, "k1, k2 ,,k3"),
                (BASE_URL_ENV, "http://localhost:8080/v1/"),
            ]),
        )
        .unwrap();
        assert_eq!(config.api_key(), "sk-test");
        assert_eq!(config.search_keys, vec!["k1", "k2", "k3"]);
        assert_eq!(config.base_url, "http://localhost:8080/v1");
    }

    #[test]
    fn missing_api_key_fails_fast() {
        let err = AppConfig::load_with_env(
            Path::new("/nonexistent/config.toml"),
            env_from(&[(SEARCH_KEYS_ENV, "k1")]),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Missing(API_KEY_ENV)));
        assert!(err.to_string().contains(API_KEY_ENV));
    }

    #[test]
    fn blank_search_keys_fail_fast() {
        let err = AppConfig::load_with_env(
            Path::new("/nonexistent/config.toml"),
            env_from(&[(API_KEY_ENV, "sk-test"), (SEARCH_KEYS_ENV, " , ,")]),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Missing(SEARCH_KEYS_ENV)));
    }

    #[test]
    fn file_values_are_overridden_by_env() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
api_key = "from-file"
search_keys = ["file-key"]
default_model = "file-model"
system_prompt = "Be brief."

[search]
max_attempts = 5
"#,
        )
        .unwrap();

        let config =
            AppConfig::load_with_env(&path, env_from(&[(MODEL_ENV, "env-model")])).unwrap();
        assert_eq!(config.api_key(), "from-file");
        assert_eq!(config.default_model, "env-model");
        assert_eq!(config.system_prompt.as_deref(), Some("Be brief."));
        assert_eq!(config.search.max_attempts, 5);
    }

    #[test]
    fn blank_entries_in_file_keys_are_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "api_key = \"sk\"\nsearch_keys = [\"\", \"   \", \" real \"]\n",
        )
        .unwrap();

        let config = AppConfig::load_with_env(&path, env_from(&[])).unwrap();
        assert_eq!(config.search_keys, vec!["real"]);
    }

    #[test]
    fn zero_search_attempts_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[search]\nmax_attempts = 0\n").unwrap();
        assert!(matches!(
            AppConfig::load_from(&path),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let config = AppConfig {
            api_key: Some("sk-very-secret".into()),
            search_keys: vec!["brave-secret".into()],
            ..AppConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-very-secret"));
        assert!(!debug.contains("brave-secret"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("gpt-4o-mini"));
        assert!(toml_str.contains("api.search.brave.com"));
    }
}
