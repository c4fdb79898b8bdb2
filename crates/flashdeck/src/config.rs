//! Configuration management for flashdeck.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "flashdeck";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "flashdeck.db";

/// Environment variable consulted when no generator API key is configured.
const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Largest number of cards a single generation may request.
const MAX_CARD_COUNT: usize = 100;

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `FLASHDECK_`, `__` between sections)
/// 2. TOML config file at `~/.config/flashdeck/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Deck store behaviour.
    pub store: StoreConfig,
    /// AI generator configuration.
    pub generator: GeneratorConfig,
    /// QR payload configuration.
    pub qr: QrConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/flashdeck/flashdeck.db`
    pub database_path: Option<PathBuf>,
}

/// Deck store configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Report operations on missing decks or cards as errors instead of
    /// ignoring them.
    pub strict: bool,
}

/// AI generator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Base URL of the generation API.
    pub endpoint: String,
    /// Model name used for generation.
    pub model: String,
    /// API key. Falls back to `GEMINI_API_KEY` when unset. Never serialized.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Number of cards requested per generation.
    pub card_count: usize,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

/// QR payload configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QrConfig {
    /// Maximum length of an encoded payload.
    pub max_payload_len: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-2.5-flash".to_string(),
            api_key: None,
            card_count: 10,
            timeout_secs: 60,
        }
    }
}

impl Default for QrConfig {
    fn default() -> Self {
        Self {
            // Byte-mode capacity of a version 40-L code.
            max_payload_len: 2953,
        }
    }
}

impl GeneratorConfig {
    /// The configured API key, or the one from the environment.
    #[must_use]
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .filter(|key| !key.trim().is_empty())
    }

    /// Get the request timeout as a Duration.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Configuration is loaded in this order (later sources override earlier):
    /// 1. Default values
    /// 2. TOML config file (if exists)
    /// 3. Environment variables (prefixed with `FLASHDECK_`)
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("FLASHDECK_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        let generator = &self.generator;

        if generator.card_count == 0 || generator.card_count > MAX_CARD_COUNT {
            return Err(Error::ConfigValidation {
                message: format!(
                    "generator.card_count must be between 1 and {MAX_CARD_COUNT}, got {}",
                    generator.card_count
                ),
            });
        }

        if generator.timeout_secs == 0 {
            return Err(Error::ConfigValidation {
                message: "generator.timeout_secs must be greater than 0".to_string(),
            });
        }

        if generator.endpoint.trim().is_empty() || generator.model.trim().is_empty() {
            return Err(Error::ConfigValidation {
                message: "generator.endpoint and generator.model must not be empty".to_string(),
            });
        }

        if self.qr.max_payload_len == 0 {
            return Err(Error::ConfigValidation {
                message: "qr.max_payload_len must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert!(!config.store.strict);
        assert!(config.storage.database_path.is_none());
        assert_eq!(config.generator.card_count, 10);
        assert_eq!(config.qr.max_payload_len, 2953);
    }

    #[test]
    fn test_default_generator_config() {
        let generator = GeneratorConfig::default();

        assert!(generator.endpoint.starts_with("https://"));
        assert_eq!(generator.model, "gemini-2.5-flash");
        assert!(generator.api_key.is_none());
        assert_eq!(generator.timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_validate_valid_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_card_count() {
        let mut config = Config::default();
        config.generator.card_count = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("card_count"));
    }

    #[test]
    fn test_validate_card_count_too_large() {
        let mut config = Config::default();
        config.generator.card_count = 500;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("card_count"));
    }

    #[test]
    fn test_validate_zero_timeout() {
        let mut config = Config::default();
        config.generator.timeout_secs = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("timeout_secs"));
    }

    #[test]
    fn test_validate_empty_model() {
        let mut config = Config::default();
        config.generator.model = "  ".to_string();

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_zero_payload_len() {
        let mut config = Config::default();
        config.qr.max_payload_len = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("max_payload_len"));
    }

    #[test]
    fn test_database_path_default() {
        let config = Config::default();
        let path = config.database_path();

        assert!(path.to_string_lossy().contains("flashdeck.db"));
    }

    #[test]
    fn test_database_path_custom() {
        let mut config = Config::default();
        config.storage.database_path = Some(PathBuf::from("/custom/path/decks.sqlite"));

        assert_eq!(
            config.database_path(),
            PathBuf::from("/custom/path/decks.sqlite")
        );
    }

    #[test]
    fn test_resolved_api_key_prefers_config() {
        let mut generator = GeneratorConfig::default();
        generator.api_key = Some("from-config".to_string());

        assert_eq!(generator.resolved_api_key().as_deref(), Some("from-config"));
    }

    #[test]
    fn test_resolved_api_key_ignores_blank() {
        let mut generator = GeneratorConfig::default();
        generator.api_key = Some("   ".to_string());

        assert_ne!(generator.resolved_api_key().as_deref(), Some("   "));
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("flashdeck"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_load_nonexistent_config() {
        let result = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml")));
        assert!(result.is_ok());
    }

    #[test]
    fn test_load_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[store]\nstrict = true\n\n[generator]\ncard_count = 25\n\n[qr]\nmax_payload_len = 1000\n",
        )
        .unwrap();

        let config = Config::load_from(Some(path)).unwrap();
        assert!(config.store.strict);
        assert_eq!(config.generator.card_count, 25);
        assert_eq!(config.qr.max_payload_len, 1000);
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[generator]\ncard_count = 0\n").unwrap();

        let err = Config::load_from(Some(path)).unwrap_err();
        assert!(matches!(err, Error::ConfigValidation { .. }));
    }

    #[test]
    fn test_generator_config_serialize_skips_missing_key() {
        let generator = GeneratorConfig::default();
        let json = serde_json::to_string(&generator).unwrap();
        assert!(json.contains("card_count"));
        assert!(!json.contains("api_key"));
    }

    #[test]
    fn test_generator_config_serialize_hides_key() {
        let mut config = Config::default();
        config.generator.api_key = Some("sk-secret".to_string());

        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("sk-secret"));
        assert!(!json.contains("api_key"));
    }

    #[test]
    fn test_load_api_key_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[generator]\napi_key = \"from-file\"\n").unwrap();

        let config = Config::load_from(Some(path)).unwrap();
        assert_eq!(config.generator.api_key.as_deref(), Some("from-file"));
    }

    #[test]
    fn test_store_config_deserialize() {
        let json = r#"{"strict": true}"#;
        let store: StoreConfig = serde_json::from_str(json).unwrap();
        assert!(store.strict);
    }
}
