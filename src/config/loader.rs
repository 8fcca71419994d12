//! Configuration Loader
//!
//! Loads and validates configuration from TOML files matching
//! config/pairsync.toml. Every section is optional and falls back to
//! defaults.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::adapters::dexscreener::DexScreenerConfig;
use crate::application::DEFAULT_BATCH_SIZE;

pub const BASE_URL_ENV: &str = "DEXSCREENER_BASE_URL";
pub const STORE_PATH_ENV: &str = "PAIRSYNC_STORE_PATH";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Main configuration structure matching pairsync.toml
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub dexscreener: DexScreenerSection,
    #[serde(default)]
    pub indexing: IndexingSection,
    #[serde(default)]
    pub storage: StorageSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

/// DexScreener API configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DexScreenerSection {
    /// API base URL, without trailing `/tokens`
    pub base_url: String,
    /// Per-request timeout
    pub timeout_secs: u64,
    /// Retries after the first attempt (429 and transport errors)
    pub max_retries: u32,
    /// Courtesy delay after each successful request
    pub rate_limit_delay_ms: u64,
}

impl Default for DexScreenerSection {
    fn default() -> Self {
        let defaults = DexScreenerConfig::default();
        Self {
            base_url: defaults.base_url,
            timeout_secs: defaults.timeout.as_secs(),
            max_retries: defaults.max_retries,
            rate_limit_delay_ms: defaults.rate_limit_delay.as_millis() as u64,
        }
    }
}

impl DexScreenerSection {
    /// Get base URL with environment variable override
    /// Checks DEXSCREENER_BASE_URL env var first, falls back to config value
    pub fn get_base_url(&self) -> String {
        env_or(std::env::var(BASE_URL_ENV).ok(), &self.base_url)
    }

    /// Client configuration with env overrides applied
    pub fn client_config(&self) -> DexScreenerConfig {
        DexScreenerConfig {
            base_url: self.get_base_url(),
            timeout: Duration::from_secs(self.timeout_secs),
            max_retries: self.max_retries,
            rate_limit_delay: Duration::from_millis(self.rate_limit_delay_ms),
            ..DexScreenerConfig::default()
        }
    }
}

/// Indexing run configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IndexingSection {
    /// Commit every N indexed documents
    pub batch_size: usize,
    /// Record the sync time on the connector after a successful run
    pub update_last_indexed: bool,
}

impl Default for IndexingSection {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            update_last_indexed: true,
        }
    }
}

/// Document store configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    /// Store file path; `~` is expanded
    pub path: String,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            path: "~/.pairsync/store.json".to_string(),
        }
    }
}

impl StorageSection {
    /// Get store path with environment variable override and `~` expanded
    /// Checks PAIRSYNC_STORE_PATH env var first, falls back to config value
    pub fn get_path(&self) -> PathBuf {
        let raw = env_or(std::env::var(STORE_PATH_ENV).ok(), &self.path);
        PathBuf::from(shellexpand::tilde(&raw).into_owned())
    }
}

/// Logging configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Non-empty env value wins over the config value
fn env_or(env_value: Option<String>, config_value: &str) -> String {
    env_value
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| config_value.to_string())
}

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

impl Config {
    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dexscreener.base_url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "base_url cannot be empty".to_string(),
            ));
        }

        if self.dexscreener.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(format!(
                "timeout_secs must be > 0, got {}",
                self.dexscreener.timeout_secs
            )));
        }

        if self.indexing.batch_size == 0 {
            return Err(ConfigError::ValidationError(format!(
                "batch_size must be > 0, got {}",
                self.indexing.batch_size
            )));
        }

        if self.storage.path.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "storage path cannot be empty".to_string(),
            ));
        }

        if !LOG_LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "unknown log level '{}', expected one of {:?}",
                self.logging.level, LOG_LEVELS
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_valid_config() -> String {
        r#"
[dexscreener]
base_url = "https://api.dexscreener.com/latest/dex"
timeout_secs = 15
max_retries = 5
rate_limit_delay_ms = 250

[indexing]
batch_size = 25
update_last_indexed = false

[storage]
path = "/var/lib/pairsync/store.json"

[logging]
level = "debug"
"#
        .to_string()
    }

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let file = write_config(&create_valid_config());
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.dexscreener.timeout_secs, 15);
        assert_eq!(config.dexscreener.max_retries, 5);
        assert_eq!(config.indexing.batch_size, 25);
        assert!(!config.indexing.update_last_indexed);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_config("/nonexistent/pairsync.toml");
        assert!(matches!(result, Err(ConfigError::IoError(_))));
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let file = write_config("");
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.dexscreener.base_url, "https://api.dexscreener.com/latest/dex");
        assert_eq!(config.dexscreener.timeout_secs, 30);
        assert_eq!(config.dexscreener.max_retries, 3);
        assert_eq!(config.dexscreener.rate_limit_delay_ms, 200);
        assert_eq!(config.indexing.batch_size, 10);
        assert!(config.indexing.update_last_indexed);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let file = write_config("[indexing]\nbatch_size = 3\n");
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.indexing.batch_size, 3);
        assert!(config.indexing.update_last_indexed);
    }

    #[test]
    fn test_invalid_batch_size() {
        let file = write_config(&create_valid_config().replace("batch_size = 25", "batch_size = 0"));
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_invalid_timeout() {
        let file = write_config(&create_valid_config().replace("timeout_secs = 15", "timeout_secs = 0"));
        assert!(matches!(
            load_config(file.path()),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_empty_base_url_rejected() {
        let file = write_config(&create_valid_config().replace(
            "base_url = \"https://api.dexscreener.com/latest/dex\"",
            "base_url = \"\"",
        ));
        assert!(matches!(
            load_config(file.path()),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_unknown_log_level() {
        let file = write_config(&create_valid_config().replace("level = \"debug\"", "level = \"loud\""));
        match load_config(file.path()) {
            Err(ConfigError::ValidationError(msg)) => assert!(msg.contains("loud")),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_toml() {
        let file = write_config("[indexing\nbatch_size = ");
        assert!(matches!(
            load_config(file.path()),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_env_value_wins_when_non_empty() {
        assert_eq!(env_or(Some("http://localhost:8080".into()), "https://x"), "http://localhost:8080");
        assert_eq!(env_or(Some("  ".into()), "https://x"), "https://x");
        assert_eq!(env_or(None, "https://x"), "https://x");
    }

    #[test]
    fn test_client_config_conversion() {
        let file = write_config(&create_valid_config());
        let config = load_config(file.path()).unwrap();
        let client = config.dexscreener.client_config();

        assert_eq!(client.timeout, Duration::from_secs(15));
        assert_eq!(client.max_retries, 5);
        assert_eq!(client.rate_limit_delay, Duration::from_millis(250));
        assert_eq!(client.backoff_base, Duration::from_secs(1));
    }

    #[test]
    fn test_storage_path_tilde_expanded() {
        let section = StorageSection {
            path: "~/pairsync/store.json".into(),
        };
        // Only meaningful when the override is unset
        if std::env::var(STORE_PATH_ENV).is_err() {
            let path = section.get_path();
            assert!(!path.to_string_lossy().starts_with('~'));
            assert!(path.ends_with("pairsync/store.json"));
        }
    }
}
