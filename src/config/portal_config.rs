//! Portal Configuration - server, storage, feedback and logging settings
//!
//! Every tunable lives here as a TOML value. Each struct implements `Default`
//! so a missing file or a partial file still yields a complete config.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::defaults;

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for a portal deployment.
///
/// Load with `PortalConfig::load()` which searches:
/// 1. `$NEWS_FEEDBACK_CONFIG` env var
/// 2. `./news_feedback.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortalConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub feedback: FeedbackSettings,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl PortalConfig {
    /// Load configuration using the standard search order:
    /// 1. `$NEWS_FEEDBACK_CONFIG` environment variable
    /// 2. `./news_feedback.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        if let Ok(path) = std::env::var(defaults::CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded config from {}", defaults::CONFIG_ENV_VAR);
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from {}, falling back", defaults::CONFIG_ENV_VAR);
                    }
                }
            } else {
                warn!(path = %path, "{} points to non-existent file, falling back", defaults::CONFIG_ENV_VAR);
            }
        }

        let local = PathBuf::from(defaults::CONFIG_FILE_NAME);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded config from ./{}", defaults::CONFIG_FILE_NAME);
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{}, using defaults", defaults::CONFIG_FILE_NAME);
                }
            }
        }

        info!("No {} found, using built-in defaults", defaults::CONFIG_FILE_NAME);
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, err) => ConfigError::Parse(path.to_path_buf(), err),
            other => other,
        })
    }

    /// Parse and validate a TOML document.
    ///
    /// Two-pass: unknown keys are reported as warnings first, then serde
    /// deserialization and range validation run.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        for w in super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }

        let config: Self = toml::from_str(contents)
            .map_err(|e| ConfigError::Parse(PathBuf::new(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Validate all values for internal consistency.
    ///
    /// Rules:
    /// - Default rating must be a valid star rating (1–5)
    /// - Confirmation window must be 1..=60 seconds
    /// - Server address, storage path and namespace must be non-empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.server.addr.trim().is_empty() {
            errors.push("server.addr must not be empty".to_string());
        }

        if self.storage.backend == StorageBackend::Sled && self.storage.path.as_os_str().is_empty() {
            errors.push("storage.path must not be empty for the sled backend".to_string());
        }
        if self.storage.namespace.trim().is_empty() {
            errors.push("storage.namespace must not be empty".to_string());
        }
        if self.storage.namespace.contains('/') {
            errors.push(format!(
                "storage.namespace ({}) must be a single path segment",
                self.storage.namespace
            ));
        }

        if !(1..=5).contains(&self.feedback.default_rating) {
            errors.push(format!(
                "feedback.default_rating ({}) must be between 1 and 5",
                self.feedback.default_rating
            ));
        }
        if !(1..=defaults::MAX_CONFIRMATION_SECS).contains(&self.feedback.confirmation_secs) {
            errors.push(format!(
                "feedback.confirmation_secs ({}) must be between 1 and {}",
                self.feedback.confirmation_secs,
                defaults::MAX_CONFIRMATION_SECS
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config I/O error ({}): {}", .0.display(), .1)]
    Io(PathBuf, #[source] std::io::Error),
    #[error("Config parse error ({}): {}", .0.display(), .1)]
    Parse(PathBuf, #[source] toml::de::Error),
    #[error("Config serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation failed:\n{}", bullet_list(.0))]
    Validation(Vec<String>),
}

fn bullet_list(errors: &[String]) -> String {
    errors.iter().map(|e| format!("  - {e}\n")).collect()
}

// ============================================================================
// Server
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP bind address
    #[serde(default = "default_server_addr")]
    pub addr: String,

    /// Allowed cross-origin origins. Empty means same-origin only.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_server_addr() -> String {
    defaults::SERVER_ADDR.to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_server_addr(),
            cors_origins: Vec::new(),
        }
    }
}

// ============================================================================
// Storage
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Sled,
    Memory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Sled database directory
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,

    /// Root of the key tree
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

fn default_storage_path() -> PathBuf {
    PathBuf::from(defaults::STORAGE_PATH)
}
fn default_namespace() -> String {
    defaults::STORAGE_NAMESPACE.to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            path: default_storage_path(),
            namespace: default_namespace(),
        }
    }
}

// ============================================================================
// Feedback
// ============================================================================

/// Submission form behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackSettings {
    /// Rating used when the submitter does not pick one
    #[serde(default = "default_rating")]
    pub default_rating: u8,

    /// Seconds the confirmation stays visible after a successful submit
    #[serde(default = "default_confirmation_secs")]
    pub confirmation_secs: u64,
}

fn default_rating() -> u8 { defaults::DEFAULT_RATING }
fn default_confirmation_secs() -> u64 { defaults::CONFIRMATION_SECS }

impl Default for FeedbackSettings {
    fn default() -> Self {
        Self {
            default_rating: default_rating(),
            confirmation_secs: default_confirmation_secs(),
        }
    }
}

// ============================================================================
// Logging
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        let config = PortalConfig::default();
        assert!(config.validate().is_ok(), "Default config must always validate");
    }

    #[test]
    fn test_empty_toml_produces_defaults() {
        let config: PortalConfig = toml::from_str("").expect("empty TOML should parse");
        assert_eq!(config, PortalConfig::default());
        assert_eq!(config.server.addr, "0.0.0.0:8080");
        assert_eq!(config.storage.namespace, "NewsSentimentAnalysis");
        assert_eq!(config.feedback.default_rating, 5);
        assert_eq!(config.feedback.confirmation_secs, 3);
        assert_eq!(config.logging.format, LogFormat::Text);
    }

    #[test]
    fn test_partial_toml_override() {
        let toml_str = r#"
[storage]
backend = "memory"

[logging]
format = "json"
"#;
        let config = PortalConfig::from_toml_str(toml_str).expect("partial TOML should parse");
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.logging.format, LogFormat::Json);
        // Non-overridden values retain defaults
        assert_eq!(config.storage.path, PathBuf::from("./data/news_feedback.db"));
        assert_eq!(config.feedback.default_rating, 5);
    }

    #[test]
    fn test_validation_catches_bad_rating() {
        let mut config = PortalConfig::default();
        config.feedback.default_rating = 0;
        let result = config.validate();
        if let Err(ConfigError::Validation(errors)) = result {
            assert!(errors.iter().any(|e| e.contains("default_rating")));
        } else {
            panic!("rating 0 should fail validation");
        }
    }

    #[test]
    fn test_validation_catches_nested_namespace() {
        let mut config = PortalConfig::default();
        config.storage.namespace = "a/b".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_catches_long_confirmation() {
        let toml_str = r#"
[feedback]
confirmation_secs = 600
"#;
        assert!(matches!(
            PortalConfig::from_toml_str(toml_str),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_roundtrip_toml() {
        let original = PortalConfig::default();
        let toml_str = original.to_toml().expect("serialization should work");
        assert!(toml_str.contains("[server]"), "Missing [server] section");
        assert!(toml_str.contains("[storage]"), "Missing [storage] section");
        assert!(toml_str.contains("[feedback]"), "Missing [feedback] section");
        let roundtripped: PortalConfig = toml::from_str(&toml_str).expect("deserialization should work");
        assert_eq!(original, roundtripped);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("news_feedback.toml");
        std::fs::write(&path, "[server]\naddr = \"127.0.0.1:9000\"\n").unwrap();

        let config = PortalConfig::load_from_file(&path).unwrap();
        assert_eq!(config.server.addr, "127.0.0.1:9000");

        let missing = PortalConfig::load_from_file(&dir.path().join("nope.toml"));
        assert!(matches!(missing, Err(ConfigError::Io(_, _))));
    }

    #[test]
    fn test_error_messages_and_sources() {
        let mut config = PortalConfig::default();
        config.feedback.default_rating = 9;
        config.storage.namespace = "a/b".to_string();
        let err = config.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Config validation failed:\n  - storage.namespace (a/b) must be a single path segment\n  - feedback.default_rating (9) must be between 1 and 5\n"
        );

        let dir = tempfile::tempdir().unwrap();
        let err = PortalConfig::load_from_file(&dir.path().join("nope.toml")).unwrap_err();
        assert!(err.to_string().starts_with("Config I/O error ("));
        assert!(std::error::Error::source(&err).is_some());

        let err = anyhow::Error::from(PortalConfig::from_toml_str("[server\n").unwrap_err());
        assert!(err.to_string().starts_with("Config parse error"));
    }
}
