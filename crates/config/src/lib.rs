//! Configuration loading and validation for formwright.
//!
//! Loads configuration from `~/.formwright/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use formwright_core::DuplicatePolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Overrides the component definition directory.
pub const ENV_DEFINITION_DIR: &str = "FORMWRIGHT_DEFINITION_DIR";
/// Overrides the component field-type directory.
pub const ENV_FIELD_TYPE_DIR: &str = "FORMWRIGHT_FIELD_TYPE_DIR";
/// Overrides the cache build timeout, in seconds.
pub const ENV_BUILD_TIMEOUT_SECS: &str = "FORMWRIGHT_BUILD_TIMEOUT_SECS";

/// The root configuration structure.
///
/// Maps directly to `~/.formwright/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path registry configuration
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Form cache configuration
    #[serde(default)]
    pub cache: CacheSettings,

    /// Saved form data
    #[serde(default)]
    pub data: DataConfig,
}

/// Paths registered before any caller-supplied ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// What to do when the same location is registered twice
    #[serde(default)]
    pub duplicate_policy: DuplicatePolicy,

    /// The component's own definition directory (registered first)
    #[serde(default = "default_definition_dir")]
    pub definition_dir: Option<String>,

    /// The component's own field-type directory (registered first)
    #[serde(default = "default_field_type_dir")]
    pub field_type_dir: Option<String>,

    /// Further definition paths, registered in order after the component's
    #[serde(default)]
    pub definition_paths: Vec<String>,

    /// Further field-type paths, registered in order after the component's
    #[serde(default)]
    pub field_type_paths: Vec<String>,
}

fn default_definition_dir() -> Option<String> {
    Some("forms".into())
}
fn default_field_type_dir() -> Option<String> {
    Some("fields".into())
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            duplicate_policy: DuplicatePolicy::default(),
            definition_dir: default_definition_dir(),
            field_type_dir: default_field_type_dir(),
            definition_paths: vec![],
            field_type_paths: vec![],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Upper bound on one form build; unset waits indefinitely
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_timeout_secs: Option<u64>,

    /// Share one build between concurrent requests for the same form
    #[serde(default = "default_true")]
    pub deduplicate: bool,
}

fn default_true() -> bool {
    true
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            build_timeout_secs: None,
            deduplicate: true,
        }
    }
}

impl CacheSettings {
    pub fn build_timeout(&self) -> Option<Duration> {
        self.build_timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataConfig {
    /// JSON file of previously submitted data, keyed by form name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_data_file: Option<PathBuf>,
}

impl AppConfig {
    /// Load configuration from the default path (~/.formwright/config.toml).
    ///
    /// Environment overrides:
    /// - `FORMWRIGHT_DEFINITION_DIR`
    /// - `FORMWRIGHT_FIELD_TYPE_DIR`
    /// - `FORMWRIGHT_BUILD_TIMEOUT_SECS`
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_from(&Self::config_path())?;
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
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

    /// Apply overrides from `lookup` (the process environment in [`load`](Self::load)).
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(ENV_DEFINITION_DIR) {
            self.registry.definition_dir = Some(dir);
        }

        if let Some(dir) = lookup(ENV_FIELD_TYPE_DIR) {
            self.registry.field_type_dir = Some(dir);
        }

        if let Some(secs) = lookup(ENV_BUILD_TIMEOUT_SECS) {
            let secs = secs.trim().parse::<u64>().map_err(|e| {
                ConfigError::ValidationError(format!("{ENV_BUILD_TIMEOUT_SECS}: {e}"))
            })?;
            self.cache.build_timeout_secs = Some(secs);
        }

        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".formwright")
    }

    /// Get the configuration file path.
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache.build_timeout_secs == Some(0) {
            return Err(ConfigError::ValidationError(
                "cache.build_timeout_secs must be > 0".into(),
            ));
        }

        let registry = &self.registry;
        let blank = |s: &String| s.trim().is_empty();
        if registry.definition_dir.as_ref().is_some_and(blank)
            || registry.field_type_dir.as_ref().is_some_and(blank)
        {
            return Err(ConfigError::ValidationError(
                "registry component directories must not be empty".into(),
            ));
        }
        if registry.definition_paths.iter().any(blank)
            || registry.field_type_paths.iter().any(blank)
        {
            return Err(ConfigError::ValidationError(
                "registry paths must not be empty".into(),
            ));
        }

        Ok(())
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
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
}
