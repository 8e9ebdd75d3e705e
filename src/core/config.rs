//! Configuration management with layered hierarchy
//!
//! Sources, lowest priority first: built-in defaults, the global user config
//! (`~/.config/sgq/config.yaml` or the platform equivalent), the project
//! config (`.sgq/config.yaml`) and `SGQ_*` environment variables.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::Project;

/// Default document collection name
pub const DEFAULT_COLLECTION: &str = "qpl_rncs";

/// Default number of documents written per transaction
pub const DEFAULT_BATCH_SIZE: usize = 450;

/// Hard limit on documents per transaction
pub const MAX_BATCH_SIZE: usize = 500;

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;

/// One configuration file as written on disk; every field optional
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigLayer {
    default_format: Option<String>,
    store: Option<StoreLayer>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StoreLayer {
    enabled: Option<bool>,
    path: Option<PathBuf>,
    collection: Option<String>,
    batch_size: Option<usize>,
    poll_interval_ms: Option<u64>,
}

/// Document store settings
#[derive(Debug, Clone, PartialEq)]
pub struct StoreConfig {
    /// When false, only the local cache is used
    pub enabled: bool,

    /// SQLite file; relative paths resolve against the project root.
    /// `None` means `.sgq/store.db`.
    pub path: Option<PathBuf>,

    pub collection: String,

    pub batch_size: usize,

    /// Polling interval for `watch`
    pub poll_interval_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
            collection: DEFAULT_COLLECTION.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

/// SGQ configuration with layered hierarchy
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    /// Default output format
    pub default_format: Option<String>,

    pub store: StoreConfig,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load(project: Option<&Project>) -> Result<Self, ConfigError> {
        // 1. Built-in defaults
        let mut config = Config::default();

        // 2. Global user config
        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                config.merge_file(&global_path)?;
            }
        }

        // 3. Project config
        if let Some(project) = project {
            let project_config = project.config_path();
            if project_config.exists() {
                config.merge_file(&project_config)?;
            }
        }

        // 4. Environment variables
        config.apply_env(|key| std::env::var(key).ok())?;

        config.validate()?;
        Ok(config)
    }

    /// Get the path to the global config file
    fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "sgq")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    fn merge_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        self.merge_str(&contents).map_err(|e| match e {
            ConfigError::Parse { message, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                message,
            },
            other => other,
        })?;
        tracing::debug!(path = %path.display(), "merged config file");
        Ok(())
    }

    /// Merge a YAML document into this config (the document takes precedence)
    pub fn merge_str(&mut self, yaml: &str) -> Result<(), ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(());
        }
        let layer: Option<ConfigLayer> =
            serde_yml::from_str(yaml).map_err(|e| ConfigError::Parse {
                path: PathBuf::new(),
                message: e.to_string(),
            })?;
        if let Some(layer) = layer {
            self.merge(layer);
        }
        Ok(())
    }

    fn merge(&mut self, other: ConfigLayer) {
        if other.default_format.is_some() {
            self.default_format = other.default_format;
        }
        let Some(store) = other.store else {
            return;
        };
        if let Some(enabled) = store.enabled {
            self.store.enabled = enabled;
        }
        if store.path.is_some() {
            self.store.path = store.path;
        }
        if let Some(collection) = store.collection {
            self.store.collection = collection;
        }
        if let Some(batch_size) = store.batch_size {
            self.store.batch_size = batch_size;
        }
        if let Some(interval) = store.poll_interval_ms {
            self.store.poll_interval_ms = interval;
        }
    }

    /// Apply `SGQ_*` overrides from the given lookup
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(format) = lookup("SGQ_FORMAT") {
            self.default_format = Some(format);
        }
        if let Some(path) = lookup("SGQ_STORE_PATH") {
            self.store.path = Some(PathBuf::from(path));
        }
        if let Some(collection) = lookup("SGQ_COLLECTION") {
            self.store.collection = collection;
        }
        if let Some(raw) = lookup("SGQ_STORE_ENABLED") {
            self.store.enabled = match raw.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => return Err(ConfigError::invalid_env("SGQ_STORE_ENABLED", &raw)),
            };
        }
        if let Some(raw) = lookup("SGQ_BATCH_SIZE") {
            self.store.batch_size = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::invalid_env("SGQ_BATCH_SIZE", &raw))?;
        }
        if let Some(raw) = lookup("SGQ_POLL_INTERVAL_MS") {
            self.store.poll_interval_ms = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::invalid_env("SGQ_POLL_INTERVAL_MS", &raw))?;
        }
        Ok(())
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_BATCH_SIZE).contains(&self.store.batch_size) {
            return Err(ConfigError::Invalid(format!(
                "store.batch_size must be between 1 and {}, got {}",
                MAX_BATCH_SIZE, self.store.batch_size
            )));
        }
        if self.store.collection.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "store.collection must not be empty".to_string(),
            ));
        }
        if self.store.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "store.poll_interval_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Absolute path of the SQLite store for a project
    pub fn store_path(&self, project: &Project) -> PathBuf {
        match &self.store.path {
            Some(path) => project.resolve(path),
            None => project.default_store_path(),
        }
    }
}

/// Errors raised while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {message}")]
    Read { path: PathBuf, message: String },

    #[error("invalid YAML in config {path:?}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    fn invalid_env(key: &str, value: &str) -> Self {
        ConfigError::Invalid(format!("{} has an invalid value: '{}'", key, value))
    }
}
