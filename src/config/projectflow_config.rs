//! ProjectFlow configuration file handling

use crate::model::Visibility;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Backoff settings for adapters wrapped in a `RetryingAdapter`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrySettings {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,

    #[serde(default = "default_multiplier")]
    pub multiplier: f64,

    #[serde(default = "default_jitter")]
    pub jitter: bool,
}

fn default_max_retries() -> u32 {
    3
}

fn default_initial_backoff_ms() -> u64 {
    1_000
}

fn default_max_backoff_ms() -> u64 {
    60_000
}

fn default_multiplier() -> f64 {
    2.0
}

fn default_jitter() -> bool {
    true
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            multiplier: default_multiplier(),
            jitter: default_jitter(),
        }
    }
}

/// Multi-resource batch behavior
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSettings {
    /// Keep creating later sub-resources after one fails
    #[serde(default)]
    pub continue_on_error: bool,
}

/// ProjectFlow configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectFlowConfig {
    /// Owner used when a project input names none
    #[serde(default = "default_owner")]
    pub owner: String,

    #[serde(default)]
    pub default_visibility: Visibility,

    /// Fallback tracing filter when RUST_LOG is unset
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    #[serde(default)]
    pub retry: RetrySettings,

    #[serde(default)]
    pub batch: BatchSettings,
}

fn default_owner() -> String {
    std::env::var("USER").unwrap_or_else(|_| "projectflow".to_string())
}

fn default_log_filter() -> String {
    "warn".to_string()
}

impl ProjectFlowConfig {
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            default_visibility: Visibility::default(),
            log_filter: default_log_filter(),
            retry: RetrySettings::default(),
            batch: BatchSettings::default(),
        }
    }

    /// Load configuration from the default path (~/.config/projectflow/config.yaml)
    pub fn load_default() -> Result<Self> {
        Self::load(Self::default_path())
    }

    /// Load configuration from a specific path
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(crate::ProjectFlowError::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        tracing::info!(path = %path.display(), "Loading ProjectFlow configuration");

        let content = fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;

        tracing::debug!(
            owner = %config.owner,
            max_retries = config.retry.max_retries,
            continue_on_error = config.batch.continue_on_error,
            "Configuration loaded"
        );

        Ok(config)
    }

    /// Save configuration to a specific path
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        tracing::info!(path = %path.display(), "Saving ProjectFlow configuration");

        let yaml = serde_yaml::to_string(self)?;
        fs::write(path, yaml)?;

        Ok(())
    }

    /// Get the default config path (~/.config/projectflow/config.yaml)
    pub fn default_path() -> PathBuf {
        let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(".config");
        path.push("projectflow");
        path.push("config.yaml");
        path
    }
}

impl Default for ProjectFlowConfig {
    fn default() -> Self {
        Self::new(default_owner())
    }
}
