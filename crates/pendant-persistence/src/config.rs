//! Persistence settings.
//!
//! Loaded from `persistence.toml` in the user's config directory. A missing
//! or unreadable file yields defaults; the data directory can be overridden
//! with `TEACHING_PENDANT_DATA_DIR`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::autosave::AutoSaveConfig;
use crate::error::{PersistenceError, Result};
use crate::layout::DataLayout;

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "TEACHING_PENDANT_DATA_DIR";

const CONFIG_FILE_NAME: &str = "persistence.toml";

/// Root persistence settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    /// Data directory; `<AppData>/TeachingPendantData` when unset.
    pub data_dir: Option<PathBuf>,

    pub autosave: AutoSaveConfig,

    pub retry: RetryConfig,

    pub backup: BackupConfig,
}

impl PersistenceConfig {
    /// Load settings from the default path, applying the env override.
    pub fn load() -> Self {
        let mut config = Self::load_from(&Self::config_path());
        config.apply_data_dir_override(std::env::var(DATA_DIR_ENV).ok());
        config
    }

    /// Load settings from a specific path.
    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        match toml::from_str(&content) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Ignoring invalid persistence config");
                Self::default()
            }
        }
    }

    /// Save settings to a specific path, creating its folder if needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|source| PersistenceError::ConfigSerialization {
                path: path.to_path_buf(),
                source,
            })?;

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .map_err(|e| PersistenceError::from_io("create directory", parent, e))?;
        }

        std::fs::write(path, content).map_err(|e| PersistenceError::from_io("write", path, e))
    }

    /// Get the default config file path.
    pub fn config_path() -> PathBuf {
        directories::ProjectDirs::from("com", "TeachingPendant", "TeachingPendant")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME))
    }

    /// Replace `data_dir` with a non-empty override value.
    pub fn apply_data_dir_override(&mut self, value: Option<String>) {
        if let Some(dir) = value.filter(|v| !v.trim().is_empty()) {
            self.data_dir = Some(PathBuf::from(dir));
        }
    }

    /// Resolve the on-disk layout.
    pub fn layout(&self) -> DataLayout {
        match &self.data_dir {
            Some(dir) => DataLayout::new(dir),
            None => DataLayout::default(),
        }
    }
}

/// Retry schedule for file access.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the first failed write (attempts = retries + 1).
    pub write_retries: u32,

    /// Delay before the first write retry; doubles on each retry.
    pub write_backoff_ms: u64,

    /// Delay before the single read retry.
    pub read_retry_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            write_retries: 3,
            write_backoff_ms: 100,
            read_retry_delay_ms: 100,
        }
    }
}

impl RetryConfig {
    /// Policy used for writes: 100/200/400 ms by default.
    pub fn write_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.write_retries,
            initial_backoff: Duration::from_millis(self.write_backoff_ms),
            multiplier: 2,
        }
    }

    /// Policy used for reads: one retry after a fixed delay.
    pub fn read_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: 1,
            initial_backoff: Duration::from_millis(self.read_retry_delay_ms),
            multiplier: 1,
        }
    }
}

/// Exponential backoff schedule without jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub multiplier: u32,
}

impl RetryPolicy {
    /// Backoff before retry number `retry` (0-based).
    pub fn backoff_for_retry(&self, retry: u32) -> Duration {
        self.initial_backoff
            .saturating_mul(self.multiplier.saturating_pow(retry))
    }

    /// Sum of all backoffs; the worst-case added latency.
    pub fn total_backoff(&self) -> Duration {
        (0..self.max_retries)
            .map(|retry| self.backoff_for_retry(retry))
            .sum()
    }
}

/// Backup retention settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackupConfig {
    /// Number of backup folders to keep; `0` keeps all of them.
    pub max_backups: usize,

    /// Take a backup after the bulk save at shutdown.
    pub backup_on_shutdown: bool,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            max_backups: 20,
            backup_on_shutdown: false,
        }
    }
}
