//! Configuration management for cache-dance

pub mod schema;

pub use schema::Config;

use crate::error::{DanceError, DanceResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// File name of a project-local configuration
pub const LOCAL_CONFIG_NAME: &str = ".cache-dance.toml";

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new config manager with default path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("cache-dance")
            .join("config.toml")
    }

    /// Walk up from `start` looking for a project-local config file
    pub fn find_local_config(start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .map(|dir| dir.join(LOCAL_CONFIG_NAME))
            .find(|candidate| candidate.is_file())
    }

    /// Load configuration, falling back to defaults if the file is missing
    pub async fn load(&self) -> DanceResult<Config> {
        self.load_merged(None).await
    }

    /// Load the global configuration with a project-local file merged over it
    ///
    /// Tables merge key by key; a local `cache_map` replaces the global one.
    pub async fn load_merged(&self, local: Option<&Path>) -> DanceResult<Config> {
        let mut merged = if self.config_path.exists() {
            Self::read_table(&self.config_path).await?
        } else {
            debug!("Config file not found, using defaults");
            toml::Table::new()
        };

        if let Some(local_path) = local {
            debug!("Merging local config: {}", local_path.display());
            let overlay = Self::read_table(local_path).await?;
            merge_tables(&mut merged, overlay);
        }

        let origin = local.unwrap_or(&self.config_path);
        toml::Value::Table(merged)
            .try_into()
            .map_err(|e: toml::de::Error| DanceError::ConfigInvalid {
                path: origin.to_path_buf(),
                reason: e.to_string(),
            })
    }

    async fn read_table(path: &Path) -> DanceResult<toml::Table> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| DanceError::io(format!("reading config from {}", path.display()), e))?;

        content.parse::<toml::Table>().map_err(|e| DanceError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Recursively merge `overlay` into `base`
fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming))
                if key != "cache_map" =>
            {
                merge_tables(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}
