//! Configuration management for replug

pub mod schema;

pub use schema::Config;

use crate::error::{ReplugError, ReplugResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Project-local config filename, discovered upward from the working directory
pub const LOCAL_CONFIG_NAME: &str = ".replug.toml";

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
            .join("replug")
            .join("config.toml")
    }

    /// Get the state directory path
    pub fn state_dir() -> PathBuf {
        dirs::state_dir()
            .or_else(dirs::data_local_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("replug")
    }

    /// Get the audit log path
    pub fn audit_log_path() -> PathBuf {
        Self::state_dir().join("audit.log")
    }

    /// Load configuration, using defaults if the file does not exist
    pub async fn load(&self) -> ReplugResult<Config> {
        if !self.config_path.exists() {
            debug!("Config file not found, using defaults");
            return Ok(Config::default());
        }

        self.load_from_file(&self.config_path).await
    }

    /// Load configuration from a specific file
    pub async fn load_from_file(&self, path: &Path) -> ReplugResult<Config> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| ReplugError::io(format!("reading config from {}", path.display()), e))?;

        toml::from_str(&content).map_err(|e| ReplugError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Load the global config, then overlay a project-local file if given.
    ///
    /// Local values win key-by-key at table granularity via TOML merge.
    pub async fn load_merged(&self, local: Option<&Path>) -> ReplugResult<Config> {
        let global = self.load().await?;

        let Some(local_path) = local else {
            return Ok(global);
        };

        let content = fs::read_to_string(local_path).await.map_err(|e| {
            ReplugError::io(format!("reading local config {}", local_path.display()), e)
        })?;

        let mut merged = toml::Value::try_from(&global)?;
        let local_value: toml::Value =
            content
                .parse()
                .map_err(|e: toml::de::Error| ReplugError::ConfigInvalid {
                    path: local_path.to_path_buf(),
                    reason: e.to_string(),
                })?;

        merge_toml(&mut merged, local_value);

        merged
            .try_into()
            .map_err(|e: toml::de::Error| ReplugError::ConfigInvalid {
                path: local_path.to_path_buf(),
                reason: e.to_string(),
            })
    }

    /// Find a project-local config by walking up from `start`
    pub fn find_local_config(start: &Path) -> Option<PathBuf> {
        let mut dir = Some(start);
        while let Some(d) = dir {
            let candidate = d.join(LOCAL_CONFIG_NAME);
            if candidate.is_file() {
                return Some(candidate);
            }
            dir = d.parent();
        }
        None
    }

    /// Save configuration to file
    pub async fn save(&self, config: &Config) -> ReplugResult<()> {
        self.ensure_config_dir().await?;

        let content = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, content).await.map_err(|e| {
            ReplugError::io(
                format!("writing config to {}", self.config_path.display()),
                e,
            )
        })?;

        info!("Configuration saved to {}", self.config_path.display());
        Ok(())
    }

    /// Ensure the config directory exists
    async fn ensure_config_dir(&self) -> ReplugResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ReplugError::ConfigDirCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }
        Ok(())
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

/// Overlay `other` onto `base`, recursing into tables
fn merge_toml(base: &mut toml::Value, other: toml::Value) {
    match (base, other) {
        (toml::Value::Table(base_table), toml::Value::Table(other_table)) => {
            for (key, value) in other_table {
                match base_table.get_mut(&key) {
                    Some(existing) => merge_toml(existing, value),
                    None => {
                        base_table.insert(key, value);
                    }
                }
            }
        }
        (base, other) => *base = other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_default_when_missing() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nonexistent.toml");
        let manager = ConfigManager::with_path(path);

        let config = manager.load().await.unwrap();
        assert_eq!(config.control_plane.cli, "openstack");
    }

    #[tokio::test]
    async fn save_and_load_roundtrip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        let manager = ConfigManager::with_path(path);

        let mut config = Config::default();
        config.cycle.root_device = "/dev/sda".to_string();

        manager.save(&config).await.unwrap();
        let loaded = manager.load().await.unwrap();

        assert_eq!(loaded.cycle.root_device, "/dev/sda");
    }

    #[tokio::test]
    async fn local_overlay_wins() {
        let temp = TempDir::new().unwrap();
        let global_path = temp.path().join("config.toml");
        let local_path = temp.path().join(LOCAL_CONFIG_NAME);

        let manager = ConfigManager::with_path(global_path);
        let mut config = Config::default();
        config.cycle.on_failure = "abort".to_string();
        manager.save(&config).await.unwrap();

        tokio::fs::write(&local_path, "[control_plane]\ncloud = \"staging\"\n")
            .await
            .unwrap();

        let merged = manager.load_merged(Some(&local_path)).await.unwrap();
        assert_eq!(merged.cycle.on_failure, "abort");
        assert_eq!(merged.control_plane.cloud.as_deref(), Some("staging"));
    }

    #[test]
    fn find_local_config_walks_up() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(temp.path().join(LOCAL_CONFIG_NAME), "").unwrap();

        let found = ConfigManager::find_local_config(&nested).unwrap();
        assert_eq!(found, temp.path().join(LOCAL_CONFIG_NAME));
    }
}
