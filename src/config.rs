//! Client configuration: built-in defaults, an optional TOML file, and
//! `CATALOG_`-prefixed environment variables, in increasing priority.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::storage::default_storage_path;

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct StorageConfig {
    /// Session storage file; defaults to a file under the home directory.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    /// Where rolling log files go; defaults to the storage directory.
    pub directory: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NotificationConfig {
    pub display_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ClientConfig {
    pub api: ApiConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
    pub notifications: NotificationConfig,
}

impl ClientConfig {
    /// Load `config/client.toml` (optional), the file named by
    /// `CATALOG_CONFIG` (optional) and `CATALOG_*` variables such as
    /// `CATALOG_API__BASE_URL`.
    pub fn load() -> Result<Self> {
        let mut builder = Self::defaults()?
            .add_source(File::with_name("config/client").required(false));
        if let Ok(path) = env::var("CATALOG_CONFIG") {
            builder = builder.add_source(File::with_name(&path).required(false));
        }
        builder
            .add_source(
                Environment::with_prefix("CATALOG")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("failed to assemble configuration")?
            .try_deserialize()
            .context("invalid configuration")
    }

    fn defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>> {
        Config::builder()
            .set_default("api.base_url", "http://localhost:3000/api")?
            .set_default("api.timeout_secs", 10)?
            .set_default("logging.level", "info")?
            .set_default("notifications.display_ms", 3500)
            .context("failed to apply configuration defaults")
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    pub fn notice_duration(&self) -> Duration {
        Duration::from_millis(self.notifications.display_ms)
    }

    pub fn storage_path(&self) -> Result<PathBuf> {
        match &self.storage.path {
            Some(path) => Ok(path.clone()),
            None => default_storage_path(),
        }
    }

    pub fn log_directory(&self) -> Result<PathBuf> {
        if let Some(directory) = &self.logging.directory {
            return Ok(directory.clone());
        }
        let storage = self.storage_path()?;
        Ok(storage
            .parent()
            .map(|parent| parent.join("logs"))
            .unwrap_or_else(|| PathBuf::from("logs")))
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                base_url: "http://localhost:3000/api".to_string(),
                timeout_secs: 10,
            },
            storage: StorageConfig::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
                directory: None,
            },
            notifications: NotificationConfig { display_ms: 3500 },
        }
    }
}
