//! Configuration service implementation.
//!
//! Loads the application configuration from `config.toml`
//! (`~/.config/dmsim/config.toml` unless a path is given).

use crate::paths::DmsimPaths;
use dmsim_core::Result;
use dmsim_core::config::AppConfig;
use std::path::PathBuf;

/// Reads [`AppConfig`] from a TOML file.
///
/// A missing file yields the defaults; a malformed one is an error.
#[derive(Debug, Clone)]
pub struct ConfigService {
    path: PathBuf,
}

impl ConfigService {
    /// Uses the default config location.
    pub fn new() -> Result<Self> {
        Ok(Self {
            path: DmsimPaths::default().config_file()?,
        })
    }

    /// Uses an explicit config file.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Loads the configuration.
    pub async fn load(&self) -> Result<AppConfig> {
        if !tokio::fs::try_exists(&self.path).await? {
            tracing::debug!(path = %self.path.display(), "config file not found, using defaults");
            return Ok(AppConfig::default());
        }

        let content = tokio::fs::read_to_string(&self.path).await?;
        let config: AppConfig = toml::from_str(&content)?;
        tracing::debug!(path = %self.path.display(), model = %config.model, "loaded config");
        Ok(config)
    }
}
