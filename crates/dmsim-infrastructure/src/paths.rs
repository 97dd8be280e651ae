//! Unified path management for dmsim configuration files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/dmsim/             # Config directory (platform config dir)
//! ├── config.toml              # Application configuration
//! └── secret.json              # API keys
//! ```

use dmsim_core::{DmsimError, Result};
use std::path::{Path, PathBuf};

const APP_DIR: &str = "dmsim";

/// Resolves dmsim file locations, optionally under a custom base directory.
#[derive(Debug, Clone, Default)]
pub struct DmsimPaths {
    base: Option<PathBuf>,
}

impl DmsimPaths {
    /// Paths under `base` instead of the platform config directory.
    pub fn new(base: Option<&Path>) -> Self {
        Self {
            base: base.map(Path::to_path_buf),
        }
    }

    /// Returns the dmsim configuration directory.
    ///
    /// # Errors
    ///
    /// Fails when the platform has no config directory (no home).
    pub fn config_dir(&self) -> Result<PathBuf> {
        if let Some(base) = &self.base {
            return Ok(base.clone());
        }
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or_else(|| DmsimError::config("Cannot find home directory"))
    }

    /// Returns the path to config.toml.
    pub fn config_file(&self) -> Result<PathBuf> {
        Ok(self.config_dir()?.join("config.toml"))
    }

    /// Returns the path to secret.json.
    pub fn secret_file(&self) -> Result<PathBuf> {
        Ok(self.config_dir()?.join("secret.json"))
    }
}
