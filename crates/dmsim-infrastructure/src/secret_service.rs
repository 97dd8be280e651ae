//! Secret service implementation.
//!
//! API keys come from the environment first (`GEMINI_API_KEY`, then
//! `API_KEY`) and from `secret.json` otherwise.

use crate::paths::DmsimPaths;
use dmsim_core::Result;
use dmsim_core::config::{GeminiSecret, SecretConfig};
use dmsim_core::secret::SecretService;
use std::path::PathBuf;

/// Environment variables checked for the Gemini key, in order.
pub const GEMINI_KEY_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

/// Loads [`SecretConfig`] from a JSON file.
#[derive(Debug, Clone)]
pub struct SecretServiceImpl {
    path: PathBuf,
}

impl SecretServiceImpl {
    /// Uses the default secret location.
    pub fn new() -> Result<Self> {
        Ok(Self {
            path: DmsimPaths::default().secret_file()?,
        })
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Resolves the Gemini API key using the process environment.
    ///
    /// Returns an empty key when nothing is configured; the backend rejects
    /// such calls at the transport layer.
    pub async fn gemini_api_key(&self) -> String {
        self.gemini_api_key_with(|name| std::env::var(name).ok())
            .await
    }

    /// Same as [`gemini_api_key`](Self::gemini_api_key) with a custom
    /// environment lookup.
    pub async fn gemini_api_key_with<F>(&self, env: F) -> String
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = GEMINI_KEY_VARS
            .iter()
            .filter_map(|&name| env(name))
            .find(|key| !key.trim().is_empty())
        {
            return key;
        }

        match self.load_secrets().await {
            Ok(SecretConfig {
                gemini: Some(GeminiSecret { api_key, .. }),
            }) => api_key,
            Ok(_) => {
                tracing::warn!("no Gemini API key configured");
                String::new()
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to load secrets");
                String::new()
            }
        }
    }
}

#[async_trait::async_trait]
impl SecretService for SecretServiceImpl {
    async fn load_secrets(&self) -> Result<SecretConfig> {
        if !self.secret_file_exists().await {
            return Ok(SecretConfig::default());
        }
        let content = tokio::fs::read_to_string(&self.path).await?;
        Ok(serde_json::from_str(&content)?)
    }

    async fn secret_file_exists(&self) -> bool {
        tokio::fs::try_exists(&self.path).await.unwrap_or(false)
    }
}
