use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Result, anyhow};

use crate::error::ConfigError;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Environment variables checked for the credential, in order
const CREDENTIAL_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from the user config dir; a missing file yields the defaults
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        Ok(Self::load_from(&config_path)?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let unreadable = |reason: String| ConfigError::Unreadable {
            path: path.display().to_string(),
            reason,
        };

        let config_content = fs::read_to_string(path).map_err(|e| unreadable(e.to_string()))?;
        serde_json::from_str(&config_content).map_err(|e| unreadable(e.to_string()))
    }

    pub fn model(&self) -> &str {
        non_blank(self.model.as_deref()).unwrap_or(DEFAULT_MODEL)
    }

    pub fn base_url(&self) -> &str {
        non_blank(self.base_url.as_deref()).unwrap_or(DEFAULT_BASE_URL)
    }

    /// Resolve the credential from the process environment, then the file
    pub fn credential(&self) -> Result<String, ConfigError> {
        self.credential_with(|name| std::env::var(name).ok())
    }

    /// Same as [`credential`](Self::credential) with an injectable env lookup
    pub fn credential_with<F>(&self, lookup: F) -> Result<String, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        CREDENTIAL_VARS
            .iter()
            .filter_map(|name| lookup(*name))
            .find(|value| !value.trim().is_empty())
            .or_else(|| non_blank(self.api_key.as_deref()).map(str::to_string))
            .map(|key| key.trim().to_string())
            .ok_or(ConfigError::MissingCredential)
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("guia-ffm").join("config.json"))
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
