//! Configuration Management
//!
//! Handles persistent configuration storage for cf2tf. Only scope ids and the
//! API base URL are stored; credentials always come from flags or the
//! environment.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Default zone to export from
    #[serde(default)]
    pub zone_id: Option<String>,
    /// Default account to export from
    #[serde(default)]
    pub account_id: Option<String>,
    /// API root override
    #[serde(default)]
    pub base_url: Option<String>,
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("cf2tf").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load configuration from `path`; missing or unreadable files yield defaults
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring malformed config {}: {}", path.display(), e);
                Self::default()
            }),
            Err(e) => {
                tracing::warn!("Failed to read config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create parent directory
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        Ok(())
    }

    /// Get effective zone and account ids.
    ///
    /// Ids given on the command line replace the saved pair as a whole, so a
    /// saved zone never leaks into an `--account` run.
    pub fn effective_scope(
        &self,
        zone: Option<&str>,
        account: Option<&str>,
    ) -> (Option<String>, Option<String>) {
        if zone.is_some() || account.is_some() {
            (zone.map(str::to_string), account.map(str::to_string))
        } else {
            (self.zone_id.clone(), self.account_id.clone())
        }
    }

    /// Get effective base URL (CLI/env > config)
    pub fn effective_base_url(&self, cli: Option<&str>) -> Option<String> {
        cli.map(str::to_string).or_else(|| self.base_url.clone())
    }
}
