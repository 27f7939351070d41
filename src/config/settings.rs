//! TOML-based configuration.
//!
//! Example configuration (`fluentsql.toml`):
//! ```toml
//! [render]
//! parameter_prefix = "prm"
//!
//! [aliases]
//! Person = "per"
//! Passport = "pas"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::sql::render::is_parameter_prefix;

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Rendering defaults.
    pub render: RenderSettings,

    /// Explicit table aliases, keyed by table name.
    pub aliases: BTreeMap<String, String>,
}

/// Rendering defaults.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Prefix of parameter placeholders (`@{prefix}{n}`).
    pub parameter_prefix: String,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            parameter_prefix: crate::metadata::DEFAULT_PARAMETER_PREFIX.to_string(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate settings from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, SettingsError> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from the default locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `FLUENTSQL_CONFIG`
    /// 2. `./fluentsql.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("FLUENTSQL_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("fluentsql.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        Ok(Settings::default())
    }

    /// Check the prefix and that explicit aliases are non-empty and unique.
    pub fn validate(&self) -> Result<(), SettingsError> {
        let prefix = &self.render.parameter_prefix;
        if !is_parameter_prefix(prefix) {
            return Err(SettingsError::InvalidConfig(format!(
                "parameter_prefix must be a non-empty identifier, got '{}'",
                prefix
            )));
        }

        // Aliases compare case-insensitively.
        let mut seen: BTreeMap<String, &str> = BTreeMap::new();
        for (table, alias) in &self.aliases {
            if alias.trim().is_empty() {
                return Err(SettingsError::InvalidConfig(format!(
                    "alias for table '{}' is empty",
                    table
                )));
            }
            if let Some(other) = seen.insert(alias.to_ascii_lowercase(), table.as_str()) {
                return Err(SettingsError::InvalidConfig(format!(
                    "alias '{}' is assigned to both '{}' and '{}'",
                    alias, other, table
                )));
            }
        }
        Ok(())
    }
}
