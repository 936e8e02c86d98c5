//! Provider configuration file.
//!
//! The file holds the same settings as a `provider "jinja"` block:
//!
//! ```toml
//! [provider]
//! strict_undefined = true
//! trim_blocks = true
//!
//! [provider.delimiters]
//! variable_start = "<<"
//! variable_end = ">>"
//! ```
//!
//! The default location is `<config dir>/jinja-provider/config.toml`, e.g.
//! `~/.config/jinja-provider/config.toml` on Linux. A missing default file is
//! not an error and yields the defaults.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::debug;

use crate::core::ProviderError;
use crate::provider::model::ProviderModel;

/// Environment variable overriding the configuration file location.
pub const CONFIG_ENV: &str = "JINJA_PROVIDER_CONFIG";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    /// Settings of the provider block.
    #[serde(default)]
    pub provider: ProviderModel,
}

impl ProviderConfig {
    /// Loads the configuration from the default location, or returns the
    /// defaults when no file exists there.
    ///
    /// # Errors
    ///
    /// Returns an error if the default location cannot be determined or the
    /// file exists but cannot be read or parsed.
    pub async fn load() -> Result<Self> {
        let path = Self::default_path()?;
        if path.exists() {
            Self::load_from(&path).await
        } else {
            debug!(path = %path.display(), "No provider configuration, using defaults");
            Ok(Self::default())
        }
    }

    /// Loads the configuration from `path` when given, from the default
    /// location otherwise.
    ///
    /// # Errors
    ///
    /// An explicit `path` that does not exist is an error
    /// ([`ProviderError::ConfigNotFound`]), unlike a missing default file.
    pub async fn load_with_optional(path: Option<PathBuf>) -> Result<Self> {
        match path {
            Some(path) if !path.exists() => Err(ProviderError::ConfigNotFound {
                path: path.display().to_string(),
            }
            .into()),
            Some(path) => Self::load_from(&path).await,
            None => Self::load().await,
        }
    }

    /// Loads the configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, or
    /// [`ProviderError::ConfigParseError`] if it is not a valid configuration.
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read provider config from {}", path.display()))?;

        let config: Self = toml::from_str(&content).map_err(|e| ProviderError::ConfigParseError {
            file: path.display().to_string(),
            reason: e.message().to_string(),
        })?;
        debug!(path = %path.display(), "Loaded provider configuration");
        Ok(config)
    }

    /// Default configuration file location.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform configuration directory cannot be determined.
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Unable to determine the configuration directory"))?;
        Ok(config_dir.join("jinja-provider").join("config.toml"))
    }
}
