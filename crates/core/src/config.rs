//! Configuration file parsing for keyward.toml

use anyhow::{Context, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::license::ClientSettings;
use crate::site;
use crate::update::UpdateSettings;

pub const DEFAULT_CONFIG_FILE: &str = "keyward.toml";

/// Main configuration structure for keyward.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywardConfig {
    pub server: ServerConfig,

    pub product: ProductConfig,

    #[serde(default)]
    pub updates: UpdatesConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub admin: AdminConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Licensing server endpoint (https only)
    pub url: String,

    /// Timeout for activate/deactivate/check requests
    #[serde(default = "default_activation_timeout")]
    pub activation_timeout_secs: u64,

    /// Timeout for version checks; must not exceed the activation timeout
    #[serde(default = "default_update_timeout")]
    pub update_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductConfig {
    /// Identifier matching the server's catalog entry exactly
    pub id: String,

    /// Display name used in messages (defaults to `id`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Currently installed version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Canonical URL of this installation (derived from the machine if unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatesConfig {
    /// Seconds a version check result stays fresh
    #[serde(default = "default_ttl")]
    pub ttl_secs: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    /// State file path (default: <config_dir>/keyward/state.json)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    /// Whether the local operator may activate/deactivate
    #[serde(default = "default_true")]
    pub allow_manage: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("product.id must not be empty")]
    EmptyProductId,
    #[error("server.url is not a valid URL: {0}")]
    BadServerUrl(String),
    #[error("server.url must use https (TLS verification cannot be disabled)")]
    InsecureServerUrl,
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
    #[error("server.update_timeout_secs ({update}s) must not exceed server.activation_timeout_secs ({activation}s)")]
    UpdateTimeoutTooLong { update: u64, activation: u64 },
    #[error("updates.ttl_secs ({0}) must not exceed {max}", max = crate::update::cache::MAX_TTL_SECS)]
    TtlTooLong(u64),
}

// Default functions
fn default_activation_timeout() -> u64 {
    crate::license::client::DEFAULT_TIMEOUT_SECS
}

fn default_update_timeout() -> u64 {
    crate::update::checker::DEFAULT_TIMEOUT_SECS
}

fn default_ttl() -> u64 {
    crate::update::cache::DEFAULT_TTL_SECS
}

fn default_true() -> bool {
    true
}

impl Default for UpdatesConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl(),
        }
    }
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self { allow_manage: true }
    }
}

impl KeywardConfig {
    /// Load and validate configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config = Self::from_toml(&contents)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: KeywardConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.product.id.trim().is_empty() {
            return Err(ConfigError::EmptyProductId);
        }
        let url = self.server_url()?;
        if url.scheme() != "https" {
            return Err(ConfigError::InsecureServerUrl);
        }
        if self.server.activation_timeout_secs == 0 {
            return Err(ConfigError::Zero("server.activation_timeout_secs"));
        }
        if self.server.update_timeout_secs == 0 {
            return Err(ConfigError::Zero("server.update_timeout_secs"));
        }
        if self.server.update_timeout_secs > self.server.activation_timeout_secs {
            return Err(ConfigError::UpdateTimeoutTooLong {
                update: self.server.update_timeout_secs,
                activation: self.server.activation_timeout_secs,
            });
        }
        if self.updates.ttl_secs == 0 {
            return Err(ConfigError::Zero("updates.ttl_secs"));
        }
        if self.updates.ttl_secs > crate::update::cache::MAX_TTL_SECS {
            return Err(ConfigError::TtlTooLong(self.updates.ttl_secs));
        }
        Ok(())
    }

    pub fn server_url(&self) -> Result<Url, ConfigError> {
        Url::parse(self.server.url.trim()).map_err(|e| ConfigError::BadServerUrl(e.to_string()))
    }

    /// Canonical site identity for this deployment
    pub fn site_url(&self) -> String {
        site::site_url(&self.product.id, self.product.site_url.as_deref())
    }

    pub fn client_settings(&self) -> ClientSettings {
        let mut settings = ClientSettings::new(self.product.id.trim(), self.site_url());
        if let Some(name) = self.product.name.as_deref().filter(|n| !n.trim().is_empty()) {
            settings.product_name = name.trim().to_string();
        }
        settings.timeout = Duration::from_secs(self.server.activation_timeout_secs);
        settings
    }

    pub fn update_settings(&self) -> UpdateSettings {
        let mut settings = UpdateSettings::new(self.product.id.trim());
        settings.ttl = Duration::from_secs(self.updates.ttl_secs);
        settings.timeout = Duration::from_secs(self.server.update_timeout_secs);
        settings
    }
}
