//! Configuration Management
//!
//! Persistent defaults for the `chronicle` binary, stored as JSON in the user
//! config directory. Environment variables override the file; command-line
//! flags override both.

use crate::endpoint::{service_endpoint, DEFAULT_API_VERSION};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_REGION: &str = "us";
pub const DEFAULT_LOCATION: &str = "us";

/// Keys accepted by [`Config::set`]
pub const KEYS: &[&str] = &[
    "project",
    "location",
    "instance",
    "region",
    "api-version",
    "service-account",
];

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Google Cloud project that owns the Chronicle instance
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    /// Chronicle instance (customer) id
    #[serde(default)]
    pub instance: Option<String>,
    /// Region prefix of the service endpoint
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub api_version: Option<String>,
    /// Service account to impersonate
    #[serde(default)]
    pub service_account: Option<String>,
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("chronicle").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load from `path`; a missing or unreadable file yields the defaults
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|err| {
                tracing::warn!("Ignoring malformed config {:?}: {}", path, err);
                Self::default()
            }),
            Err(_) => Self::default(),
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
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Set one of [`KEYS`]; an empty value clears it
    ///
    /// A region or API version is only stored when it still yields a valid
    /// service endpoint.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        if !value.is_empty() && (key == "region" || key == "api-version") {
            let (region, version) = match key {
                "region" => (value, self.api_version.as_deref().unwrap_or(DEFAULT_API_VERSION)),
                _ => (self.region.as_deref().unwrap_or(DEFAULT_REGION), value),
            };
            service_endpoint(region, version)
                .with_context(|| format!("Invalid {} '{}'", key, value))?;
        }

        let slot = match key {
            "project" => &mut self.project,
            "location" => &mut self.location,
            "instance" => &mut self.instance,
            "region" => &mut self.region,
            "api-version" => &mut self.api_version,
            "service-account" => &mut self.service_account,
            _ => bail!("Unknown config key '{}'. Expected one of: {}", key, KEYS.join(", ")),
        };
        *slot = Some(value.to_string()).filter(|v| !v.is_empty());
        Ok(())
    }

    /// Get effective project (env > config > GOOGLE_CLOUD_PROJECT)
    pub fn effective_project(&self) -> String {
        env_var("CHRONICLE_PROJECT")
            .or_else(|| self.project.clone())
            .or_else(|| env_var("GOOGLE_CLOUD_PROJECT"))
            .unwrap_or_default()
    }

    pub fn effective_location(&self) -> String {
        env_var("CHRONICLE_LOCATION")
            .or_else(|| self.location.clone())
            .unwrap_or_else(|| DEFAULT_LOCATION.to_string())
    }

    pub fn effective_instance(&self) -> String {
        env_var("CHRONICLE_INSTANCE")
            .or_else(|| self.instance.clone())
            .unwrap_or_default()
    }

    pub fn effective_region(&self) -> String {
        env_var("CHRONICLE_REGION")
            .or_else(|| self.region.clone())
            .unwrap_or_else(|| DEFAULT_REGION.to_string())
    }

    pub fn effective_api_version(&self) -> String {
        self.api_version
            .clone()
            .unwrap_or_else(|| DEFAULT_API_VERSION.to_string())
    }

    pub fn effective_service_account(&self) -> Option<String> {
        env_var("CHRONICLE_SERVICE_ACCOUNT").or_else(|| self.service_account.clone())
    }
}
