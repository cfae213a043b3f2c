use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use crate::{model::TemperatureUnit, provider::ProviderId};

pub const DEFAULT_LOCATION: &str = "lisbon";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Per-provider settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Overrides the provider's default endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Open-Meteo only: geocoding lives on its own host.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geocoding_base_url: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GeolocationSource {
    /// Approximate position from the public IP address.
    #[default]
    Ip,
    /// Coordinates from this file.
    Fixed,
    /// Geolocation unsupported; the flow goes straight to the snapshot.
    None,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct GeolocationConfig {
    #[serde(default)]
    pub source: GeolocationSource,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Searched when no query is given and no preference is stored.
    pub default_location: Option<String>,

    #[serde(default)]
    pub units: TemperatureUnit,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Example TOML:
    /// [providers.openweather]
    /// api_key = "..."
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    #[serde(default)]
    pub geolocation: GeolocationConfig,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_location: None,
            units: TemperatureUnit::default(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            providers: HashMap::new(),
            geolocation: GeolocationConfig::default(),
        }
    }
}

impl Config {
    pub fn provider_config(&self, id: ProviderId) -> Option<&ProviderConfig> {
        self.providers.get(id.as_str())
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-dashboard", "weather")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Set/replace a provider API key, keeping any endpoint overrides.
    pub fn upsert_provider_api_key(&mut self, provider_id: ProviderId, api_key: String) {
        self.providers.entry(provider_id.as_str().to_string()).or_default().api_key =
            Some(api_key);
    }

    /// Returns API key for a provider, if present and non-empty.
    pub fn provider_api_key(&self, provider_id: ProviderId) -> Option<&str> {
        self.provider_config(provider_id)
            .and_then(|cfg| cfg.api_key.as_deref())
            .filter(|key| !key.trim().is_empty())
    }

    pub fn is_provider_configured(&self, provider_id: ProviderId) -> bool {
        !provider_id.requires_api_key() || self.provider_api_key(provider_id).is_some()
    }

    /// Endpoint for a provider, falling back to its public default.
    pub fn base_url(&self, provider_id: ProviderId) -> String {
        self.provider_config(provider_id)
            .and_then(|cfg| cfg.base_url.clone())
            .unwrap_or_else(|| provider_id.default_base_url().to_string())
    }

    pub fn geocoding_base_url(&self) -> String {
        self.provider_config(ProviderId::OpenMeteo)
            .and_then(|cfg| cfg.geocoding_base_url.clone())
            .unwrap_or_else(|| crate::provider::openmeteo::GEOCODING_BASE_URL.to_string())
    }

    /// Fallback search term when nothing is remembered.
    pub fn initial_location(&self) -> &str {
        self.default_location.as_deref().unwrap_or(DEFAULT_LOCATION)
    }
}
