use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{credential::ApiCredential, location::LocationOptions};

/// Environment variable holding a user API key; wins over the config file.
pub const API_KEY_ENV: &str = "OPENWEATHER_API_KEY";

pub const DEFAULT_LOCATION_TIMEOUT_MS: u64 = 15_000;
pub const DEFAULT_MAX_CACHED_AGE_MS: u64 = 300_000;

/// Bounds for location resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationSettings {
    pub timeout_ms: u64,
    pub max_cached_age_ms: u64,
}

impl Default for LocationSettings {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_LOCATION_TIMEOUT_MS,
            max_cached_age_ms: DEFAULT_MAX_CACHED_AGE_MS,
        }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
///
/// [location]
/// timeout_ms = 15000
/// max_cached_age_ms = 300000
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    /// User-supplied OpenWeatherMap key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Provider endpoint override, mostly useful against a proxy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,

    #[serde(default)]
    pub location: LocationSettings,
}

impl Config {
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
        let dirs = ProjectDirs::from("dev", "skyview", "skyview")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn set_api_key(&mut self, api_key: String) {
        let trimmed = api_key.trim();
        self.api_key = (!trimmed.is_empty()).then(|| trimmed.to_string());
    }

    pub fn clear_api_key(&mut self) {
        self.api_key = None;
    }

    /// Resolve the active credential: environment, then config file, then
    /// the bundled demo key.
    pub fn credential(&self) -> ApiCredential {
        self.credential_from(std::env::var(API_KEY_ENV).ok())
    }

    fn credential_from(&self, env_key: Option<String>) -> ApiCredential {
        let user = env_key
            .filter(|k| !k.trim().is_empty())
            .or_else(|| self.api_key.clone());

        ApiCredential::with_bundled_fallback(user)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn location_options(&self) -> LocationOptions {
        LocationOptions {
            timeout: Duration::from_millis(self.location.timeout_ms),
            max_cached_age: Duration::from_millis(self.location.max_cached_age_ms),
        }
    }
}
