#[cfg(test)]
mod tests;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub weather: WeatherConfig,
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WeatherConfig {
    pub geocoding_url: String,
    pub forecast_url: String,
    pub units: String,
    pub timeout_seconds: u64,
    pub retry_attempts: u32,
    pub user_agent: String,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            geocoding_url: "https://geocoding-api.open-meteo.com".to_string(),
            forecast_url: "https://api.open-meteo.com".to_string(),
            units: "metric".to_string(),
            timeout_seconds: 30,
            retry_attempts: 3,
            user_agent: concat!("toolkit-mcp/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration directory not found or could not be created")]
    DirectoryError,
    #[error("Invalid URL format: {0}")]
    InvalidUrl(String),
    #[error("Invalid units: {0} (must be 'metric' or 'imperial')")]
    InvalidUnits(String),
    #[error("Invalid timeout: {0} (must be between 1 and 300 seconds)")]
    InvalidTimeout(u64),
    #[error("Invalid retry attempts: {0} (must be between 1 and 10)")]
    InvalidRetryAttempts(u32),
    #[error("Invalid user agent: cannot be empty")]
    InvalidUserAgent,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl Config {
    #[inline]
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        dirs::home_dir()
            .map(|home| home.join(".toolkit-mcp"))
            .or({
                #[cfg(windows)]
                {
                    dirs::data_dir().map(|data| data.join("toolkit-mcp"))
                }
                #[cfg(not(windows))]
                {
                    None
                }
            })
            .ok_or(ConfigError::DirectoryError)
    }

    #[inline]
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join("config.toml");

        if !config_path.exists() {
            return Ok(Self {
                weather: WeatherConfig::default(),
                base_dir: config_dir.as_ref().to_path_buf(),
            });
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;
        config.base_dir = config_dir.as_ref().to_path_buf();

        config
            .validate()
            .with_context(|| "Configuration validation failed")?;

        Ok(config)
    }

    #[inline]
    pub fn save(&self) -> Result<()> {
        self.validate()
            .context("Configuration validation failed before saving")?;

        let config_dir = self.get_base_dir();

        fs::create_dir_all(config_dir).with_context(|| {
            format!(
                "Failed to create config directory: {}",
                config_dir.display()
            )
        })?;

        let config_path = self.config_file_path()?;
        let content = toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

        Ok(())
    }

    /// Get the base directory for the application
    #[inline]
    pub fn get_base_dir(&self) -> &Path {
        &self.base_dir
    }

    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.weather.validate()
    }

    #[inline]
    pub fn config_file_path(&self) -> Result<PathBuf> {
        Ok(self.get_base_dir().join("config.toml"))
    }

    /// Geocoding service base URL
    #[inline]
    pub fn geocoding_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.weather.geocoding_url)
            .map_err(|_| ConfigError::InvalidUrl(self.weather.geocoding_url.clone()))
    }

    /// Forecast service base URL
    #[inline]
    pub fn forecast_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.weather.forecast_url)
            .map_err(|_| ConfigError::InvalidUrl(self.weather.forecast_url.clone()))
    }
}

impl WeatherConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        Url::parse(&self.geocoding_url)
            .map_err(|_| ConfigError::InvalidUrl(self.geocoding_url.clone()))?;
        Url::parse(&self.forecast_url)
            .map_err(|_| ConfigError::InvalidUrl(self.forecast_url.clone()))?;

        if self.units != "metric" && self.units != "imperial" {
            return Err(ConfigError::InvalidUnits(self.units.clone()));
        }

        if !(1..=300).contains(&self.timeout_seconds) {
            return Err(ConfigError::InvalidTimeout(self.timeout_seconds));
        }

        if !(1..=10).contains(&self.retry_attempts) {
            return Err(ConfigError::InvalidRetryAttempts(self.retry_attempts));
        }

        if self.user_agent.trim().is_empty() {
            return Err(ConfigError::InvalidUserAgent);
        }

        Ok(())
    }

    pub fn set_geocoding_url(&mut self, url: String) -> Result<(), ConfigError> {
        Url::parse(&url).map_err(|_| ConfigError::InvalidUrl(url.clone()))?;
        self.geocoding_url = url;
        Ok(())
    }

    pub fn set_forecast_url(&mut self, url: String) -> Result<(), ConfigError> {
        Url::parse(&url).map_err(|_| ConfigError::InvalidUrl(url.clone()))?;
        self.forecast_url = url;
        Ok(())
    }

    pub fn set_units(&mut self, units: String) -> Result<(), ConfigError> {
        if units != "metric" && units != "imperial" {
            return Err(ConfigError::InvalidUnits(units));
        }
        self.units = units;
        Ok(())
    }

    pub fn set_timeout_seconds(&mut self, timeout: u64) -> Result<(), ConfigError> {
        if !(1..=300).contains(&timeout) {
            return Err(ConfigError::InvalidTimeout(timeout));
        }
        self.timeout_seconds = timeout;
        Ok(())
    }

    pub fn set_retry_attempts(&mut self, attempts: u32) -> Result<(), ConfigError> {
        if !(1..=10).contains(&attempts) {
            return Err(ConfigError::InvalidRetryAttempts(attempts));
        }
        self.retry_attempts = attempts;
        Ok(())
    }
}
