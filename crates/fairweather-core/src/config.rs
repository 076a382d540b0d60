use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ConfigError;

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Add an error
    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Add a warning
    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        if self.errors.is_empty() {
            return String::new();
        }
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Weather data provider settings
    #[serde(default)]
    pub weather: WeatherConfig,

    /// Geocoding settings
    #[serde(default)]
    pub geocoding: GeocodingConfig,

    /// Chat completion service settings
    #[serde(default)]
    pub chat: ChatConfig,

    /// UI preferences
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Base URL for the live forecast endpoint
    #[serde(default = "default_forecast_url")]
    pub forecast_url: String,

    /// Base URL for the historical archive endpoint
    #[serde(default = "default_archive_url")]
    pub archive_url: String,

    /// How long fetched responses stay fresh, in seconds (0 disables caching)
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Maximum retry attempts after the initial request
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Initial retry delay in milliseconds (doubles each attempt)
    #[serde(default = "default_retry_initial_delay_ms")]
    pub retry_initial_delay_ms: u64,

    /// Cap on the retry delay in milliseconds
    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_forecast_url() -> String {
    "https://api.open-meteo.com/v1".to_string()
}

fn default_archive_url() -> String {
    "https://archive-api.open-meteo.com/v1".to_string()
}

fn default_cache_ttl_secs() -> u64 {
    3600
}

fn default_max_retries() -> u32 {
    4
}

fn default_retry_initial_delay_ms() -> u64 {
    200
}

fn default_retry_max_delay_ms() -> u64 {
    2000
}

fn default_request_timeout_secs() -> u64 {
    10
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            forecast_url: default_forecast_url(),
            archive_url: default_archive_url(),
            cache_ttl_secs: default_cache_ttl_secs(),
            max_retries: default_max_retries(),
            retry_initial_delay_ms: default_retry_initial_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodingConfig {
    /// Base URL for the geocoding search endpoint
    #[serde(default = "default_geocoding_url")]
    pub base_url: String,

    /// How many candidate places to request per lookup
    #[serde(default = "default_result_count")]
    pub result_count: u32,
}

fn default_geocoding_url() -> String {
    "https://geocoding-api.open-meteo.com/v1".to_string()
}

fn default_result_count() -> u32 {
    5
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            base_url: default_geocoding_url(),
            result_count: default_result_count(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Base URL for the Ollama-compatible completion service
    #[serde(default = "default_chat_url")]
    pub base_url: String,

    /// Model used when the caller does not pick one
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Sampling temperature for clothing recommendations
    #[serde(default = "default_clothing_temperature")]
    pub clothing_temperature: f64,

    /// Sampling temperature for story generation
    #[serde(default = "default_story_temperature")]
    pub story_temperature: f64,

    /// Sampling temperature for follow-up questions and plain answers
    #[serde(default = "default_fallback_temperature")]
    pub fallback_temperature: f64,
}

fn default_chat_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "tinyllama".to_string()
}

fn default_clothing_temperature() -> f64 {
    0.5
}

fn default_story_temperature() -> f64 {
    0.9
}

fn default_fallback_temperature() -> f64 {
    0.2
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            base_url: default_chat_url(),
            default_model: default_model(),
            clothing_temperature: default_clothing_temperature(),
            story_temperature: default_story_temperature(),
            fallback_temperature: default_fallback_temperature(),
        }
    }
}

/// Measurement system preset for the units toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DefaultUnits {
    /// Fahrenheit and miles per hour
    #[default]
    Imperial,
    /// Celsius and kilometers per hour
    Metric,
    /// Follow the geocoded location's country
    Auto,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Location shown in the input field before the user types
    #[serde(default = "default_location")]
    pub default_location: String,

    /// Initial position of the units toggle
    #[serde(default)]
    pub default_units: DefaultUnits,

    /// Upper bound for the date picker, in days from today
    #[serde(default = "default_max_future_days")]
    pub max_future_days: u32,
}

fn default_location() -> String {
    "NYC".to_string()
}

fn default_max_future_days() -> u32 {
    14
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            default_location: default_location(),
            default_units: DefaultUnits::default(),
            max_future_days: default_max_future_days(),
        }
    }
}

impl Config {
    /// Load configuration from file, creating default if it doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::NotFound(format!("{}: {}", path.display(), e)))?;

        let config: Config =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Returns the config along with any validation warnings.
    /// Returns an error if validation fails with critical errors.
    pub fn load_validated() -> Result<(Self, ValidationResult)> {
        let config = Self::load()?;
        let validation = config.validate();

        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()).into());
        }

        if !validation.warnings.is_empty() {
            for warning in &validation.warnings {
                tracing::warn!("Config warning: {}", warning);
            }
        }

        Ok((config, validation))
    }

    /// Validate the configuration
    ///
    /// Returns a ValidationResult containing any errors or warnings.
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        self.validate_url(&self.weather.forecast_url, "weather.forecast_url", &mut result);
        self.validate_url(&self.weather.archive_url, "weather.archive_url", &mut result);
        self.validate_url(&self.geocoding.base_url, "geocoding.base_url", &mut result);
        self.validate_url(&self.chat.base_url, "chat.base_url", &mut result);

        if self.weather.request_timeout_secs == 0 {
            result.add_error(
                "weather.request_timeout_secs",
                "Request timeout must be greater than 0",
            );
        }

        if self.weather.cache_ttl_secs == 0 {
            result.add_warning("weather.cache_ttl_secs", "Response caching disabled (0 seconds)");
        } else if self.weather.cache_ttl_secs > 86400 {
            result.add_warning(
                "weather.cache_ttl_secs",
                "Cached responses stay fresh for more than 24 hours",
            );
        }

        if self.weather.max_retries > 8 {
            result.add_warning(
                "weather.max_retries",
                "More than 8 retries makes failed requests very slow to surface",
            );
        }

        if self.weather.retry_max_delay_ms < self.weather.retry_initial_delay_ms {
            result.add_error(
                "weather.retry_max_delay_ms",
                "Maximum retry delay is below the initial delay",
            );
        }

        if self.geocoding.result_count == 0 {
            result.add_error("geocoding.result_count", "Result count must be greater than 0");
        } else if self.geocoding.result_count > 100 {
            result.add_error("geocoding.result_count", "Result count cannot exceed 100");
        }

        if self.chat.default_model.is_empty() {
            result.add_error("chat.default_model", "Default model name is empty");
        }

        for (field, value) in [
            ("chat.clothing_temperature", self.chat.clothing_temperature),
            ("chat.story_temperature", self.chat.story_temperature),
            ("chat.fallback_temperature", self.chat.fallback_temperature),
        ] {
            if !(0.0..=2.0).contains(&value) {
                result.add_error(field, format!("Temperature {} is outside 0.0..=2.0", value));
            }
        }

        if self.ui.default_location.is_empty() {
            result.add_warning("ui.default_location", "Default location is empty");
        }

        if self.ui.max_future_days > 16 {
            result.add_warning(
                "ui.max_future_days",
                "Forecast data is unreliable more than 16 days out",
            );
        }

        result
    }

    /// Validate a URL field
    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }

                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }

                if let Some(port) = url.port() {
                    if port == 0 {
                        result.add_error(field_name, "Port cannot be 0");
                    }
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        self.save_to(&config_path)
    }

    /// Save configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Get the path to the configuration file
    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("fairweather");

        Ok(config_dir.join("config.toml"))
    }
}
