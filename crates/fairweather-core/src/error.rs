//! Configuration error types shared across the Fairweather crates.
//!
//! Service-specific failures (geocoding, weather data, chat) live with the
//! crates that produce them; each error enum carries a `user_message()` so
//! boundaries can turn any failure into text safe to show in a UI.

use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Configuration parse error: {0}")]
    ParseError(String),
}

impl ConfigError {
    /// Returns a user-friendly message suitable for display in a UI.
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::NotFound(_) => "Configuration not found. Using defaults.",
            ConfigError::Invalid(_) => "Invalid configuration. Check your settings.",
            ConfigError::ParseError(_) => "Configuration file is malformed. Check your settings.",
        }
    }
}
