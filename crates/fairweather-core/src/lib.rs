pub mod config;
pub mod error;

pub use config::{
    ChatConfig, Config, DefaultUnits, GeocodingConfig, UiConfig, ValidationResult, WeatherConfig,
};
pub use error::ConfigError;

use anyhow::Result;

/// Initialize logging for the Fairweather services.
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Fairweather core initialized");
    Ok(())
}
