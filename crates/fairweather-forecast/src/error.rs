//! Error types for geocoding, forecast retrieval, and rendering.
//!
//! Each error carries a `user_message` suitable for showing in a chat
//! transcript. Internal detail stays in the `Display` output for logs.

use thiserror::Error;

/// Errors from resolving free-text input to a place.
#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("No results for location: {0}")]
    NotFound(String),

    #[error("Geocoding service error: {0}")]
    Unavailable(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl GeocodeError {
    /// User-facing advisory text for this error.
    pub fn user_message(&self) -> &'static str {
        match self {
            GeocodeError::NotFound(_) => {
                "I couldn't find that location. Check the spelling and try again."
            }
            GeocodeError::Unavailable(_) | GeocodeError::Network(_) => {
                "Location lookup is unavailable right now. Please try again in a moment."
            }
        }
    }
}

/// Errors from fetching or decoding weather data.
#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("Weather service error: {0}")]
    Unavailable(String),

    #[error("Malformed weather response: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl ForecastError {
    /// User-facing advisory text for this error.
    ///
    /// Transport, status, and decode failures all read the same to the user.
    pub fn user_message(&self) -> &'static str {
        "Weather data is unavailable right now. Please try again later."
    }
}

/// Errors from turning a normalized forecast into prose.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Unrecognized weather code: {0}")]
    UnrecognizedCode(u16),
}

impl RenderError {
    /// User-facing advisory text for this error.
    pub fn user_message(&self) -> &'static str {
        match self {
            RenderError::UnrecognizedCode(_) => {
                "The forecast could not be described. Please try again later."
            }
        }
    }
}
