//! Forecast resolution for Fairweather.
//!
//! Classifies query dates against the location's local time, routes between
//! the live forecast and historical archive endpoints, normalizes their
//! responses into one shape, and renders that shape as tense-matched prose.

pub mod cache;
pub mod client;
pub mod conditions;
pub mod error;
pub mod geocode;
pub mod render;
pub mod resolver;
pub mod retry;
pub mod temporal;
pub mod types;

pub use cache::ResponseCache;
pub use client::{ForecastClient, ForecastPayload};
pub use conditions::condition_label;
pub use error::{ForecastError, GeocodeError, RenderError};
pub use geocode::GeocodeClient;
pub use render::render;
pub use resolver::ForecastResolver;
pub use temporal::{classify, ARCHIVE_CUTOFF_DAYS};
pub use types::{
    CurrentConditions, DailyConditions, DataSourceChoice, Location, NormalizedForecast,
    TemporalClass, UnitsPreference, WeatherQuery,
};
