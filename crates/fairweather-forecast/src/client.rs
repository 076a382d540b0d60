//! HTTP client for the two weather endpoints.
//!
//! The live forecast and the historical archive share one response shape;
//! both are decoded strictly so upstream contract drift surfaces as a typed
//! error instead of silently missing data.

use std::collections::HashMap;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::instrument;

use fairweather_core::config::WeatherConfig;

use crate::error::ForecastError;
use crate::retry::{with_retry, RetryConfig};
use crate::types::{CurrentConditions, DailyConditions, WeatherQuery};

/// Daily aggregate fields requested from both endpoints.
const DAILY_FIELDS: &str = "weather_code,temperature_2m_max,temperature_2m_min,apparent_temperature_max,apparent_temperature_min,wind_speed_10m_max";

/// Snapshot fields requested from the live forecast endpoint only.
const CURRENT_FIELDS: &str =
    "weather_code,temperature_2m,apparent_temperature,wind_speed_10m,is_day,relative_humidity_2m";

/// Raw upstream data for one day, before temporal classification.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastPayload {
    pub daily: DailyConditions,
    /// Present on live forecast responses, never on archive responses.
    pub current: Option<CurrentConditions>,
}

/// Client for the forecast and archive endpoints.
pub struct ForecastClient {
    client: reqwest::Client,
    forecast_url: String,
    archive_url: String,
    retry: RetryConfig,
}

impl ForecastClient {
    pub fn new(config: &WeatherConfig) -> Result<Self, ForecastError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            forecast_url: config.forecast_url.clone(),
            archive_url: config.archive_url.clone(),
            retry: RetryConfig::new(
                config.max_retries,
                config.retry_initial_delay_ms,
                config.retry_max_delay_ms,
            ),
        })
    }

    /// Fetch the target day from the live forecast endpoint.
    ///
    /// Always requests the current-conditions snapshot alongside the daily
    /// aggregates; the resolver decides whether it is meaningful.
    #[instrument(skip(self), level = "info")]
    pub async fn fetch_forecast(&self, query: &WeatherQuery) -> Result<ForecastPayload, ForecastError> {
        let url = format!("{}/forecast", self.forecast_url);
        let mut params = common_params(query);
        params.push(("daily", DAILY_FIELDS.to_string()));
        params.push(("current", CURRENT_FIELDS.to_string()));

        let response = with_retry(&self.retry, || {
            self.client.get(&url).query(&params).send()
        })
        .await?;
        let payload: WeatherResponse = handle_response(response).await?;

        let current = match payload.current {
            Some(block) => CurrentConditions::from(block),
            None => {
                return Err(ForecastError::InvalidResponse(
                    "missing current block in forecast response".to_string(),
                ))
            }
        };
        Ok(ForecastPayload {
            daily: daily_conditions(&payload.daily)?,
            current: Some(current),
        })
    }

    /// Fetch the target day from the historical archive endpoint.
    ///
    /// The archive has no notion of current conditions.
    #[instrument(skip(self), level = "info")]
    pub async fn fetch_archive(&self, query: &WeatherQuery) -> Result<ForecastPayload, ForecastError> {
        let url = format!("{}/archive", self.archive_url);
        let mut params = common_params(query);
        params.push(("daily", DAILY_FIELDS.to_string()));

        let response = with_retry(&self.retry, || {
            self.client.get(&url).query(&params).send()
        })
        .await?;
        let payload: WeatherResponse = handle_response(response).await?;
        Ok(ForecastPayload {
            daily: daily_conditions(&payload.daily)?,
            current: None,
        })
    }
}

/// Parameters shared by both endpoints: coordinates, the location's own
/// timezone, a single-day date window, and any unit overrides.
fn common_params(query: &WeatherQuery) -> Vec<(&'static str, String)> {
    let date = query.date.format("%Y-%m-%d").to_string();
    let mut params = vec![
        ("latitude", query.location.latitude.to_string()),
        ("longitude", query.location.longitude.to_string()),
        ("timezone", query.location.timezone.name().to_string()),
        ("start_date", date.clone()),
        ("end_date", date),
    ];
    params.extend(
        query
            .units
            .request_overrides()
            .iter()
            .map(|(key, value)| (*key, (*value).to_string())),
    );
    params
}

async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ForecastError> {
    let status = response.status();
    if status.is_success() {
        response
            .json()
            .await
            .map_err(|e| ForecastError::InvalidResponse(format!("JSON decode error: {}", e)))
    } else {
        let text = response.text().await.unwrap_or_default();
        Err(ForecastError::Unavailable(format!("{}: {}", status, text)))
    }
}

fn daily_conditions(block: &DailyBlock) -> Result<DailyConditions, ForecastError> {
    // Single-day window; more than one entry means the request was mangled.
    if block.time.len() != 1 {
        return Err(ForecastError::InvalidResponse(format!(
            "expected exactly one day, got {}",
            block.time.len()
        )));
    }
    Ok(DailyConditions {
        weather_code: first_value("weather_code", &block.weather_code)?,
        temp_max: first_value("temperature_2m_max", &block.temperature_2m_max)?,
        temp_min: first_value("temperature_2m_min", &block.temperature_2m_min)?,
        feels_like_max: first_value("apparent_temperature_max", &block.apparent_temperature_max)?,
        feels_like_min: first_value("apparent_temperature_min", &block.apparent_temperature_min)?,
        wind_speed_max: first_value("wind_speed_10m_max", &block.wind_speed_10m_max)?,
    })
}

/// The provider returns null for days it has no data for.
fn first_value<T: Copy>(name: &str, values: &[Option<T>]) -> Result<T, ForecastError> {
    values
        .first()
        .copied()
        .flatten()
        .ok_or_else(|| ForecastError::InvalidResponse(format!("missing daily field: {}", name)))
}

/// Full response envelope. Unknown fields are rejected so contract drift
/// shows up as an `InvalidResponse` instead of being dropped on the floor.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
#[allow(dead_code)]
struct WeatherResponse {
    latitude: f64,
    longitude: f64,
    generationtime_ms: f64,
    utc_offset_seconds: i64,
    timezone: String,
    timezone_abbreviation: String,
    elevation: f64,
    daily_units: HashMap<String, String>,
    daily: DailyBlock,
    #[serde(default)]
    current_units: Option<HashMap<String, String>>,
    #[serde(default)]
    current: Option<CurrentBlock>,
}

/// Parallel arrays, one slot per requested day.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DailyBlock {
    time: Vec<String>,
    weather_code: Vec<Option<u16>>,
    temperature_2m_max: Vec<Option<f64>>,
    temperature_2m_min: Vec<Option<f64>>,
    apparent_temperature_max: Vec<Option<f64>>,
    apparent_temperature_min: Vec<Option<f64>>,
    wind_speed_10m_max: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
#[allow(dead_code)]
struct CurrentBlock {
    time: String,
    interval: u32,
    weather_code: u16,
    temperature_2m: f64,
    apparent_temperature: f64,
    wind_speed_10m: f64,
    is_day: u8,
    relative_humidity_2m: f64,
}

impl From<CurrentBlock> for CurrentConditions {
    fn from(block: CurrentBlock) -> Self {
        CurrentConditions {
            weather_code: block.weather_code,
            temperature: block.temperature_2m,
            feels_like: block.apparent_temperature,
            wind_speed: block.wind_speed_10m,
            relative_humidity: block.relative_humidity_2m,
            is_daytime: block.is_day == 1,
        }
    }
}
