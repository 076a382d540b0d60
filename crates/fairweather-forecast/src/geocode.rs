//! Forward geocoding against the Open-Meteo search endpoint.

use std::cmp::Reverse;
use std::time::Duration;

use chrono_tz::Tz;
use serde::Deserialize;
use tracing::instrument;

use fairweather_core::config::GeocodingConfig;

use crate::error::GeocodeError;
use crate::types::Location;

/// Client for resolving free-text place names to coordinates.
pub struct GeocodeClient {
    client: reqwest::Client,
    base_url: String,
    result_count: u32,
}

impl GeocodeClient {
    pub fn new(config: &GeocodingConfig) -> Result<Self, GeocodeError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            result_count: config.result_count,
        })
    }

    /// Resolve free-text input to the best matching place.
    ///
    /// Exact name matches (case-insensitive) win over larger places; ties
    /// keep the provider's relevance order.
    #[instrument(skip(self), level = "info")]
    pub async fn geocode(&self, input: &str) -> Result<Location, GeocodeError> {
        let url = format!("{}/search", self.base_url);
        let count = self.result_count.to_string();

        let response = self
            .client
            .get(&url)
            .query(&[
                ("name", input),
                ("count", count.as_str()),
                ("language", "en"),
                ("format", "json"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(GeocodeError::Unavailable(format!("{}: {}", status, text)));
        }

        let payload: GeocodeResponse = response.json().await?;
        let results = payload.results.unwrap_or_default();
        let Some(best) = best_match(results, input) else {
            return Err(GeocodeError::NotFound(input.to_string()));
        };

        // A place we cannot localize in time is useless downstream.
        let Some(timezone) = best.timezone.as_deref().and_then(|tz| tz.parse::<Tz>().ok()) else {
            tracing::warn!("Geocoding result for {} has no usable timezone", input);
            return Err(GeocodeError::NotFound(input.to_string()));
        };

        let location = Location {
            latitude: best.latitude,
            longitude: best.longitude,
            display_name: display_name(&best),
            country_code: best.country_code,
            timezone,
        };
        tracing::debug!("Geocoded {} to {}", input, location.display_name);
        Ok(location)
    }
}

fn best_match(results: Vec<GeocodeEntry>, queried: &str) -> Option<GeocodeEntry> {
    let wanted = normalize(queried);
    results
        .into_iter()
        .enumerate()
        .max_by_key(|(idx, entry)| {
            (
                normalize(&entry.name) == wanted,
                entry.population.unwrap_or(0),
                Reverse(*idx),
            )
        })
        .map(|(_, entry)| entry)
}

fn normalize(value: &str) -> String {
    value.trim().to_ascii_lowercase()
}

fn display_name(entry: &GeocodeEntry) -> String {
    let mut parts = vec![entry.name.clone()];
    if let Some(admin1) = entry.admin1.as_ref().filter(|a| !a.is_empty()) {
        parts.push(admin1.clone());
    }
    if let Some(country) = entry.country.as_ref().filter(|c| !c.is_empty()) {
        parts.push(country.clone());
    }
    parts.join(", ")
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    results: Option<Vec<GeocodeEntry>>,
}

#[derive(Debug, Deserialize)]
struct GeocodeEntry {
    name: String,
    latitude: f64,
    longitude: f64,
    country: Option<String>,
    country_code: Option<String>,
    admin1: Option<String>,
    timezone: Option<String>,
    population: Option<u64>,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;
    use crate::types::UnitsPreference;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(base: &str) -> GeocodingConfig {
        GeocodingConfig {
            base_url: base.to_string(),
            result_count: 5,
        }
    }

    #[tokio::test]
    async fn picks_largest_population_among_exact_matches() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("name", "paris"))
            .and(query_param("count", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [
                    {
                        "name": "Paris",
                        "latitude": 33.66,
                        "longitude": -95.56,
                        "country": "United States",
                        "country_code": "US",
                        "admin1": "Texas",
                        "timezone": "America/Chicago",
                        "population": 24_699
                    },
                    {
                        "name": "Paris",
                        "latitude": 48.85,
                        "longitude": 2.35,
                        "country": "France",
                        "country_code": "FR",
                        "timezone": "Europe/Paris",
                        "population": 2_138_551
                    }
                ]
            })))
            .mount(&mock_server)
            .await;

        let client = GeocodeClient::new(&config(&mock_server.uri())).unwrap();
        let location = client.geocode("paris").await.unwrap();

        assert_eq!(location.display_name, "Paris, France");
        assert_eq!(location.timezone, chrono_tz::Europe::Paris);
        assert_eq!(location.suggested_units(), UnitsPreference::Metric);
    }

    #[tokio::test]
    async fn exact_name_match_beats_population() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [
                    {
                        "name": "New York",
                        "latitude": 40.71,
                        "longitude": -74.01,
                        "country": "United States",
                        "country_code": "US",
                        "admin1": "New York",
                        "timezone": "America/New_York",
                        "population": 8_175_133
                    },
                    {
                        "name": "York",
                        "latitude": 53.96,
                        "longitude": -1.08,
                        "country": "United Kingdom",
                        "country_code": "GB",
                        "admin1": "England",
                        "timezone": "Europe/London",
                        "population": 144_202
                    }
                ]
            })))
            .mount(&mock_server)
            .await;

        let client = GeocodeClient::new(&config(&mock_server.uri())).unwrap();
        let location = client.geocode("york").await.unwrap();

        assert_eq!(location.display_name, "York, England, United Kingdom");
    }

    #[tokio::test]
    async fn us_result_carries_imperial_suggestion() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [{
                    "name": "New York",
                    "latitude": 40.71,
                    "longitude": -74.01,
                    "country": "United States",
                    "country_code": "US",
                    "admin1": "New York",
                    "timezone": "America/New_York",
                    "population": 8_175_133
                }]
            })))
            .mount(&mock_server)
            .await;

        let client = GeocodeClient::new(&config(&mock_server.uri())).unwrap();
        let location = client.geocode("New York").await.unwrap();

        assert_eq!(location.display_name, "New York, New York, United States");
        assert_eq!(location.suggested_units(), UnitsPreference::Imperial);
    }

    #[tokio::test]
    async fn empty_results_are_not_found() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "generationtime_ms": 0.5
            })))
            .mount(&mock_server)
            .await;

        let client = GeocodeClient::new(&config(&mock_server.uri())).unwrap();
        let err = client.geocode("Atlantis").await.unwrap_err();

        assert!(matches!(err, GeocodeError::NotFound(_)));
        assert!(err.to_string().contains("Atlantis"));
    }

    #[tokio::test]
    async fn result_without_timezone_is_not_found() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [{
                    "name": "Nowhere",
                    "latitude": 0.0,
                    "longitude": 0.0
                }]
            })))
            .mount(&mock_server)
            .await;

        let client = GeocodeClient::new(&config(&mock_server.uri())).unwrap();
        let err = client.geocode("Nowhere").await.unwrap_err();
        assert!(matches!(err, GeocodeError::NotFound(_)));
    }

    #[tokio::test]
    async fn server_error_is_unavailable() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&mock_server)
            .await;

        let client = GeocodeClient::new(&config(&mock_server.uri())).unwrap();
        let err = client.geocode("paris").await.unwrap_err();
        assert!(matches!(err, GeocodeError::Unavailable(_)));
        assert!(!err.user_message().is_empty());
    }
}
