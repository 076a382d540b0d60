//! End-to-end forecast resolution.

use std::time::Duration;

use chrono::Utc;
use tracing::instrument;

use fairweather_core::config::WeatherConfig;

use crate::cache::{cache_key, ResponseCache};
use crate::client::ForecastClient;
use crate::error::ForecastError;
use crate::temporal::classify;
use crate::types::{DataSourceChoice, NormalizedForecast, TemporalClass, WeatherQuery};

/// Resolves queries end to end: temporal classification, endpoint routing,
/// caching, and normalization.
pub struct ForecastResolver {
    client: ForecastClient,
    cache: ResponseCache,
}

impl ForecastResolver {
    pub fn new(config: &WeatherConfig) -> Result<Self, ForecastError> {
        Ok(Self {
            client: ForecastClient::new(config)?,
            cache: ResponseCache::new(Duration::from_secs(config.cache_ttl_secs)),
        })
    }

    /// Resolve one query to a normalized forecast.
    ///
    /// Classification always runs against the current instant, including for
    /// cached payloads, so a "today" payload read after local midnight stops
    /// being the present. The current-conditions snapshot is attached if and
    /// only if the query date is the present local day.
    #[instrument(skip(self), level = "info")]
    pub async fn resolve(&self, query: &WeatherQuery) -> Result<NormalizedForecast, ForecastError> {
        let (temporal_class, source) = classify(Utc::now(), query.date, query.location.timezone);
        tracing::info!(
            "Classified {} on {} as {:?}, served by {:?}",
            query.location.display_name,
            query.date,
            temporal_class,
            source
        );

        let key = cache_key(source, query);
        let payload = match self.cache.get(&key) {
            Some(payload) => payload,
            None => {
                let payload = match source {
                    DataSourceChoice::LiveForecast => self.client.fetch_forecast(query).await?,
                    DataSourceChoice::HistoricalArchive => self.client.fetch_archive(query).await?,
                };
                self.cache.put(key, payload.clone());
                payload
            }
        };

        let current = if temporal_class == TemporalClass::Present {
            payload.current
        } else {
            None
        };

        Ok(NormalizedForecast {
            daily: payload.daily,
            current,
            temporal_class,
            timezone: query.location.timezone,
        })
    }
}
