//! In-memory cache for upstream weather responses.
//!
//! Entries hold raw payloads keyed by the full request identity. Temporal
//! classification is never cached; it is recomputed on every resolve so a
//! cached "today" payload read after midnight does not keep claiming to be
//! the present.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::client::ForecastPayload;
use crate::types::{DataSourceChoice, WeatherQuery};

/// TTL-bounded payload cache. A zero TTL disables caching entirely.
pub struct ResponseCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

struct CacheEntry {
    payload: ForecastPayload,
    fetched_at: Instant,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Look up a fresh payload, evicting it if it has expired.
    pub fn get(&self, key: &str) -> Option<ForecastPayload> {
        if self.ttl.is_zero() {
            return None;
        }
        let mut entries = self.entries.lock();
        if let Some(entry) = entries.get(key) {
            if entry.fetched_at.elapsed() < self.ttl {
                tracing::debug!("Cache hit for {}", key);
                return Some(entry.payload.clone());
            }
            tracing::debug!("Cache entry expired for {}", key);
            entries.remove(key);
        }
        None
    }

    pub fn put(&self, key: String, payload: ForecastPayload) {
        if self.ttl.is_zero() {
            return;
        }
        self.entries.lock().insert(
            key,
            CacheEntry {
                payload,
                fetched_at: Instant::now(),
            },
        );
    }
}

/// Cache key covering everything that changes the upstream response:
/// endpoint, coordinates, timezone, units, and date.
pub fn cache_key(source: DataSourceChoice, query: &WeatherQuery) -> String {
    format!(
        "{:?}|{}|{}|{}|{:?}|{}",
        source,
        query.location.latitude,
        query.location.longitude,
        query.location.timezone.name(),
        query.units,
        query.date
    )
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;
    use crate::types::{DailyConditions, Location, UnitsPreference};
    use chrono::NaiveDate;

    fn payload(temp_max: f64) -> ForecastPayload {
        ForecastPayload {
            daily: DailyConditions {
                weather_code: 0,
                temp_max,
                temp_min: 50.0,
                feels_like_max: temp_max,
                feels_like_min: 48.0,
                wind_speed_max: 10.0,
            },
            current: None,
        }
    }

    fn query(units: UnitsPreference, day: u32) -> WeatherQuery {
        WeatherQuery {
            location: Location {
                latitude: 40.71,
                longitude: -74.01,
                display_name: "New York".to_string(),
                country_code: Some("US".to_string()),
                timezone: chrono_tz::America::New_York,
            },
            units,
            date: NaiveDate::from_ymd_opt(2026, 8, day).unwrap(),
        }
    }

    #[test]
    fn fresh_entries_are_returned() {
        let cache = ResponseCache::new(Duration::from_secs(60));
        cache.put("k".to_string(), payload(75.0));
        assert_eq!(cache.get("k"), Some(payload(75.0)));
    }

    #[test]
    fn expired_entries_are_evicted() {
        let cache = ResponseCache::new(Duration::from_millis(10));
        cache.put("k".to_string(), payload(75.0));
        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn zero_ttl_disables_the_cache() {
        let cache = ResponseCache::new(Duration::ZERO);
        cache.put("k".to_string(), payload(75.0));
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn keys_distinguish_source_units_and_date() {
        let live_imperial = cache_key(DataSourceChoice::LiveForecast, &query(UnitsPreference::Imperial, 14));
        let archive_imperial = cache_key(DataSourceChoice::HistoricalArchive, &query(UnitsPreference::Imperial, 14));
        let live_metric = cache_key(DataSourceChoice::LiveForecast, &query(UnitsPreference::Metric, 14));
        let live_next_day = cache_key(DataSourceChoice::LiveForecast, &query(UnitsPreference::Imperial, 15));

        assert_ne!(live_imperial, archive_imperial);
        assert_ne!(live_imperial, live_metric);
        assert_ne!(live_imperial, live_next_day);
    }
}
