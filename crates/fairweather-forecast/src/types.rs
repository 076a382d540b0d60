//! Shared types for forecast resolution.

use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Measurement unit system.
///
/// Wind, temperature, and precipitation units are selected together; there is
/// no mixed mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UnitsPreference {
    #[default]
    Imperial,
    Metric,
}

impl UnitsPreference {
    /// Query-string overrides sent to the weather provider.
    ///
    /// Metric needs none; the provider defaults to Celsius and km/h.
    pub fn request_overrides(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            UnitsPreference::Imperial => &[
                ("wind_speed_unit", "mph"),
                ("temperature_unit", "fahrenheit"),
                ("precipitation_unit", "inch"),
            ],
            UnitsPreference::Metric => &[],
        }
    }

    pub fn temperature_label(&self) -> &'static str {
        match self {
            UnitsPreference::Imperial => "degrees Fahrenheit",
            UnitsPreference::Metric => "degrees Celsius",
        }
    }

    pub fn wind_speed_label(&self) -> &'static str {
        match self {
            UnitsPreference::Imperial => "miles per hour",
            UnitsPreference::Metric => "kilometers per hour",
        }
    }
}

/// A place resolved from free-text input, fixed for the lifetime of one query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    /// Human-readable name, e.g. "New York, New York, United States".
    pub display_name: String,
    /// ISO 3166-1 alpha-2 code when the geocoder reports one.
    pub country_code: Option<String>,
    pub timezone: Tz,
}

impl Location {
    /// Units a UI could preselect for this place.
    ///
    /// An explicit user choice always wins over this.
    pub fn suggested_units(&self) -> UnitsPreference {
        match self.country_code.as_deref() {
            Some(code) if code.eq_ignore_ascii_case("US") => UnitsPreference::Imperial,
            _ => UnitsPreference::Metric,
        }
    }
}

/// How the target date relates to now in the location's local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemporalClass {
    Past,
    Present,
    Future,
}

impl TemporalClass {
    /// Verb for a singular subject: "the high was 75".
    pub fn verb_singular(&self) -> &'static str {
        match self {
            TemporalClass::Past => "was",
            TemporalClass::Present => "is",
            TemporalClass::Future => "will be",
        }
    }

    /// Verb for a plural subject: "winds were up to 12 miles per hour".
    pub fn verb_plural(&self) -> &'static str {
        match self {
            TemporalClass::Past => "were",
            TemporalClass::Present => "are",
            TemporalClass::Future => "will be",
        }
    }
}

/// Which upstream endpoint serves the target date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSourceChoice {
    LiveForecast,
    HistoricalArchive,
}

/// One day's aggregate conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyConditions {
    pub weather_code: u16,
    pub temp_max: f64,
    pub temp_min: f64,
    pub feels_like_max: f64,
    pub feels_like_min: f64,
    pub wind_speed_max: f64,
}

/// The provider's "right now" snapshot.
///
/// Only meaningful when the query date is the current local day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub weather_code: u16,
    pub temperature: f64,
    pub feels_like: f64,
    pub wind_speed: f64,
    pub relative_humidity: f64,
    pub is_daytime: bool,
}

/// The single shape the renderer consumes, whichever endpoint produced it.
///
/// `current` is populated if and only if `temporal_class` is `Present`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedForecast {
    pub daily: DailyConditions,
    pub current: Option<CurrentConditions>,
    pub temporal_class: TemporalClass,
    pub timezone: Tz,
}

/// Request-scoped inputs for one forecast resolution.
#[derive(Debug, Clone)]
pub struct WeatherQuery {
    pub location: Location,
    pub units: UnitsPreference,
    pub date: NaiveDate,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    fn location(country_code: Option<&str>) -> Location {
        Location {
            latitude: 40.71,
            longitude: -74.01,
            display_name: "Somewhere".to_string(),
            country_code: country_code.map(String::from),
            timezone: chrono_tz::America::New_York,
        }
    }

    #[test]
    fn us_locations_suggest_imperial() {
        assert_eq!(location(Some("US")).suggested_units(), UnitsPreference::Imperial);
        assert_eq!(location(Some("us")).suggested_units(), UnitsPreference::Imperial);
    }

    #[test]
    fn other_locations_suggest_metric() {
        assert_eq!(location(Some("DE")).suggested_units(), UnitsPreference::Metric);
        assert_eq!(location(None).suggested_units(), UnitsPreference::Metric);
    }

    #[test]
    fn verb_forms_follow_temporal_class() {
        assert_eq!(TemporalClass::Past.verb_singular(), "was");
        assert_eq!(TemporalClass::Past.verb_plural(), "were");
        assert_eq!(TemporalClass::Present.verb_singular(), "is");
        assert_eq!(TemporalClass::Present.verb_plural(), "are");
        assert_eq!(TemporalClass::Future.verb_singular(), "will be");
        assert_eq!(TemporalClass::Future.verb_plural(), "will be");
    }

    #[test]
    fn imperial_overrides_cover_all_three_units() {
        let overrides = UnitsPreference::Imperial.request_overrides();
        assert_eq!(overrides.len(), 3);
        assert!(overrides.contains(&("temperature_unit", "fahrenheit")));
        assert!(overrides.contains(&("wind_speed_unit", "mph")));
        assert!(overrides.contains(&("precipitation_unit", "inch")));
    }

    #[test]
    fn metric_sends_no_overrides() {
        assert!(UnitsPreference::Metric.request_overrides().is_empty());
    }

    #[test]
    fn unit_labels_are_spelled_out() {
        assert_eq!(UnitsPreference::Imperial.temperature_label(), "degrees Fahrenheit");
        assert_eq!(UnitsPreference::Metric.temperature_label(), "degrees Celsius");
        assert_eq!(UnitsPreference::Imperial.wind_speed_label(), "miles per hour");
        assert_eq!(UnitsPreference::Metric.wind_speed_label(), "kilometers per hour");
    }
}
