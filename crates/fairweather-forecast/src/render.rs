//! Natural-language rendering of normalized forecasts.

use crate::conditions::condition_label;
use crate::error::RenderError;
use crate::types::{NormalizedForecast, WeatherQuery};

/// Render a forecast as tense-matched prose.
///
/// Verb forms follow the temporal class, every numeric value is rounded to a
/// whole number and labeled with its unit, and the target date appears
/// exactly once, spelled out in full.
pub fn render(forecast: &NormalizedForecast, query: &WeatherQuery) -> Result<String, RenderError> {
    let condition = label_for(forecast.daily.weather_code)?;
    let date_text = query.date.format("%A, %B %-d, %Y").to_string();
    let singular = forecast.temporal_class.verb_singular();
    let plural = forecast.temporal_class.verb_plural();
    let temp = query.units.temperature_label();
    let wind = query.units.wind_speed_label();
    let daily = &forecast.daily;

    let mut text = format!(
        "The weather in {} on {} {} {}.",
        query.location.display_name, date_text, singular, condition
    );
    text.push_str(&format!(
        " The high {} {} {} with a feels-like high of {} {}, and the low {} {} {} with a feels-like low of {} {}.",
        singular,
        round_whole(daily.temp_max),
        temp,
        round_whole(daily.feels_like_max),
        temp,
        singular,
        round_whole(daily.temp_min),
        temp,
        round_whole(daily.feels_like_min),
        temp
    ));
    text.push_str(&format!(
        " Winds {} up to {} {}.",
        plural,
        round_whole(daily.wind_speed_max),
        wind
    ));

    // Present-day queries also describe the moment, always in present tense.
    if let Some(current) = &forecast.current {
        let now_condition = label_for(current.weather_code)?;
        let daypart = if current.is_daytime { "daytime" } else { "nighttime" };
        text.push_str(&format!(
            " It is currently {} with {}: {} {}, feeling like {} {}, with wind at {} {} and humidity at {} percent.",
            daypart,
            now_condition,
            round_whole(current.temperature),
            temp,
            round_whole(current.feels_like),
            temp,
            round_whole(current.wind_speed),
            wind,
            round_whole(current.relative_humidity)
        ));
    }

    Ok(text)
}

fn label_for(code: u16) -> Result<String, RenderError> {
    match condition_label(code) {
        Ok(label) => Ok(label.to_lowercase()),
        Err(err) => {
            tracing::error!("Forecast contains unknown weather code {}", code);
            Err(err)
        }
    }
}

/// Round half away from zero: 72.5 reads as 73, -5.5 as -6.
fn round_whole(value: f64) -> i64 {
    value.round() as i64
}
