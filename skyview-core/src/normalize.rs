//! Pure conversion from OpenWeather payloads to the stable model.
//!
//! Nothing here performs I/O. Payloads that deserialized but cannot be
//! represented (e.g. an out-of-range timestamp) come back as
//! [`FetchError::Provider`].

use chrono::{DateTime, FixedOffset, Timelike, Utc};

use crate::{
    error::FetchError,
    model::{CurrentConditions, DailyForecast, RawReading},
    provider::openweather::{OwCurrentResponse, OwForecastResponse, OwWeather},
};

pub const DEFAULT_ICON: &str = "🌤️";

/// Local hours whose readings may stand for the whole day.
pub const MIDDAY_HOURS: std::ops::RangeInclusive<u32> = 11..=14;

pub const MAX_FORECAST_DAYS: usize = 5;

const UNKNOWN_CONDITION: &str = "Unknown";

/// Map an OpenWeather icon code (e.g. `"01d"`) to a display glyph.
/// Unknown codes get [`DEFAULT_ICON`].
pub fn map_icon(code: &str) -> &'static str {
    match code {
        "01d" => "☀️",
        "01n" => "🌙",
        "02d" => "⛅",
        "02n" => "☁️",
        "03d" | "03n" | "04d" | "04n" => "☁️",
        "09d" | "09n" => "🌧️",
        "10d" => "🌦️",
        "10n" => "🌧️",
        "11d" | "11n" => "⛈️",
        "13d" | "13n" => "❄️",
        "50d" | "50n" => "🌫️",
        _ => DEFAULT_ICON,
    }
}

/// Nearest whole degree, halves rounded away from zero (18.5 -> 19, -18.5 -> -19).
pub fn round_temperature(value: f64) -> i32 {
    value.round() as i32
}

pub(crate) fn current_conditions(payload: &OwCurrentResponse) -> Result<CurrentConditions, FetchError> {
    let (description, icon) = condition(payload.weather.first());

    Ok(CurrentConditions {
        city: payload.name.clone(),
        country: payload
            .sys
            .as_ref()
            .and_then(|sys| sys.country.clone())
            .unwrap_or_default(),
        temperature_c: round_temperature(payload.main.temp),
        feels_like_c: round_temperature(payload.main.feels_like),
        humidity_pct: payload.main.humidity.min(100),
        description,
        wind_speed_mps: payload.wind.speed,
        icon: icon.to_string(),
        observed_at: utc_from_epoch(payload.dt)?,
    })
}

pub(crate) fn daily_forecasts(payload: &OwForecastResponse) -> Result<Vec<DailyForecast>, FetchError> {
    let offset_secs = payload.city.as_ref().map_or(0, |city| city.timezone);
    let offset = FixedOffset::east_opt(offset_secs).ok_or_else(|| {
        FetchError::Provider(format!("Invalid timezone offset in forecast: {offset_secs}"))
    })?;

    let readings: Vec<RawReading> = payload
        .list
        .iter()
        .map(|entry| {
            let first = entry.weather.first();
            RawReading {
                timestamp: entry.dt,
                temperature_c: entry.main.temp,
                icon_code: first.map(|w| w.icon.clone()).unwrap_or_default(),
                description: first
                    .map(|w| w.description.clone())
                    .unwrap_or_else(|| UNKNOWN_CONDITION.to_string()),
            }
        })
        .collect();

    reduce_daily(&readings, offset)
}

/// Collapse a reading list into one entry per local calendar day.
///
/// A reading inside [`MIDDAY_HOURS`] replaces whatever the day holds so far,
/// so the last midday reading wins. Outside that window only the first
/// reading of a day is kept. Days keep first-seen order and the result is
/// capped at [`MAX_FORECAST_DAYS`].
pub fn reduce_daily(
    readings: &[RawReading],
    offset: FixedOffset,
) -> Result<Vec<DailyForecast>, FetchError> {
    let mut days: Vec<DailyForecast> = Vec::new();

    for reading in readings {
        let local = utc_from_epoch(reading.timestamp)?.with_timezone(&offset);
        let date = local.date_naive();
        let in_window = MIDDAY_HOURS.contains(&local.hour());

        let existing = days.iter().position(|day| day.date == date);
        if existing.is_some() && !in_window {
            continue;
        }

        let entry = DailyForecast {
            date,
            temperature_c: round_temperature(reading.temperature_c),
            description: reading.description.clone(),
            icon: map_icon(&reading.icon_code).to_string(),
        };

        match existing {
            Some(idx) => days[idx] = entry,
            None => days.push(entry),
        }
    }

    days.truncate(MAX_FORECAST_DAYS);
    Ok(days)
}

fn condition(weather: Option<&OwWeather>) -> (String, &'static str) {
    match weather {
        Some(w) => (w.description.clone(), map_icon(&w.icon)),
        None => (UNKNOWN_CONDITION.to_string(), DEFAULT_ICON),
    }
}

fn utc_from_epoch(ts: i64) -> Result<DateTime<Utc>, FetchError> {
    DateTime::from_timestamp(ts, 0)
        .ok_or_else(|| FetchError::Provider(format!("Invalid timestamp in weather data: {ts}")))
}
