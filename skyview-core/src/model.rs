use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Current conditions for one location, normalized from a provider payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub city: String,
    /// ISO alpha-2 code as supplied by the provider; empty when absent.
    pub country: String,
    pub temperature_c: i32,
    pub feels_like_c: i32,
    /// Relative humidity, 0..=100.
    pub humidity_pct: u8,
    pub description: String,
    pub wind_speed_mps: f64,
    pub icon: String,
    pub observed_at: DateTime<Utc>,
}

/// One representative entry per calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
    pub date: NaiveDate,
    pub temperature_c: i32,
    pub description: String,
    pub icon: String,
}

/// A single provider data point, consumed during normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct RawReading {
    /// Epoch seconds.
    pub timestamp: i64,
    pub temperature_c: f64,
    pub icon_code: String,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// What the presentation layer receives from either entry point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub current: CurrentConditions,
    pub forecast: Vec<DailyForecast>,
}
