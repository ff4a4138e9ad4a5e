use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};

use crate::{
    config::Config,
    credential::{ApiCredential, CredentialStatus},
    error::{FetchError, FetchOp, WeatherError},
    model::{CurrentConditions, DailyForecast},
    normalize,
};

use super::{classify_failure, truncate_body};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const UNITS: &str = "metric";
const UNREACHABLE: &str = "Unable to reach the weather service";
const MALFORMED: &str = "Unexpected response from the weather service";

/// Client for the three OpenWeather calls the app needs.
///
/// Holds no mutable state; calls can run concurrently from a shared reference.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    credential: ApiCredential,
    base_url: String,
    http: Client,
}

impl OpenWeatherClient {
    pub fn new(credential: ApiCredential) -> Result<Self> {
        Self::build(credential, DEFAULT_BASE_URL, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_base_url(credential: ApiCredential, base_url: &str) -> Result<Self> {
        Self::build(credential, base_url, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::build(
            config.credential(),
            config.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL),
            config.request_timeout().unwrap_or(DEFAULT_REQUEST_TIMEOUT),
        )
    }

    fn build(credential: ApiCredential, base_url: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client for OpenWeather")?;

        match credential.status() {
            CredentialStatus::User => tracing::info!("Using user API key"),
            CredentialStatus::Demo => tracing::warn!(
                "Using demo API key - for full functionality, add your own API key"
            ),
            CredentialStatus::None => tracing::warn!("No OpenWeather API key configured"),
        }

        Ok(Self {
            credential,
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn credential_status(&self) -> CredentialStatus {
        self.credential.status()
    }

    pub fn is_using_demo_key(&self) -> bool {
        self.credential.is_demo()
    }

    pub async fn fetch_current_by_city(
        &self,
        city: &str,
    ) -> Result<CurrentConditions, WeatherError> {
        self.current_by_city(city)
            .await
            .map_err(|e| fetch_failed(FetchOp::Current, e))
    }

    pub async fn fetch_current_by_coordinates(
        &self,
        lat: f64,
        lon: f64,
    ) -> Result<CurrentConditions, WeatherError> {
        self.current_by_coordinates(lat, lon)
            .await
            .map_err(|e| fetch_failed(FetchOp::Current, e))
    }

    /// At most five entries, one per day, in provider order.
    pub async fn fetch_forecast(&self, city: &str) -> Result<Vec<DailyForecast>, WeatherError> {
        self.forecast(city)
            .await
            .map_err(|e| fetch_failed(FetchOp::Forecast, e))
    }

    async fn current_by_city(&self, city: &str) -> Result<CurrentConditions, FetchError> {
        let key = self.credential.require()?;
        let city = non_blank_city(city)?;

        let payload: OwCurrentResponse = self
            .get_json("weather", &[("q", city.to_string())], key, || {
                format!("Weather data not found for {city}")
            })
            .await?;

        tracing::debug!(city = %payload.name, "Current weather data received");
        normalize::current_conditions(&payload)
    }

    async fn current_by_coordinates(
        &self,
        lat: f64,
        lon: f64,
    ) -> Result<CurrentConditions, FetchError> {
        let key = self.credential.require()?;

        let payload: OwCurrentResponse = self
            .get_json(
                "weather",
                &[("lat", lat.to_string()), ("lon", lon.to_string())],
                key,
                || "Unable to fetch weather data for your location".to_string(),
            )
            .await?;

        tracing::debug!(city = %payload.name, "Weather by coordinates data received");
        normalize::current_conditions(&payload)
    }

    async fn forecast(&self, city: &str) -> Result<Vec<DailyForecast>, FetchError> {
        let key = self.credential.require()?;
        let city = non_blank_city(city)?;

        let payload: OwForecastResponse = self
            .get_json("forecast", &[("q", city.to_string())], key, || {
                "Forecast data not available".to_string()
            })
            .await?;

        tracing::debug!(readings = payload.list.len(), "Forecast data received");
        normalize::daily_forecasts(&payload)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
        api_key: &str,
        not_found: impl FnOnce() -> String,
    ) -> Result<T, FetchError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        tracing::debug!(%url, ?query, "Fetching from OpenWeather");

        let res = self
            .http
            .get(&url)
            .query(query)
            .query(&[("appid", api_key), ("units", UNITS)])
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e.without_url(), %url, "OpenWeather request failed");
                FetchError::Provider(UNREACHABLE.to_string())
            })?;

        let status = res.status();
        let body = res.text().await.map_err(|e| {
            tracing::warn!(error = %e.without_url(), %url, "Failed to read OpenWeather response body");
            FetchError::Provider(UNREACHABLE.to_string())
        })?;

        if !status.is_success() {
            tracing::warn!(%status, body = %truncate_body(&body), %url, "OpenWeather rejected request");
            return Err(classify_failure(status, &body, not_found()));
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::warn!(error = %e, body = %truncate_body(&body), "Failed to parse OpenWeather JSON");
            FetchError::Provider(MALFORMED.to_string())
        })
    }
}

fn fetch_failed(op: FetchOp, err: FetchError) -> WeatherError {
    tracing::error!(%op, error = %err, "Weather fetch failed");
    WeatherError::fetch(op, err)
}

fn non_blank_city(city: &str) -> Result<&str, FetchError> {
    let trimmed = city.trim();
    if trimmed.is_empty() {
        return Err(FetchError::Provider("Please enter a city name".to_string()));
    }
    Ok(trimmed)
}

#[derive(Debug, Deserialize)]
pub(crate) struct OwMain {
    pub temp: f64,
    pub feels_like: f64,
    pub humidity: u8,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OwWeather {
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct OwWind {
    #[serde(default)]
    pub speed: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OwSys {
    #[serde(default)]
    pub country: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OwCurrentResponse {
    #[serde(default)]
    pub name: String,
    pub dt: i64,
    #[serde(default)]
    pub sys: Option<OwSys>,
    pub main: OwMain,
    #[serde(default)]
    pub weather: Vec<OwWeather>,
    #[serde(default)]
    pub wind: OwWind,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OwCity {
    /// Offset from UTC in seconds.
    #[serde(default)]
    pub timezone: i32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OwForecastMain {
    pub temp: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OwForecastEntry {
    pub dt: i64,
    pub main: OwForecastMain,
    #[serde(default)]
    pub weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OwForecastResponse {
    #[serde(default)]
    pub city: Option<OwCity>,
    pub list: Vec<OwForecastEntry>,
}
