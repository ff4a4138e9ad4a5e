use crate::{
    error::{FetchError, FetchOp, WeatherError},
    location::LocationResolver,
    model::WeatherReport,
    provider::openweather::OpenWeatherClient,
};

const NO_PLACE_NAME: &str = "No named place found for your location";

/// The two entry points the presentation layer drives.
#[derive(Debug, Clone)]
pub struct WeatherService {
    client: OpenWeatherClient,
}

impl WeatherService {
    pub fn new(client: OpenWeatherClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &OpenWeatherClient {
        &self.client
    }

    /// Current conditions and forecast, fetched concurrently. Either failure
    /// fails the whole report.
    pub async fn weather_for_city(&self, city: &str) -> Result<WeatherReport, WeatherError> {
        let (current, forecast) = tokio::try_join!(
            self.client.fetch_current_by_city(city),
            self.client.fetch_forecast(city),
        )?;

        Ok(WeatherReport { current, forecast })
    }

    /// Resolve the device position, then fetch by coordinates, then forecast
    /// by the city name the provider reported.
    pub async fn weather_for_location(
        &self,
        resolver: &LocationResolver,
    ) -> Result<WeatherReport, WeatherError> {
        let coords = resolver.resolve().await?;
        let current = self
            .client
            .fetch_current_by_coordinates(coords.latitude, coords.longitude)
            .await?;

        // Open water and remote points come back without a place name.
        if current.city.trim().is_empty() {
            return Err(WeatherError::fetch(
                FetchOp::Forecast,
                FetchError::Provider(NO_PLACE_NAME.to_string()),
            ));
        }

        let forecast = self.client.fetch_forecast(&current.city).await?;

        Ok(WeatherReport { current, forecast })
    }
}
