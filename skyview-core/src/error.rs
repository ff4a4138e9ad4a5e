//! Classified failures surfaced by acquisition and location resolution.

use std::fmt;

use thiserror::Error;

/// Which acquisition call failed. Used as the message prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOp {
    Current,
    Forecast,
}

impl fmt::Display for FetchOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchOp::Current => f.write_str("weather data"),
            FetchOp::Forecast => f.write_str("forecast data"),
        }
    }
}

/// Provider-side failure classification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("No API key configured. Please set up your OpenWeatherMap API key.")]
    MissingCredential,

    #[error("Invalid API key. Please check your OpenWeatherMap API key.")]
    InvalidCredential,

    #[error("API rate limit exceeded. Please try again later or use your own API key.")]
    RateLimited,

    /// Not found, bad query, server error, unreachable provider or malformed payload.
    #[error("{0}")]
    Provider(String),
}

/// Platform location failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("Geolocation is not supported on this device")]
    Unsupported,

    #[error("Location access denied. Please enable location services.")]
    PermissionDenied,

    #[error("Location information is unavailable.")]
    Unavailable,

    #[error("The request to get user location timed out.")]
    Timeout,

    #[error("Unable to get your location")]
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WeatherError {
    #[error("Failed to fetch {op}: {source}")]
    Fetch {
        op: FetchOp,
        #[source]
        source: FetchError,
    },

    #[error(transparent)]
    Location(#[from] LocationError),
}

/// Flat view of [`WeatherError`] for callers that only branch on the cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MissingCredential,
    InvalidCredential,
    RateLimited,
    Provider,
    LocationUnsupported,
    LocationPermissionDenied,
    LocationUnavailable,
    LocationTimeout,
    LocationOther,
}

impl WeatherError {
    pub fn fetch(op: FetchOp, source: FetchError) -> Self {
        WeatherError::Fetch { op, source }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            WeatherError::Fetch { source, .. } => match source {
                FetchError::MissingCredential => ErrorKind::MissingCredential,
                FetchError::InvalidCredential => ErrorKind::InvalidCredential,
                FetchError::RateLimited => ErrorKind::RateLimited,
                FetchError::Provider(_) => ErrorKind::Provider,
            },
            WeatherError::Location(err) => match err {
                LocationError::Unsupported => ErrorKind::LocationUnsupported,
                LocationError::PermissionDenied => ErrorKind::LocationPermissionDenied,
                LocationError::Unavailable => ErrorKind::LocationUnavailable,
                LocationError::Timeout => ErrorKind::LocationTimeout,
                LocationError::Other => ErrorKind::LocationOther,
            },
        }
    }

    /// Display-ready message for the presentation layer.
    pub fn user_message(&self) -> String {
        self.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_errors_carry_operation_prefix() {
        let err = WeatherError::fetch(FetchOp::Current, FetchError::RateLimited);
        assert!(err.user_message().starts_with("Failed to fetch weather data: "));
        assert!(err.user_message().contains("rate limit"));

        let err = WeatherError::fetch(FetchOp::Forecast, FetchError::Provider("city not found".into()));
        assert_eq!(err.user_message(), "Failed to fetch forecast data: city not found");
    }

    #[test]
    fn location_errors_are_not_prefixed() {
        let err = WeatherError::from(LocationError::Timeout);
        assert_eq!(err.user_message(), "The request to get user location timed out.");
        assert_eq!(err.kind(), ErrorKind::LocationTimeout);
    }

    #[test]
    fn kind_maps_every_fetch_cause() {
        let cases = [
            (FetchError::MissingCredential, ErrorKind::MissingCredential),
            (FetchError::InvalidCredential, ErrorKind::InvalidCredential),
            (FetchError::RateLimited, ErrorKind::RateLimited),
            (FetchError::Provider("x".into()), ErrorKind::Provider),
        ];

        for (source, expected) in cases {
            assert_eq!(WeatherError::fetch(FetchOp::Current, source).kind(), expected);
        }
    }
}
