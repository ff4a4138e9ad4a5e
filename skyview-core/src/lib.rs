//! Core library for the `skyview` weather viewer.
//!
//! This crate defines:
//! - Configuration & credential resolution
//! - The OpenWeather client (current conditions, forecast) and its error classification
//! - Normalization of provider payloads into stable records
//! - Device location resolution with a bounded wait
//!
//! It is used by `skyview-cli`, but any front end can drive [`WeatherService`].

pub mod config;
pub mod credential;
pub mod error;
pub mod location;
pub mod model;
pub mod normalize;
pub mod provider;
pub mod service;

pub use config::Config;
pub use credential::{ApiCredential, CredentialStatus};
pub use error::{ErrorKind, FetchError, FetchOp, LocationError, WeatherError};
pub use location::{
    FixedLocation, IpLocationSource, LocationOptions, LocationResolver, LocationSource,
    PositionError,
};
pub use model::{Coordinates, CurrentConditions, DailyForecast, RawReading, WeatherReport};
pub use normalize::map_icon;
pub use provider::openweather::OpenWeatherClient;
pub use service::WeatherService;
