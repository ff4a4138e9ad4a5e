//! Device location with a bounded wait.
//!
//! The platform capability sits behind [`LocationSource`]. [`LocationResolver`]
//! owns the timeout, the cached-position window and the mapping of platform
//! failures onto [`LocationError`].

use std::{
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    config::{DEFAULT_LOCATION_TIMEOUT_MS, DEFAULT_MAX_CACHED_AGE_MS},
    error::LocationError,
    model::Coordinates,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocationOptions {
    /// Upper bound before failing with [`LocationError::Timeout`].
    pub timeout: Duration,
    /// A previously resolved position younger than this is reused.
    pub max_cached_age: Duration,
}

impl Default for LocationOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_LOCATION_TIMEOUT_MS),
            max_cached_age: Duration::from_millis(DEFAULT_MAX_CACHED_AGE_MS),
        }
    }
}

/// Failure as reported by the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PositionError {
    PermissionDenied,
    PositionUnavailable,
    Timeout,
    /// Any other platform code.
    Other(i32),
}

impl PositionError {
    /// W3C Geolocation codes: 1, 2, 3.
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => PositionError::PermissionDenied,
            2 => PositionError::PositionUnavailable,
            3 => PositionError::Timeout,
            other => PositionError::Other(other),
        }
    }
}

impl From<PositionError> for LocationError {
    fn from(err: PositionError) -> Self {
        match err {
            PositionError::PermissionDenied => LocationError::PermissionDenied,
            PositionError::PositionUnavailable => LocationError::Unavailable,
            PositionError::Timeout => LocationError::Timeout,
            PositionError::Other(_) => LocationError::Other,
        }
    }
}

#[async_trait]
pub trait LocationSource: Send + Sync + std::fmt::Debug {
    async fn current_position(&self) -> Result<Coordinates, PositionError>;
}

#[derive(Debug)]
pub struct LocationResolver {
    source: Option<Arc<dyn LocationSource>>,
    options: LocationOptions,
    last_fix: Mutex<Option<(Instant, Coordinates)>>,
}

impl LocationResolver {
    /// `None` means the host has no location capability at all.
    pub fn new(source: Option<Arc<dyn LocationSource>>, options: LocationOptions) -> Self {
        Self {
            source,
            options,
            last_fix: Mutex::new(None),
        }
    }

    pub fn unsupported() -> Self {
        Self::new(None, LocationOptions::default())
    }

    pub fn options(&self) -> LocationOptions {
        self.options
    }

    pub async fn resolve(&self) -> Result<Coordinates, LocationError> {
        let source = self.source.as_ref().ok_or(LocationError::Unsupported)?;

        if let Some(coords) = self.cached() {
            tracing::debug!(?coords, "Using cached location");
            return Ok(coords);
        }

        tracing::info!("Requesting user location...");

        let coords = match tokio::time::timeout(self.options.timeout, source.current_position()).await {
            Ok(Ok(coords)) => coords,
            Ok(Err(err)) => {
                tracing::error!(?err, "Geolocation error");
                return Err(err.into());
            }
            Err(_) => {
                tracing::error!(timeout = ?self.options.timeout, "Geolocation timed out");
                return Err(LocationError::Timeout);
            }
        };

        tracing::info!(lat = coords.latitude, lon = coords.longitude, "Location received");
        if let Ok(mut last) = self.last_fix.lock() {
            *last = Some((Instant::now(), coords));
        }

        Ok(coords)
    }

    fn cached(&self) -> Option<Coordinates> {
        let last = self.last_fix.lock().ok()?;
        let (at, coords) = (*last)?;
        (at.elapsed() <= self.options.max_cached_age).then_some(coords)
    }
}

/// A position supplied up front, e.g. from command-line flags.
#[derive(Debug, Clone, Copy)]
pub struct FixedLocation(pub Coordinates);

#[async_trait]
impl LocationSource for FixedLocation {
    async fn current_position(&self) -> Result<Coordinates, PositionError> {
        Ok(self.0)
    }
}

const IP_LOCATION_URL: &str = "http://ip-api.com/json";

#[derive(Debug, Deserialize)]
struct IpLocationResponse {
    status: String,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lon: Option<f64>,
}

/// Approximate position from the public IP address, for hosts without a
/// native positioning service.
#[derive(Debug, Clone)]
pub struct IpLocationSource {
    url: String,
    http: Client,
}

impl IpLocationSource {
    pub fn new() -> Self {
        Self::with_url(IP_LOCATION_URL)
    }

    pub fn with_url(url: &str) -> Self {
        Self {
            url: url.to_string(),
            http: Client::new(),
        }
    }
}

impl Default for IpLocationSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LocationSource for IpLocationSource {
    async fn current_position(&self) -> Result<Coordinates, PositionError> {
        let res = self.http.get(&self.url).send().await.map_err(|e| {
            tracing::debug!("IP location request failed: {}", e);
            if e.is_timeout() {
                PositionError::Timeout
            } else {
                PositionError::PositionUnavailable
            }
        })?;

        let status = res.status();
        if status == reqwest::StatusCode::FORBIDDEN {
            return Err(PositionError::PermissionDenied);
        }
        if !status.is_success() {
            tracing::debug!("IP location returned status {}", status);
            return Err(PositionError::PositionUnavailable);
        }

        let body: IpLocationResponse = res.json().await.map_err(|e| {
            tracing::debug!("IP location parse error: {}", e);
            PositionError::PositionUnavailable
        })?;

        match (body.status.as_str(), body.lat, body.lon) {
            ("success", Some(lat), Some(lon)) => Ok(Coordinates::new(lat, lon)),
            _ => Err(PositionError::PositionUnavailable),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Debug)]
    struct Scripted {
        result: Result<Coordinates, PositionError>,
        delay: Duration,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn new(result: Result<Coordinates, PositionError>) -> Self {
            Self { result, delay: Duration::ZERO, calls: AtomicUsize::new(0) }
        }

        fn slow(delay: Duration) -> Self {
            Self { delay, ..Self::new(Ok(Coordinates::new(0.0, 0.0))) }
        }
    }

    #[async_trait]
    impl LocationSource for Scripted {
        async fn current_position(&self) -> Result<Coordinates, PositionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.result.clone()
        }
    }

    fn resolver(source: Arc<dyn LocationSource>, options: LocationOptions) -> LocationResolver {
        LocationResolver::new(Some(source), options)
    }

    #[tokio::test]
    async fn no_capability_is_unsupported() {
        let err = LocationResolver::unsupported().resolve().await.unwrap_err();
        assert_eq!(err, LocationError::Unsupported);
    }

    #[tokio::test]
    async fn returns_platform_position() {
        let coords = Coordinates::new(51.5, -0.12);
        let r = resolver(Arc::new(FixedLocation(coords)), LocationOptions::default());
        assert_eq!(r.resolve().await.unwrap(), coords);
    }

    #[tokio::test]
    async fn platform_failures_are_classified() {
        let cases = [
            (PositionError::PermissionDenied, LocationError::PermissionDenied),
            (PositionError::PositionUnavailable, LocationError::Unavailable),
            (PositionError::Timeout, LocationError::Timeout),
            (PositionError::Other(42), LocationError::Other),
        ];

        for (platform, expected) in cases {
            let r = resolver(Arc::new(Scripted::new(Err(platform))), LocationOptions::default());
            assert_eq!(r.resolve().await.unwrap_err(), expected);
        }
    }

    #[tokio::test]
    async fn slow_platform_times_out() {
        let options = LocationOptions {
            timeout: Duration::from_millis(20),
            max_cached_age: Duration::ZERO,
        };
        let r = resolver(Arc::new(Scripted::slow(Duration::from_secs(5))), options);

        let err = r.resolve().await.unwrap_err();
        assert_eq!(err, LocationError::Timeout);
        assert_eq!(err.to_string(), "The request to get user location timed out.");
    }

    #[tokio::test]
    async fn recent_fix_is_reused() {
        let source = Arc::new(Scripted::new(Ok(Coordinates::new(1.0, 2.0))));
        let r = resolver(source.clone(), LocationOptions::default());

        r.resolve().await.unwrap();
        r.resolve().await.unwrap();
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn zero_cache_age_always_asks_platform() {
        let source = Arc::new(Scripted::new(Ok(Coordinates::new(1.0, 2.0))));
        let options = LocationOptions {
            max_cached_age: Duration::ZERO,
            ..LocationOptions::default()
        };
        let r = resolver(source.clone(), options);

        r.resolve().await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        r.resolve().await.unwrap();
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn codes_follow_geolocation_api() {
        assert_eq!(PositionError::from_code(1), PositionError::PermissionDenied);
        assert_eq!(PositionError::from_code(2), PositionError::PositionUnavailable);
        assert_eq!(PositionError::from_code(3), PositionError::Timeout);
        assert_eq!(PositionError::from_code(7), PositionError::Other(7));
    }

    #[tokio::test]
    async fn ip_source_parses_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "success",
                "lat": 48.8566,
                "lon": 2.3522,
                "city": "Paris"
            })))
            .mount(&server)
            .await;

        let coords = IpLocationSource::with_url(&server.uri())
            .current_position()
            .await
            .unwrap();
        assert_eq!(coords, Coordinates::new(48.8566, 2.3522));
    }

    #[tokio::test]
    async fn ip_source_failure_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "fail",
                "message": "private range"
            })))
            .mount(&server)
            .await;

        let err = IpLocationSource::with_url(&server.uri())
            .current_position()
            .await
            .unwrap_err();
        assert_eq!(err, PositionError::PositionUnavailable);
    }
}
