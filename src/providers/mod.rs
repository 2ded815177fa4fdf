//! External data providers
//!
//! Each upstream API sits behind a narrow async trait so the forecast service
//! can be driven by the HTTP clients in production and by fakes in tests.

use std::time::Duration;

use async_trait::async_trait;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};

use crate::Result;
use crate::models::{AirQualityReading, Coordinate, GridCell, RawForecastItem};
use crate::window::TemporalWindow;

pub mod kma;
pub mod seoul;
pub mod vworld;

pub use kma::KmaForecastClient;
pub use seoul::SeoulAirQualityClient;
pub use vworld::VWorldGeocoder;

/// Grid forecast source
#[async_trait]
pub trait ForecastProvider: Send + Sync {
    async fn fetch_grid_forecast(
        &self,
        cell: GridCell,
        window: &TemporalWindow,
    ) -> Result<Vec<RawForecastItem>>;
}

/// Coordinate to district-name lookup
#[async_trait]
pub trait GeocodingProvider: Send + Sync {
    async fn reverse_geocode(&self, coordinate: Coordinate) -> Result<String>;
}

/// Live air quality by station
#[async_trait]
pub trait AirQualityProvider: Send + Sync {
    async fn fetch_air_quality(&self, station_code: u32) -> Result<AirQualityReading>;
}

const USER_AGENT: &str = concat!("AirGrid/", env!("CARGO_PKG_VERSION"));

/// HTTP client with timeout and transient-failure retries
pub fn build_http_client(timeout: Duration, max_retries: u32) -> Result<ClientWithMiddleware> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()?;
    let retry_policy = ExponentialBackoff::builder().build_with_max_retries(max_retries);
    Ok(ClientBuilder::new(client)
        .with(RetryTransientMiddleware::new_with_policy(retry_policy))
        .build())
}
