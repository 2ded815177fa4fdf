//! `AirGrid` - grid weather forecasts and district air quality for service points
//!
//! This library resolves a coordinate or a stored facility to the provider's
//! forecast grid, fetches and aggregates the two-day forecast, and attaches a
//! live air-quality reading from the nearest monitoring station.

pub mod aggregate;
pub mod api;
pub mod cache;
pub mod config;
pub mod distance;
pub mod error;
pub mod forecast_service;
pub mod models;
pub mod projection;
pub mod providers;
pub mod store;
pub mod web;
pub mod window;

// Re-export core types for public API
pub use cache::Cache;
pub use config::AirGridConfig;
pub use error::ForecastError;
pub use forecast_service::{Collaborators, ForecastService, NearbyStation};
pub use models::{
    AirQualityGrade, AirQualityReading, Coordinate, DailyForecast, Facility, FacilityKind,
    ForecastReport, GridCell, RawForecastItem, TodayReading,
};
pub use store::{FacilityStore, InMemoryFacilityStore};
pub use window::{Clock, FixedClock, PublicationSchedule, SystemClock, TemporalWindow};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, ForecastError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
