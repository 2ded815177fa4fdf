//! Data models for the AirGrid resolver
//!
//! This module contains the core domain models organized by concern:
//! - Location: Geographic coordinates and grid cells
//! - Facility: Service points and monitoring stations
//! - Forecast: Raw provider items and per-day summaries
//! - Air quality: Live readings and grades

pub mod air_quality;
pub mod facility;
pub mod forecast;
pub mod location;

// Re-export all public types for convenient access
pub use air_quality::{AirQualityGrade, AirQualityReading, ForecastReport, TodayReading};
pub use facility::{Facility, FacilityKind};
pub use forecast::{DailyForecast, ForecastCategory, RawForecastItem};
pub use location::{Coordinate, GridCell};
