//! Coordinate model and forecast grid cell

use serde::{Deserialize, Serialize};

use crate::{ForecastError, Result};

/// Geographic coordinate in decimal degrees
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Coordinate {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
}

impl Coordinate {
    /// Create a coordinate, rejecting out-of-range values
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        let valid = (-90.0..=90.0).contains(&latitude) && (-180.0..=180.0).contains(&longitude);
        if !valid {
            return Err(ForecastError::InvalidCoordinate {
                latitude,
                longitude,
            });
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Coordinate rounded to micro-degrees.
    ///
    /// Both the grid projection and the cache key are derived from this value,
    /// so two requests that differ only below the sixth decimal share a cell
    /// and a cache entry.
    #[must_use]
    pub fn normalized(&self) -> Self {
        let (lat, lon) = self.micro_degrees();
        Self {
            latitude: lat as f64 / 1_000_000.0,
            longitude: lon as f64 / 1_000_000.0,
        }
    }

    /// Latitude and longitude as integer micro-degrees
    #[must_use]
    pub fn micro_degrees(&self) -> (i64, i64) {
        // Valid coordinates stay far inside i64 after scaling
        let lat = (self.latitude * 1_000_000.0).round() as i64;
        let lon = (self.longitude * 1_000_000.0).round() as i64;
        (lat, lon)
    }

    /// Generate cache key for a forecast at this coordinate
    #[must_use]
    pub fn cache_key(&self) -> String {
        let (lat, lon) = self.micro_degrees();
        format!("forecast:coord:{lat}:{lon}")
    }

    /// Format coordinate as a display string
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// Discrete cell index in the forecast provider's planar grid
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridCell {
    pub x: i32,
    pub y: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_validation() {
        assert!(Coordinate::new(37.5665, 126.978).is_ok());
        assert!(Coordinate::new(90.0, -180.0).is_ok());
        assert!(matches!(
            Coordinate::new(90.5, 0.0),
            Err(ForecastError::InvalidCoordinate { .. })
        ));
        assert!(Coordinate::new(0.0, 181.0).is_err());
        assert!(Coordinate::new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn test_cache_key_ignores_float_noise() {
        let a = Coordinate::new(37.5, 127.0).unwrap();
        let b = Coordinate::new(37.500_000_000_1, 126.999_999_999_9).unwrap();
        assert_eq!(a.cache_key(), b.cache_key());
        assert_eq!(a.cache_key(), "forecast:coord:37500000:127000000");
    }

    #[test]
    fn test_normalized_rounds_to_micro_degrees() {
        let c = Coordinate::new(37.123_456_7, 127.000_000_4).unwrap();
        let n = c.normalized();
        assert_eq!(n.micro_degrees(), (37_123_457, 127_000_000));
        assert_eq!(n.cache_key(), c.cache_key());
    }
}
