//! Error types and handling for the `AirGrid` resolver

use thiserror::Error;

/// Main error type for the `AirGrid` resolver
#[derive(Error, Debug)]
pub enum ForecastError {
    /// Latitude or longitude outside the valid range
    #[error("Invalid coordinate: latitude={latitude}, longitude={longitude}")]
    InvalidCoordinate { latitude: f64, longitude: f64 },

    /// No facility is stored under the requested identifier
    #[error("Facility not found: {id}")]
    FacilityNotFound { id: String },

    /// A nearest-station search ran over an empty station list
    #[error("No stations registered")]
    EmptyCandidateSet,

    /// Reverse geocoding returned no usable address
    #[error("No address found for ({latitude}, {longitude})")]
    NoAddressFound { latitude: f64, longitude: f64 },

    /// The air-quality provider returned no measurement row
    #[error("No air-quality data for station {station_code}")]
    NoDataForStation { station_code: u32 },

    /// An upstream provider call failed or returned a non-success status
    #[error("{provider} error [{code}]: {message}")]
    Provider {
        provider: &'static str,
        code: String,
        message: String,
    },

    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// General application errors
    #[error("Application error: {message}")]
    General { message: String },
}

impl ForecastError {
    /// Create a new provider error
    pub fn provider<C: Into<String>, M: Into<String>>(
        provider: &'static str,
        code: C,
        message: M,
    ) -> Self {
        Self::Provider {
            provider,
            code: code.into(),
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new general error
    pub fn general<S: Into<String>>(message: S) -> Self {
        Self::General {
            message: message.into(),
        }
    }

    /// Create a facility-not-found error
    pub fn facility_not_found<S: Into<String>>(id: S) -> Self {
        Self::FacilityNotFound { id: id.into() }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            ForecastError::InvalidCoordinate { .. } => {
                "Invalid latitude or longitude.".to_string()
            }
            ForecastError::FacilityNotFound { id } => format!("Facility '{id}' was not found."),
            ForecastError::EmptyCandidateSet => {
                "No monitoring stations are registered.".to_string()
            }
            ForecastError::NoAddressFound { .. } => {
                "Could not determine the district for these coordinates.".to_string()
            }
            ForecastError::NoDataForStation { .. } => {
                "Air quality data is not available for the requested station.".to_string()
            }
            ForecastError::Provider { message, .. } => message.clone(),
            ForecastError::Config { .. } => {
                "Configuration error. Please check your config file and API keys.".to_string()
            }
            ForecastError::General { message } => message.clone(),
        }
    }
}

impl From<reqwest_middleware::Error> for ForecastError {
    fn from(err: reqwest_middleware::Error) -> Self {
        ForecastError::provider("http", "TRANSPORT", err.to_string())
    }
}

impl From<reqwest::Error> for ForecastError {
    fn from(err: reqwest::Error) -> Self {
        let code = err
            .status()
            .map_or_else(|| "TRANSPORT".to_string(), |s| s.as_u16().to_string());
        ForecastError::provider("http", code, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = ForecastError::provider("kma", "03", "NO_DATA");
        assert!(matches!(err, ForecastError::Provider { provider: "kma", .. }));

        let err = ForecastError::facility_not_found("abc");
        assert!(matches!(err, ForecastError::FacilityNotFound { ref id } if id == "abc"));
    }

    #[test]
    fn test_display_keeps_upstream_message() {
        let err = ForecastError::provider("seoul", "INFO-200", "해당하는 데이터가 없습니다.");
        assert_eq!(
            err.to_string(),
            "seoul error [INFO-200]: 해당하는 데이터가 없습니다."
        );
        assert_eq!(err.user_message(), "해당하는 데이터가 없습니다.");
    }

    #[test]
    fn test_user_messages() {
        let err = ForecastError::config("bad");
        assert!(err.user_message().contains("Configuration error"));

        let err = ForecastError::NoDataForStation { station_code: 111121 };
        assert!(err.user_message().contains("not available"));
    }
}
