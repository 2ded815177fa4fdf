//! Live air-quality readings and severity grading

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::DailyForecast;

/// One measurement row from the air-quality provider
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AirQualityReading {
    /// Station (district) name reported by the provider
    pub station_name: String,
    /// PM10 in µg/m³
    pub pm10: f64,
    /// PM2.5 in µg/m³
    pub pm25: f64,
    /// Ozone in ppm
    pub ozone: f64,
    /// Carbon monoxide in ppm
    pub carbon_monoxide: f64,
    /// Nitrogen dioxide in ppm
    pub nitrogen_dioxide: f64,
    /// Local measurement time
    pub measured_at: NaiveDateTime,
    /// Grade label as published by the provider, if any
    pub provider_grade: Option<String>,
}

/// PM10 severity grade
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum AirQualityGrade {
    #[serde(rename = "good")]
    Good,
    #[serde(rename = "moderate")]
    Moderate,
    #[serde(rename = "poor")]
    Poor,
    #[serde(rename = "very poor")]
    VeryPoor,
}

impl AirQualityGrade {
    /// Grade a PM10 concentration (µg/m³)
    #[must_use]
    pub fn from_pm10(pm10: f64) -> Self {
        if pm10 <= 30.0 {
            Self::Good
        } else if pm10 <= 80.0 {
            Self::Moderate
        } else if pm10 <= 150.0 {
            Self::Poor
        } else {
            Self::VeryPoor
        }
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Good => "good",
            Self::Moderate => "moderate",
            Self::Poor => "poor",
            Self::VeryPoor => "very poor",
        }
    }
}

/// Today's live reading, placed ahead of the forecasted days
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TodayReading {
    pub date: NaiveDate,
    pub district_name: String,
    pub grade: AirQualityGrade,
    pub reading: AirQualityReading,
}

impl TodayReading {
    #[must_use]
    pub fn new(date: NaiveDate, district_name: String, reading: AirQualityReading) -> Self {
        Self {
            date,
            district_name,
            grade: AirQualityGrade::from_pm10(reading.pm10),
            reading,
        }
    }
}

/// Forecast days optionally prefixed by today's live reading
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ForecastReport {
    pub today: Option<TodayReading>,
    pub days: Vec<DailyForecast>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0.0, AirQualityGrade::Good)]
    #[case(30.0, AirQualityGrade::Good)]
    #[case(30.1, AirQualityGrade::Moderate)]
    #[case(80.0, AirQualityGrade::Moderate)]
    #[case(81.0, AirQualityGrade::Poor)]
    #[case(150.0, AirQualityGrade::Poor)]
    #[case(150.5, AirQualityGrade::VeryPoor)]
    fn test_grade_thresholds(#[case] pm10: f64, #[case] expected: AirQualityGrade) {
        assert_eq!(AirQualityGrade::from_pm10(pm10), expected);
    }

    #[rstest]
    #[case(AirQualityGrade::Good)]
    #[case(AirQualityGrade::Moderate)]
    #[case(AirQualityGrade::Poor)]
    #[case(AirQualityGrade::VeryPoor)]
    fn test_label_matches_serialized_grade(#[case] grade: AirQualityGrade) {
        assert_eq!(serde_json::to_value(grade).unwrap(), grade.label());
    }
}
