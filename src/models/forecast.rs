//! Raw grid forecast items and the per-day summary built from them

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Forecast variable carried by a raw item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForecastCategory {
    /// Hourly temperature (°C), wire code `TMP`
    Temperature,
    /// Wind speed (m/s), wire code `WSD`
    WindSpeed,
    /// Hourly precipitation amount, wire code `PCP`
    Precipitation,
    /// Any other category the provider publishes
    Other(String),
}

impl ForecastCategory {
    /// Map a provider category code to a category
    #[must_use]
    pub fn from_code(code: &str) -> Self {
        match code {
            "TMP" => Self::Temperature,
            "WSD" => Self::WindSpeed,
            "PCP" => Self::Precipitation,
            other => Self::Other(other.to_string()),
        }
    }
}

/// One value of the provider's time series
#[derive(Debug, Clone, PartialEq)]
pub struct RawForecastItem {
    /// Publication date, `YYYYMMDD`
    pub issue_date: String,
    /// Publication time, `HHmm`
    pub issue_time: String,
    /// Date the value applies to, `YYYYMMDD`
    pub target_date: String,
    /// Time the value applies to, `HHmm`
    pub target_time: String,
    pub category: ForecastCategory,
    /// Numeric text, or a sentinel such as `강수없음`
    pub value: String,
}

impl RawForecastItem {
    /// Parsed target date, `None` if the provider sent something malformed
    #[must_use]
    pub fn target_naive_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.target_date, "%Y%m%d").ok()
    }
}

/// Summarized forecast for one calendar day
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DailyForecast {
    /// Calendar date, serialized as `YYYY-MM-DD`
    pub date: NaiveDate,
    /// Month of `date`, 1-12
    pub month: u32,
    /// Mean temperature in Celsius, rounded
    pub temperature_c: i32,
    /// Total precipitation in mm, one decimal
    pub precipitation_mm: f64,
    /// Mean wind speed in m/s, one decimal
    pub wind_speed_ms: f64,
    /// District the forecast was resolved for
    pub district_name: String,
}
