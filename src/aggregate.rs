//! Reduce the provider's hourly series into per-day forecasts

use std::collections::BTreeMap;

use chrono::{Datelike, Days, NaiveDate};
use tracing::debug;

use crate::models::{DailyForecast, ForecastCategory, RawForecastItem};

/// The two calendar days forecast for, relative to `today`
#[must_use]
pub fn target_dates(today: NaiveDate) -> [NaiveDate; 2] {
    [
        today.checked_add_days(Days::new(1)).unwrap_or(today),
        today.checked_add_days(Days::new(2)).unwrap_or(today),
    ]
}

#[derive(Debug, Default)]
struct DayReadings {
    temperatures: Vec<f64>,
    winds: Vec<f64>,
    precipitation: Vec<f64>,
}

/// Aggregate raw items into one forecast per requested date.
///
/// Dates without a single temperature reading are treated as unpublished and
/// left out, whatever else they carry. Output is ascending by date.
#[must_use]
pub fn aggregate(
    items: &[RawForecastItem],
    target_dates: &[NaiveDate],
    district_name: &str,
) -> Vec<DailyForecast> {
    let mut days: BTreeMap<NaiveDate, DayReadings> = target_dates
        .iter()
        .map(|d| (*d, DayReadings::default()))
        .collect();

    for item in items {
        let Some(readings) = item.target_naive_date().and_then(|d| days.get_mut(&d)) else {
            continue;
        };
        match item.category {
            ForecastCategory::Temperature => match item.value.trim().parse::<f64>() {
                Ok(v) => readings.temperatures.push(v),
                Err(_) => debug!("Skipping unparseable temperature '{}'", item.value),
            },
            ForecastCategory::WindSpeed => match item.value.trim().parse::<f64>() {
                Ok(v) => readings.winds.push(v),
                Err(_) => debug!("Skipping unparseable wind speed '{}'", item.value),
            },
            ForecastCategory::Precipitation => {
                readings.precipitation.push(parse_precipitation(&item.value));
            }
            ForecastCategory::Other(_) => {}
        }
    }

    days.into_iter()
        .filter(|(date, r)| {
            if r.temperatures.is_empty() {
                debug!("No temperature readings for {}, dropping day", date);
            }
            !r.temperatures.is_empty()
        })
        .map(|(date, r)| DailyForecast {
            date,
            month: date.month(),
            temperature_c: round_half_up(mean(&r.temperatures)) as i32,
            precipitation_mm: round_one_decimal(total(&r.precipitation)),
            wind_speed_ms: if r.winds.is_empty() {
                0.0
            } else {
                round_one_decimal(mean(&r.winds))
            },
            district_name: district_name.to_string(),
        })
        .collect()
}

/// Precipitation text to millimetres.
///
/// The first run of digits and dots is the amount (`1.0mm`, `1mm 미만`,
/// `30.0~50.0mm`); text without one, such as `강수없음`, is zero.
#[must_use]
pub fn parse_precipitation(value: &str) -> f64 {
    let number: String = value
        .chars()
        .skip_while(|c| !(c.is_ascii_digit() || *c == '.'))
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    number.parse::<f64>().ok().filter(|v| v.is_finite()).unwrap_or(0.0)
}

// Folds from +0.0; float `Sum` starts at -0.0
fn total(values: &[f64]) -> f64 {
    values.iter().fold(0.0, |acc, v| acc + v)
}

fn mean(values: &[f64]) -> f64 {
    total(values) / values.len() as f64
}

fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
