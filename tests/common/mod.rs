#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};

use airgrid::models::ForecastCategory;
use airgrid::providers::{AirQualityProvider, ForecastProvider, GeocodingProvider};
use airgrid::{
    AirQualityReading, Cache, Collaborators, Coordinate, Facility, FixedClock, ForecastError,
    ForecastService, GridCell, InMemoryFacilityStore, RawForecastItem, Result, TemporalWindow,
};

/// 2024-07-09 13:45 local, so the 11:00 slot is current
pub fn fixed_now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 7, 9)
        .unwrap()
        .and_hms_opt(13, 45, 0)
        .unwrap()
}

pub fn item(target_date: &str, target_time: &str, code: &str, value: &str) -> RawForecastItem {
    RawForecastItem {
        issue_date: "20240709".to_string(),
        issue_time: "1100".to_string(),
        target_date: target_date.to_string(),
        target_time: target_time.to_string(),
        category: ForecastCategory::from_code(code),
        value: value.to_string(),
    }
}

/// Items for 2024-07-10 (two readings each) and 2024-07-11 (temperature only)
pub fn sample_items() -> Vec<RawForecastItem> {
    vec![
        item("20240710", "0900", "TMP", "24"),
        item("20240710", "1500", "TMP", "26"),
        item("20240710", "0900", "PCP", "1.0mm"),
        item("20240710", "1500", "PCP", "강수없음"),
        item("20240710", "0900", "WSD", "1.0"),
        item("20240710", "1500", "WSD", "2.6"),
        item("20240710", "0900", "SKY", "3"),
        item("20240711", "0900", "TMP", "20"),
    ]
}

#[derive(Default)]
pub struct FakeForecast {
    pub items: Mutex<Vec<RawForecastItem>>,
    pub calls: AtomicUsize,
    pub fail: AtomicBool,
    pub delay: Option<Duration>,
    pub last_request: Mutex<Option<(GridCell, TemporalWindow)>>,
}

impl FakeForecast {
    pub fn with_items(items: Vec<RawForecastItem>) -> Self {
        Self {
            items: Mutex::new(items),
            ..Self::default()
        }
    }

    pub fn slow(items: Vec<RawForecastItem>, delay: Duration) -> Self {
        Self {
            items: Mutex::new(items),
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ForecastProvider for FakeForecast {
    async fn fetch_grid_forecast(
        &self,
        cell: GridCell,
        window: &TemporalWindow,
    ) -> Result<Vec<RawForecastItem>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some((cell, *window));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(ForecastError::provider("kma", "03", "NO_DATA"));
        }
        Ok(self.items.lock().unwrap().clone())
    }
}

pub struct FakeGeocoder {
    pub district: Option<String>,
    pub calls: AtomicUsize,
}

impl FakeGeocoder {
    pub fn resolving(district: &str) -> Self {
        Self {
            district: Some(district.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            district: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GeocodingProvider for FakeGeocoder {
    async fn reverse_geocode(&self, coordinate: Coordinate) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.district.clone().ok_or(ForecastError::NoAddressFound {
            latitude: coordinate.latitude,
            longitude: coordinate.longitude,
        })
    }
}

#[derive(Default)]
pub struct FakeAirQuality {
    pub pm10: f64,
    pub no_data: bool,
    pub requested: Mutex<Vec<u32>>,
}

impl FakeAirQuality {
    pub fn with_pm10(pm10: f64) -> Self {
        Self {
            pm10,
            ..Self::default()
        }
    }

    pub fn requested(&self) -> Vec<u32> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl AirQualityProvider for FakeAirQuality {
    async fn fetch_air_quality(&self, station_code: u32) -> Result<AirQualityReading> {
        self.requested.lock().unwrap().push(station_code);
        if self.no_data {
            return Err(ForecastError::NoDataForStation { station_code });
        }
        Ok(AirQualityReading {
            station_name: format!("station {station_code}"),
            pm10: self.pm10,
            pm25: 12.0,
            ozone: 0.03,
            carbon_monoxide: 0.4,
            nitrogen_dioxide: 0.02,
            measured_at: fixed_now(),
            provider_grade: None,
        })
    }
}

pub fn coordinate(latitude: f64, longitude: f64) -> Coordinate {
    Coordinate::new(latitude, longitude).unwrap()
}

/// A daycare at (37.50, 127.00) with one station about 0.8 km north and
/// one about 3.2 km south; the far station is listed first.
pub fn sample_store() -> InMemoryFacilityStore {
    InMemoryFacilityStore::new(
        vec![
            Facility::station("station-2", "먼구", "far", coordinate(37.4712, 127.00), 2),
            Facility::station("station-1", "가까운구", "near", coordinate(37.5072, 127.00), 1),
        ],
        vec![
            Facility::service_point("dc-1", "Sunshine Daycare", "서울", coordinate(37.50, 127.00)),
            Facility::service_point("dc-2", "Sunflower Daycare", "서울", coordinate(37.60, 127.00)),
        ],
    )
    .unwrap()
}

pub struct Harness {
    pub service: ForecastService,
    pub forecast: Arc<FakeForecast>,
    pub geocoder: Arc<FakeGeocoder>,
    pub air_quality: Arc<FakeAirQuality>,
    pub cache: Cache,
}

pub fn harness_with(forecast: FakeForecast, air_quality: FakeAirQuality) -> Harness {
    harness_from(forecast, FakeGeocoder::resolving("중구"), air_quality)
}

pub fn harness_from(
    forecast: FakeForecast,
    geocoder: FakeGeocoder,
    air_quality: FakeAirQuality,
) -> Harness {
    let forecast = Arc::new(forecast);
    let geocoder = Arc::new(geocoder);
    let air_quality = Arc::new(air_quality);
    let cache = Cache::new();
    let service = ForecastService::new(
        Collaborators {
            forecast: forecast.clone(),
            geocoder: geocoder.clone(),
            air_quality: air_quality.clone(),
            store: Arc::new(sample_store()),
        },
        cache.clone(),
    )
    .with_clock(Arc::new(FixedClock(fixed_now())));

    Harness {
        service,
        forecast,
        geocoder,
        air_quality,
        cache,
    }
}

pub fn harness() -> Harness {
    harness_with(
        FakeForecast::with_items(sample_items()),
        FakeAirQuality::with_pm10(35.0),
    )
}
