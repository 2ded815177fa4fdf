//! Forecast resolution service
//!
//! Combines projection, window selection, the upstream providers and the
//! aggregator into the two forecast entry points, with results memoized in
//! the injected [`Cache`].

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::aggregate::{aggregate, target_dates};
use crate::cache::{Cache, DEFAULT_FORECAST_TTL};
use crate::distance::{format_distance, nearest, top_n};
use crate::models::{Coordinate, DailyForecast, Facility, ForecastReport, TodayReading};
use crate::projection::project;
use crate::providers::{AirQualityProvider, ForecastProvider, GeocodingProvider};
use crate::store::FacilityStore;
use crate::window::{Clock, PublicationSchedule, SystemClock};
use crate::{ForecastError, Result};

/// How many stations the nearby-station listing returns
pub const NEARBY_STATION_COUNT: usize = 5;
/// How many facilities a name search returns
pub const SEARCH_RESULT_LIMIT: usize = 5;

/// Upstream systems the service depends on
#[derive(Clone)]
pub struct Collaborators {
    pub forecast: Arc<dyn ForecastProvider>,
    pub geocoder: Arc<dyn GeocodingProvider>,
    pub air_quality: Arc<dyn AirQualityProvider>,
    pub store: Arc<dyn FacilityStore>,
}

/// A station near a facility, with its display distance
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct NearbyStation {
    pub station_name: String,
    pub address: String,
    /// `"800m"` below one kilometre, otherwise `"3.2km"`
    pub distance: String,
    pub distance_km: f64,
}

/// Forecast resolution service; clones share the cache and collaborators
#[derive(Clone)]
pub struct ForecastService {
    collaborators: Collaborators,
    cache: Cache,
    clock: Arc<dyn Clock>,
    schedule: Arc<PublicationSchedule>,
    forecast_ttl: Duration,
}

fn facility_cache_key(facility_id: &str) -> String {
    format!("forecast:facility:{facility_id}")
}

impl ForecastService {
    /// Service with the default schedule and TTL, on Seoul local time
    #[must_use]
    pub fn new(collaborators: Collaborators, cache: Cache) -> Self {
        Self {
            collaborators,
            cache,
            clock: Arc::new(SystemClock::new(chrono_tz::Asia::Seoul)),
            schedule: Arc::new(PublicationSchedule::default()),
            forecast_ttl: DEFAULT_FORECAST_TTL,
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn with_schedule(mut self, schedule: PublicationSchedule) -> Self {
        self.schedule = Arc::new(schedule);
        self
    }

    #[must_use]
    pub fn with_forecast_ttl(mut self, ttl: Duration) -> Self {
        self.forecast_ttl = ttl;
        self
    }

    /// Two-day forecast for a coordinate, district from reverse geocoding
    #[instrument(skip(self), fields(lat = coordinate.latitude, lon = coordinate.longitude))]
    pub async fn forecast_by_coordinate(&self, coordinate: Coordinate) -> Result<Vec<DailyForecast>> {
        let coordinate = coordinate.normalized();
        let key = coordinate.cache_key();
        if let Some(cached) = self.cache.get::<Vec<DailyForecast>>(&key).await? {
            debug!("Forecast cache hit for {}", key);
            return Ok(cached);
        }

        let service = self.clone();
        detached(async move { service.resolve_coordinate(coordinate, key).await }).await
    }

    /// Two-day forecast for a stored facility, district from the nearest station
    #[instrument(skip(self))]
    pub async fn forecast_by_facility(&self, facility_id: &str) -> Result<Vec<DailyForecast>> {
        let key = facility_cache_key(facility_id);
        if let Some(cached) = self.cache.get::<Vec<DailyForecast>>(&key).await? {
            debug!("Forecast cache hit for {}", key);
            return Ok(cached);
        }

        let service = self.clone();
        let facility_id = facility_id.to_string();
        detached(async move { service.resolve_facility(facility_id, key).await }).await
    }

    /// Coordinate forecast prefixed by today's live reading
    #[instrument(skip(self), fields(lat = coordinate.latitude, lon = coordinate.longitude))]
    pub async fn report_by_coordinate(&self, coordinate: Coordinate) -> Result<ForecastReport> {
        let (today, days) = tokio::try_join!(
            self.optional_today_reading(coordinate),
            self.forecast_by_coordinate(coordinate)
        )?;
        Ok(ForecastReport { today, days })
    }

    /// Facility forecast prefixed by today's live reading
    #[instrument(skip(self))]
    pub async fn report_by_facility(&self, facility_id: &str) -> Result<ForecastReport> {
        let facility = self.find_facility(facility_id).await?;
        let (today, days) = tokio::try_join!(
            self.optional_today_reading(facility.coordinate),
            self.forecast_by_facility(facility_id)
        )?;
        Ok(ForecastReport { today, days })
    }

    /// The stations closest to a facility, nearest first
    #[instrument(skip(self))]
    pub async fn nearby_stations(&self, facility_id: &str) -> Result<Vec<NearbyStation>> {
        let facility = self.find_facility(facility_id).await?;
        let stations = self.collaborators.store.list_all_stations().await?;
        Ok(top_n(facility.coordinate, &stations, NEARBY_STATION_COUNT)
            .into_iter()
            .map(|(station, distance_km)| NearbyStation {
                station_name: station.name.clone(),
                address: station.address.clone(),
                distance: format_distance(distance_km),
                distance_km,
            })
            .collect())
    }

    /// Live reading for the station registered under a district name
    #[instrument(skip(self))]
    pub async fn air_quality_by_district(&self, district_name: &str) -> Result<TodayReading> {
        let station = self
            .collaborators
            .store
            .find_station_by_district_name(district_name)
            .await?
            .ok_or_else(|| ForecastError::facility_not_found(district_name))?;
        self.reading_for_station(&station).await
    }

    /// Live reading for the district containing a coordinate
    #[instrument(skip(self), fields(lat = coordinate.latitude, lon = coordinate.longitude))]
    pub async fn air_quality_by_coordinate(&self, coordinate: Coordinate) -> Result<TodayReading> {
        let district = self.collaborators.geocoder.reverse_geocode(coordinate).await?;
        self.air_quality_by_district(&district).await
    }

    /// Facilities whose name contains `query`
    pub async fn search_facilities(&self, query: &str) -> Result<Vec<Facility>> {
        self.collaborators
            .store
            .search_by_name(query, SEARCH_RESULT_LIMIT)
            .await
    }

    async fn resolve_coordinate(
        &self,
        coordinate: Coordinate,
        key: String,
    ) -> Result<Vec<DailyForecast>> {
        let cell = project(coordinate);
        let now = self.clock.now();
        let window = self.schedule.select_window(now);
        info!(
            "Fetching forecast for cell ({}, {}) at {} {}",
            cell.x,
            cell.y,
            window.base_date(),
            window.base_time()
        );

        let (district, items) = tokio::try_join!(
            self.collaborators.geocoder.reverse_geocode(coordinate),
            self.collaborators.forecast.fetch_grid_forecast(cell, &window)
        )?;

        let days = aggregate(&items, &target_dates(now.date()), &district);
        self.cache.put(&key, days.clone(), self.forecast_ttl).await?;
        Ok(days)
    }

    async fn resolve_facility(&self, facility_id: String, key: String) -> Result<Vec<DailyForecast>> {
        let facility = self.find_facility(&facility_id).await?;
        let coordinate = facility.coordinate.normalized();
        let cell = project(coordinate);
        let now = self.clock.now();
        let window = self.schedule.select_window(now);
        info!(
            "Fetching forecast for facility {} at cell ({}, {})",
            facility.id, cell.x, cell.y
        );

        let (stations, items) = tokio::try_join!(
            self.collaborators.store.list_all_stations(),
            self.collaborators.forecast.fetch_grid_forecast(cell, &window)
        )?;
        let station = nearest(facility.coordinate, &stations)?;
        debug!("Nearest station to {} is {}", facility.id, station.name);

        let days = aggregate(&items, &target_dates(now.date()), &station.name);
        self.cache.put(&key, days.clone(), self.forecast_ttl).await?;
        Ok(days)
    }

    async fn find_facility(&self, facility_id: &str) -> Result<Facility> {
        self.collaborators
            .store
            .find_facility_by_id(facility_id)
            .await?
            .ok_or_else(|| ForecastError::facility_not_found(facility_id))
    }

    /// Today's reading from the nearest station; a station without data yields `None`
    async fn optional_today_reading(&self, coordinate: Coordinate) -> Result<Option<TodayReading>> {
        let stations = self.collaborators.store.list_all_stations().await?;
        let station = nearest(coordinate, &stations)?;
        match self.reading_for_station(station).await {
            Ok(reading) => Ok(Some(reading)),
            Err(ForecastError::NoDataForStation { station_code }) => {
                warn!("No live reading for station {}", station_code);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn reading_for_station(&self, station: &Facility) -> Result<TodayReading> {
        let station_code = station.station_code().ok_or_else(|| {
            ForecastError::general(format!("Facility '{}' is not a station", station.id))
        })?;
        let reading = self
            .collaborators
            .air_quality
            .fetch_air_quality(station_code)
            .await?;
        let today = TodayReading::new(self.clock.now().date(), station.name.clone(), reading);
        info!(
            "Live reading for {}: PM10 {} ({})",
            station.name,
            today.reading.pm10,
            today.grade.label()
        );
        Ok(today)
    }
}

/// Run upstream work on its own task so a caller dropping the request
/// does not cancel it; a late success still lands in the cache.
async fn detached<T, F>(work: F) -> Result<T>
where
    F: Future<Output = Result<T>> + Send + 'static,
    T: Send + 'static,
{
    tokio::spawn(work)
        .await
        .map_err(|e| ForecastError::general(format!("Forecast task failed: {e}")))?
}
