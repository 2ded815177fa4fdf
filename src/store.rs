//! Facility persistence seam and the in-memory store backing it
//!
//! Records are loaded once from JSON seed files and then served read-only.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

use crate::models::{Coordinate, Facility};
use crate::{ForecastError, Result};

/// Read-only access to stored facilities and stations
#[async_trait]
pub trait FacilityStore: Send + Sync {
    async fn find_facility_by_id(&self, id: &str) -> Result<Option<Facility>>;

    async fn list_all_stations(&self) -> Result<Vec<Facility>>;

    async fn find_station_by_district_name(&self, name: &str) -> Result<Option<Facility>>;

    /// Service points whose name contains `query`, case-insensitively
    async fn search_by_name(&self, query: &str, limit: usize) -> Result<Vec<Facility>>;
}

/// Station seed record
#[derive(Debug, Deserialize)]
struct StationRecord {
    station_name: String,
    station_code: u32,
    address: String,
    latitude: f64,
    longitude: f64,
}

/// Service point seed record
#[derive(Debug, Deserialize)]
struct ServicePointRecord {
    id: String,
    name: String,
    address: String,
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Default)]
pub struct InMemoryFacilityStore {
    /// Insertion order is kept so nearest-station ties stay deterministic
    stations: Vec<Facility>,
    service_points: Vec<Facility>,
    by_id: HashMap<String, usize>,
}

impl InMemoryFacilityStore {
    /// Build a store; station codes must be unique
    pub fn new(stations: Vec<Facility>, service_points: Vec<Facility>) -> Result<Self> {
        let mut seen_codes = HashMap::new();
        for station in &stations {
            let code = station.station_code().ok_or_else(|| {
                ForecastError::config(format!("Facility '{}' is not a station", station.id))
            })?;
            if let Some(other) = seen_codes.insert(code, station.id.clone()) {
                return Err(ForecastError::config(format!(
                    "Duplicate station code {code} ('{other}' and '{}')",
                    station.id
                )));
            }
        }

        let by_id = service_points
            .iter()
            .enumerate()
            .map(|(i, f)| (f.id.clone(), i))
            .collect();
        Ok(Self {
            stations,
            service_points,
            by_id,
        })
    }

    /// Load stations and service points from JSON seed files
    pub fn from_seed_files(stations_path: &Path, service_points_path: Option<&Path>) -> Result<Self> {
        let station_records: Vec<StationRecord> = read_json(stations_path)?;
        let stations = station_records
            .into_iter()
            .map(|r| {
                let coordinate = Coordinate::new(r.latitude, r.longitude)?;
                Ok(Facility::station(
                    &format!("station-{}", r.station_code),
                    &r.station_name,
                    &r.address,
                    coordinate,
                    r.station_code,
                ))
            })
            .collect::<Result<Vec<_>>>()?;

        let service_points = match service_points_path {
            Some(path) => read_json::<Vec<ServicePointRecord>>(path)?
                .into_iter()
                .map(|r| {
                    let coordinate = Coordinate::new(r.latitude, r.longitude)?;
                    Ok(Facility::service_point(&r.id, &r.name, &r.address, coordinate))
                })
                .collect::<Result<Vec<_>>>()?,
            None => Vec::new(),
        };

        info!(
            "Loaded {} stations and {} service points",
            stations.len(),
            service_points.len()
        );
        Self::new(stations, service_points)
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        ForecastError::config(format!("Failed to read seed file {}: {e}", path.display()))
    })?;
    serde_json::from_str(&text).map_err(|e| {
        ForecastError::config(format!("Invalid seed file {}: {e}", path.display()))
    })
}

#[async_trait]
impl FacilityStore for InMemoryFacilityStore {
    async fn find_facility_by_id(&self, id: &str) -> Result<Option<Facility>> {
        if let Some(i) = self.by_id.get(id) {
            return Ok(self.service_points.get(*i).cloned());
        }
        Ok(self.stations.iter().find(|s| s.id == id).cloned())
    }

    async fn list_all_stations(&self) -> Result<Vec<Facility>> {
        Ok(self.stations.clone())
    }

    async fn find_station_by_district_name(&self, name: &str) -> Result<Option<Facility>> {
        Ok(self.stations.iter().find(|s| s.name == name).cloned())
    }

    async fn search_by_name(&self, query: &str, limit: usize) -> Result<Vec<Facility>> {
        let needle = query.to_lowercase();
        Ok(self
            .service_points
            .iter()
            .filter(|f| f.name.to_lowercase().contains(&needle))
            .take(limit)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_json(value: serde_json::Value) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{value}").unwrap();
        file
    }

    #[tokio::test]
    async fn test_load_seed_files() {
        let stations = write_json(serde_json::json!([
            {"station_name": "종로구", "station_code": 111123, "address": "서울 종로구",
             "latitude": 37.572013, "longitude": 127.005014},
            {"station_name": "중구", "station_code": 111121, "address": "서울 중구",
             "latitude": 37.564117, "longitude": 126.974782}
        ]));
        let daycares = write_json(serde_json::json!([
            {"id": "dc-1", "name": "Hansung Daycare", "address": "서울 성북구",
             "latitude": 37.58, "longitude": 127.01}
        ]));

        let store =
            InMemoryFacilityStore::from_seed_files(stations.path(), Some(daycares.path())).unwrap();

        assert_eq!(store.list_all_stations().await.unwrap().len(), 2);
        let jongno = store.find_station_by_district_name("종로구").await.unwrap().unwrap();
        assert_eq!(jongno.station_code(), Some(111123));
        assert!(store.find_facility_by_id("dc-1").await.unwrap().is_some());
        assert!(store.find_facility_by_id("station-111121").await.unwrap().is_some());
        assert!(store.find_facility_by_id("missing").await.unwrap().is_none());
        assert_eq!(store.search_by_name("hansung", 5).await.unwrap().len(), 1);
    }

    #[test]
    fn test_duplicate_station_code_rejected() {
        let c = Coordinate::new(37.5, 127.0).unwrap();
        let result = InMemoryFacilityStore::new(
            vec![
                Facility::station("a", "A", "", c, 1),
                Facility::station("b", "B", "", c, 1),
            ],
            vec![],
        );
        assert!(matches!(result, Err(ForecastError::Config { .. })));
    }

    #[test]
    fn test_invalid_seed_coordinate() {
        let stations = write_json(serde_json::json!([
            {"station_name": "x", "station_code": 1, "address": "", "latitude": 137.0, "longitude": 0.0}
        ]));
        assert!(matches!(
            InMemoryFacilityStore::from_seed_files(stations.path(), None),
            Err(ForecastError::InvalidCoordinate { .. })
        ));
    }

    #[tokio::test]
    async fn test_search_limit() {
        let c = Coordinate::new(37.5, 127.0).unwrap();
        let points = (0..8)
            .map(|i| Facility::service_point(&format!("dc-{i}"), &format!("Sunny {i}"), "", c))
            .collect();
        let store = InMemoryFacilityStore::new(vec![], points).unwrap();
        assert_eq!(store.search_by_name("SUNNY", 5).await.unwrap().len(), 5);
    }
}
