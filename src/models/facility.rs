//! Facility model: childcare service points and monitoring stations

use serde::{Deserialize, Serialize};

use super::Coordinate;

/// What kind of place a facility is
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FacilityKind {
    /// A daycare-like service point
    ServicePoint,
    /// An air-quality monitoring station
    Station { station_code: u32 },
}

/// A stored place with a fixed location
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Facility {
    pub id: String,
    /// Display name; for stations this is the district name (e.g. "종로구")
    pub name: String,
    pub address: String,
    pub coordinate: Coordinate,
    pub kind: FacilityKind,
}

impl Facility {
    #[must_use]
    pub fn service_point(id: &str, name: &str, address: &str, coordinate: Coordinate) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            address: address.to_string(),
            coordinate,
            kind: FacilityKind::ServicePoint,
        }
    }

    #[must_use]
    pub fn station(
        id: &str,
        name: &str,
        address: &str,
        coordinate: Coordinate,
        station_code: u32,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            address: address.to_string(),
            coordinate,
            kind: FacilityKind::Station { station_code },
        }
    }

    /// Station code, if this facility is a monitoring station
    #[must_use]
    pub fn station_code(&self) -> Option<u32> {
        match self.kind {
            FacilityKind::Station { station_code } => Some(station_code),
            FacilityKind::ServicePoint => None,
        }
    }
}
