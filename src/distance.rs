//! Great-circle distance and nearest-station search

use haversine::{Location as HaversineLocation, Units, distance};

use crate::models::{Coordinate, Facility};
use crate::{ForecastError, Result};

/// Great-circle distance in kilometres (mean earth radius 6371 km)
#[must_use]
pub fn haversine_distance_km(a: Coordinate, b: Coordinate) -> f64 {
    let from = HaversineLocation {
        latitude: a.latitude,
        longitude: a.longitude,
    };
    let to = HaversineLocation {
        latitude: b.latitude,
        longitude: b.longitude,
    };
    distance(from, to, Units::Kilometers)
}

/// The candidate closest to `target`; ties go to the earliest candidate
pub fn nearest<'a>(target: Coordinate, candidates: &'a [Facility]) -> Result<&'a Facility> {
    let mut best: Option<(&Facility, f64)> = None;
    for candidate in candidates {
        let d = haversine_distance_km(target, candidate.coordinate);
        match best {
            Some((_, best_d)) if d >= best_d => {}
            _ => best = Some((candidate, d)),
        }
    }
    best.map(|(facility, _)| facility)
        .ok_or(ForecastError::EmptyCandidateSet)
}

/// The `n` closest candidates with their distances, ascending
#[must_use]
pub fn top_n<'a>(
    target: Coordinate,
    candidates: &'a [Facility],
    n: usize,
) -> Vec<(&'a Facility, f64)> {
    let mut ranked: Vec<(&Facility, f64)> = candidates
        .iter()
        .map(|c| (c, haversine_distance_km(target, c.coordinate)))
        .collect();
    // sort_by is stable, so equal distances keep input order
    ranked.sort_by(|a, b| a.1.total_cmp(&b.1));
    ranked.truncate(n);
    ranked
}

/// Render a distance for display: metres below 1 km, else km with one decimal
#[must_use]
pub fn format_distance(distance_km: f64) -> String {
    if distance_km < 1.0 {
        format!("{}m", (distance_km * 1000.0).round() as i64)
    } else {
        format!("{distance_km:.1}km")
    }
}
