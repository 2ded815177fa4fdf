//! Lambert Conformal Conic projection onto the KMA village-forecast grid
//!
//! The constants below are the provider's published DFS grid parameters; the
//! rounding must stay `floor(v + 0.5)` or cells drift by one along boundaries.

use std::f64::consts::PI;

use crate::models::{Coordinate, GridCell};

/// Earth radius used by the provider (km)
const EARTH_RADIUS_KM: f64 = 6371.00877;
/// Grid spacing (km)
const GRID_KM: f64 = 5.0;
/// First standard parallel (degrees)
const STANDARD_LAT_1: f64 = 30.0;
/// Second standard parallel (degrees)
const STANDARD_LAT_2: f64 = 60.0;
/// Origin longitude (degrees)
const ORIGIN_LON: f64 = 126.0;
/// Origin latitude (degrees)
const ORIGIN_LAT: f64 = 38.0;
/// Grid column of the origin
const ORIGIN_X: f64 = 43.0;
/// Grid row of the origin
const ORIGIN_Y: f64 = 136.0;

const DEG_TO_RAD: f64 = PI / 180.0;

/// Projection terms that depend only on the constants
struct LambertParams {
    /// Earth radius in grid units
    re: f64,
    /// Cone constant
    sn: f64,
    sf: f64,
    /// Radius of the origin parallel
    ro: f64,
}

impl LambertParams {
    fn provider() -> Self {
        let re = EARTH_RADIUS_KM / GRID_KM;
        let slat1 = STANDARD_LAT_1 * DEG_TO_RAD;
        let slat2 = STANDARD_LAT_2 * DEG_TO_RAD;
        let olat = ORIGIN_LAT * DEG_TO_RAD;

        let sn = (PI * 0.25 + slat2 * 0.5).tan() / (PI * 0.25 + slat1 * 0.5).tan();
        let sn = (slat1.cos() / slat2.cos()).ln() / sn.ln();

        let sf = (PI * 0.25 + slat1 * 0.5).tan();
        let sf = sf.powf(sn) * slat1.cos() / sn;

        let ro = (PI * 0.25 + olat * 0.5).tan();
        let ro = re * sf / ro.powf(sn);

        Self { re, sn, sf, ro }
    }
}

/// Project a coordinate onto the forecast grid.
///
/// Total and pure: every input produces a cell, and the same input always
/// produces the same cell.
#[must_use]
pub fn project(coordinate: Coordinate) -> GridCell {
    let p = LambertParams::provider();

    let ra = (PI * 0.25 + coordinate.latitude * DEG_TO_RAD * 0.5).tan();
    let ra = p.re * p.sf / ra.powf(p.sn);

    let mut theta = coordinate.longitude * DEG_TO_RAD - ORIGIN_LON * DEG_TO_RAD;
    if theta > PI {
        theta -= 2.0 * PI;
    }
    if theta <= -PI {
        theta += 2.0 * PI;
    }
    theta *= p.sn;

    let x = (ra * theta.sin() + ORIGIN_X + 0.5).floor();
    let y = (p.ro - ra * theta.cos() + ORIGIN_Y + 0.5).floor();

    GridCell {
        x: x as i32,
        y: y as i32,
    }
}
