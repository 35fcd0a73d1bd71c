//! Coordinate transformations.
//!
//! Inertial (TEME) Cartesian vectors to geodetic latitude/longitude/height
//! on the WGS-84 ellipsoid, and longitude wrapping.

use nalgebra::Vector3;
use std::f64::consts::PI;

pub const WGS84_A_KM: f64 = 6378.137;
pub const WGS84_B_KM: f64 = 6356.7523142;
const LATITUDE_ITERATIONS: usize = 20;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Geodetic {
    /// Radians.
    pub lat: f64,
    /// Radians, in `[-π, π]`.
    pub lon: f64,
    pub height_km: f64,
}

impl Geodetic {
    pub fn lat_deg(&self) -> f64 {
        self.lat.to_degrees()
    }

    pub fn lon_deg(&self) -> f64 {
        self.lon.to_degrees()
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite() && self.height_km.is_finite()
    }
}

pub fn wrap_longitude(mut lon: f64) -> f64 {
    while lon < -PI { lon += 2.0 * PI; }
    while lon > PI { lon -= 2.0 * PI; }
    lon
}

/// Converts an inertial position (km) to geodetic coordinates, given the
/// sidereal angle `gmst` (radians) at the same instant.
pub fn eci_to_geodetic(eci: &Vector3<f64>, gmst: f64) -> Geodetic {
    let a = WGS84_A_KM;
    let f = (WGS84_A_KM - WGS84_B_KM) / WGS84_A_KM;
    let e2 = 2.0 * f - f * f;

    let r = (eci.x * eci.x + eci.y * eci.y).sqrt();
    let lon = wrap_longitude(eci.y.atan2(eci.x) - gmst);

    let mut lat = eci.z.atan2(r);
    let mut c = 1.0;
    for _ in 0..LATITUDE_ITERATIONS {
        c = 1.0 / (1.0 - e2 * lat.sin() * lat.sin()).sqrt();
        lat = (eci.z + a * c * e2 * lat.sin()).atan2(r);
    }
    let height_km = r / lat.cos() - a * c;

    Geodetic { lat, lon, height_km }
}
