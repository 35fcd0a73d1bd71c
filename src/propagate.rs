//! SGP4 propagation of TLE records to live geodetic positions.
//!
//! One propagation pass turns the full record set into a fresh
//! [PositionMap]; satellites whose elements fail, whose output is not
//! finite, or whose altitude falls outside the selected group's band are
//! simply absent from that pass.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use log::trace;
use nalgebra::Vector3;
use serde::Serialize;
use sgp4::Constants;

use crate::error::TrackerError;
use crate::math::{eci_to_geodetic, Geodetic};
use crate::regime::OrbitGroup;
use crate::time::{datetime_to_minutes, greenwich_mean_sidereal_time, instant_to_minutes};
use crate::tle::SatelliteRecord;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude_km: f64,
    pub speed_km_s: f64,
}

impl Position {
    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.altitude_km.is_finite()
            && self.speed_km_s.is_finite()
    }
}

/// Live positions keyed by NORAD catalog id.
pub type PositionMap = BTreeMap<u64, Position>;

/// Initialized SGP4 model for one record.
#[derive(Clone)]
pub struct Orbit {
    pub name: String,
    pub constants: Constants,
    pub epoch_minutes: f64,
}

impl Orbit {
    pub fn from_record(record: &SatelliteRecord) -> Result<Self, TrackerError> {
        let elements = record.elements()?;
        let constants = Constants::from_elements(&elements).map_err(|e| TrackerError::Elements {
            name: record.name.clone(),
            reason: format!("{:?}", e),
        })?;
        Ok(Self {
            name: record.name.clone(),
            constants,
            epoch_minutes: datetime_to_minutes(&elements.datetime),
        })
    }

    /// TEME position (km) and velocity (km/s) at `at`.
    pub fn state_at(&self, at: DateTime<Utc>) -> Result<(Vector3<f64>, Vector3<f64>), TrackerError> {
        let minutes_since_epoch = instant_to_minutes(at) - self.epoch_minutes;
        let prediction = self
            .constants
            .propagate(sgp4::MinutesSinceEpoch(minutes_since_epoch))
            .map_err(|e| TrackerError::Propagation(format!("{}: {:?}", self.name, e)))?;
        Ok((
            Vector3::from(prediction.position),
            Vector3::from(prediction.velocity),
        ))
    }

    pub fn geodetic_at(&self, at: DateTime<Utc>) -> Result<(Geodetic, Vector3<f64>), TrackerError> {
        let (position, velocity) = self.state_at(at)?;
        let gmst = greenwich_mean_sidereal_time(at);
        Ok((eci_to_geodetic(&position, gmst), velocity))
    }

    /// Position at `at`, rejecting non-finite output.
    pub fn position_at(&self, at: DateTime<Utc>) -> Result<Position, TrackerError> {
        let (geo, velocity) = self.geodetic_at(at)?;
        let position = Position {
            latitude: geo.lat_deg(),
            longitude: geo.lon_deg(),
            altitude_km: geo.height_km,
            speed_km_s: velocity.norm(),
        };
        if position.is_finite() {
            Ok(position)
        } else {
            Err(TrackerError::Propagation(format!("{}: non-finite position", self.name)))
        }
    }
}

pub fn propagate_record(record: &SatelliteRecord, at: DateTime<Utc>) -> Result<Position, TrackerError> {
    Orbit::from_record(record)?.position_at(at)
}

pub fn propagate_positions(records: &[SatelliteRecord], group: OrbitGroup, at: DateTime<Utc>) -> PositionMap {
    let mut positions = PositionMap::new();
    for record in records {
        match propagate_record(record, at) {
            Ok(position) if group.contains_altitude(position.altitude_km) => {
                positions.insert(record.catalog_id, position);
            }
            Ok(_) => {}
            Err(e) => trace!("{}", e),
        }
    }
    positions
}
