//! Predicted ground tracks.
//!
//! Samples the sub-satellite point forward in time and splits the path
//! wherever it wraps across the ±180° meridian so it can be drawn on a
//! flat map without a line spanning the globe.

use chrono::{DateTime, Duration, Utc};
use log::trace;
use serde::Serialize;

use crate::error::TrackerError;
use crate::propagate::Orbit;
use crate::tle::SatelliteRecord;

pub const HORIZON_MINUTES: u32 = 140;
pub const STEP_MINUTES: u32 = 2;
const WRAP_THRESHOLD_DEG: f64 = 180.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GroundTrackConfig {
    pub horizon_minutes: u32,
    pub step_minutes: u32,
}

impl Default for GroundTrackConfig {
    fn default() -> Self {
        Self {
            horizon_minutes: HORIZON_MINUTES,
            step_minutes: STEP_MINUTES,
        }
    }
}

impl GroundTrackConfig {
    /// Minute offsets from the start instant, horizon exclusive.
    pub fn offsets(&self) -> impl Iterator<Item = u32> {
        (0..self.horizon_minutes).step_by(self.step_minutes.max(1) as usize)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OrbitPath {
    pub catalog_id: u64,
    pub start: DateTime<Utc>,
    /// `(lat, lon)` points in degrees.
    pub segments: Vec<Vec<(f64, f64)>>,
}

impl OrbitPath {
    pub fn point_count(&self) -> usize {
        self.segments.iter().map(Vec::len).sum()
    }

    pub fn points(&self) -> impl Iterator<Item = &(f64, f64)> {
        self.segments.iter().flatten()
    }
}

/// Splits on consecutive longitude jumps above 180°. Always returns at
/// least one (possibly empty) segment.
pub fn segment_ground_track(points: &[(f64, f64)]) -> Vec<Vec<(f64, f64)>> {
    let mut segments = Vec::new();
    let mut current: Vec<(f64, f64)> = Vec::new();
    for (i, &point) in points.iter().enumerate() {
        if i > 0 && (point.1 - points[i - 1].1).abs() > WRAP_THRESHOLD_DEG {
            segments.push(std::mem::take(&mut current));
        }
        current.push(point);
    }
    segments.push(current);
    segments
}

/// Samples which fail to propagate, or come out non-finite, are left out
/// of the point list without starting a new segment.
pub fn sample_ground_track(orbit: &Orbit, start: DateTime<Utc>, config: &GroundTrackConfig) -> Vec<(f64, f64)> {
    config
        .offsets()
        .filter_map(|minutes| {
            let at = start + Duration::minutes(minutes as i64);
            match orbit.geodetic_at(at) {
                Ok((geo, _)) if geo.is_finite() => Some((geo.lat_deg(), geo.lon_deg())),
                Ok(_) => None,
                Err(e) => {
                    trace!("ground track sample +{}m dropped: {}", minutes, e);
                    None
                }
            }
        })
        .collect()
}

pub fn ground_track(
    record: &SatelliteRecord,
    start: DateTime<Utc>,
    config: &GroundTrackConfig,
) -> Result<OrbitPath, TrackerError> {
    let orbit = Orbit::from_record(record)?;
    let points = sample_ground_track(&orbit, start, config);
    Ok(OrbitPath {
        catalog_id: record.catalog_id,
        start,
        segments: segment_ground_track(&points),
    })
}
