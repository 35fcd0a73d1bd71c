//! Two-Line Element (TLE) ingestion.
//!
//! Turns a raw newline-delimited TLE blob into [SatelliteRecord]s, keeping
//! the satellites of interest plus a capped number of other objects.

use log::debug;
use serde::Serialize;

use crate::error::TrackerError;

/// Satellites always retained regardless of the cap.
pub const INTEREST_IDS: [u64; 9] = [
    25544, // ISS
    20580, // Hubble
    40069, // Meteor-M No.2
    33331, // GeoEye 1
    40697, // Sentinel-2A
    42063, // Sentinel-2B
    39084, // Landsat 8
    49260, // Landsat 9
    43013, // Sentinel-1B
];

pub const MAX_TRACKED: usize = 150;

const LINE1_PREFIX: &str = "1 ";
const LINE2_PREFIX: &str = "2 ";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SatelliteRecord {
    pub name: String,
    pub line1: String,
    pub line2: String,
    pub catalog_id: u64,
}

impl SatelliteRecord {
    /// Builds a record from a candidate triplet, or `None` when the lines
    /// fail the prefix check or carry no readable catalog number.
    pub fn from_triplet(name: &str, line1: &str, line2: &str) -> Option<Self> {
        if !line1.starts_with(LINE1_PREFIX) || !line2.starts_with(LINE2_PREFIX) {
            return None;
        }
        let catalog_id = parse_catalog_id(line1)?;
        Some(Self {
            name: name.to_string(),
            line1: line1.to_string(),
            line2: line2.to_string(),
            catalog_id,
        })
    }

    pub fn elements(&self) -> Result<sgp4::Elements, TrackerError> {
        sgp4::Elements::from_tle(
            Some(self.name.clone()),
            self.line1.as_bytes(),
            self.line2.as_bytes(),
        )
        .map_err(|e| TrackerError::Elements {
            name: self.name.clone(),
            reason: format!("{:?}", e),
        })
    }

    pub fn kind(&self) -> SatelliteKind {
        SatelliteKind::from_name(&self.name)
    }

    pub fn is_of_interest(&self) -> bool {
        INTEREST_IDS.contains(&self.catalog_id)
    }
}

/// NORAD number from columns 3-7 of line 1.
pub fn parse_catalog_id(line1: &str) -> Option<u64> {
    line1.get(2..7)?.trim().parse().ok()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum SatelliteKind {
    Iss,
    Starlink,
    EarthObservation,
    Other,
}

impl SatelliteKind {
    /// Later rules win: an ISS match overrides Starlink, which overrides
    /// Sentinel/Landsat.
    pub fn from_name(name: &str) -> Self {
        if name.contains("ISS") {
            Self::Iss
        } else if name.contains("STARLINK") {
            Self::Starlink
        } else if name.contains("SENTINEL") || name.contains("LANDSAT") {
            Self::EarthObservation
        } else {
            Self::Other
        }
    }
}

/// Which parsed records are retained.
#[derive(Clone, Debug, PartialEq)]
pub struct SelectionPolicy {
    pub interest_ids: Vec<u64>,
    pub max_tracked: usize,
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self {
            interest_ids: INTEREST_IDS.to_vec(),
            max_tracked: MAX_TRACKED,
        }
    }
}

impl SelectionPolicy {
    pub fn accepts(&self, catalog_id: u64, retained: usize) -> bool {
        self.interest_ids.contains(&catalog_id) || retained < self.max_tracked
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum TleLoadState {
    #[default]
    NotLoaded,
    Loading,
    Loaded { count: usize },
    Failed(String),
}

/// Splits on any newline convention, trims, and drops blank lines.
pub fn normalize_lines(data: &str) -> Vec<&str> {
    data.split(['\r', '\n'])
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect()
}

pub fn parse_tle_data(data: &str) -> Vec<SatelliteRecord> {
    parse_tle_data_with(data, &SelectionPolicy::default())
}

/// Scans normalized lines three at a time. An accepted triplet consumes
/// three lines; a rejected one advances a single line so a stray or
/// missing line cannot shift every following triplet.
pub fn parse_tle_data_with(data: &str, policy: &SelectionPolicy) -> Vec<SatelliteRecord> {
    let lines = normalize_lines(data);
    let mut satellites = Vec::new();

    let mut i = 0;
    while i + 2 < lines.len() {
        let Some(record) = SatelliteRecord::from_triplet(lines[i], lines[i + 1], lines[i + 2]) else {
            debug!("skipping malformed TLE line {}: {:?}", i, lines[i]);
            i += 1;
            continue;
        };

        if policy.accepts(record.catalog_id, satellites.len()) {
            satellites.push(record);
        }
        i += 3;
    }

    satellites
}
