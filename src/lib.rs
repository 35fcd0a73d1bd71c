//! Live satellite tracking from TLE data.
//!
//! Fetches TLE groups, propagates them with SGP4 into geodetic positions
//! filtered by orbit regime, and computes antimeridian-aware ground tracks.

pub mod config;
pub mod error;
pub mod ground_track;
pub mod math;
pub mod propagate;
pub mod regime;
pub mod source;
pub mod time;
pub mod tle;
pub mod tracker;

pub use config::TrackerConfig;
pub use error::TrackerError;
pub use ground_track::{ground_track, segment_ground_track, GroundTrackConfig, OrbitPath};
pub use propagate::{propagate_positions, propagate_record, Position, PositionMap};
pub use regime::OrbitGroup;
pub use source::{Endpoint, HttpTleSource, TleSource};
pub use tle::{parse_tle_data, parse_tle_data_with, SatelliteKind, SatelliteRecord, SelectionPolicy, TleLoadState};
pub use tracker::{FetchHandle, Tracker};
