//! Orbit regime groups and altitude-band classification.
//!
//! Each group maps to a remote TLE group keyword and to an altitude band
//! used to decide whether a propagated position is shown.

use std::fmt;
use std::str::FromStr;

pub const LEO_MIN_KM: f64 = 160.0;
pub const LEO_MAX_KM: f64 = 1200.0;
pub const MEO_MIN_KM: f64 = 2000.0;
pub const MEO_MAX_KM: f64 = 25000.0;
pub const GEO_MIN_KM: f64 = 34000.0;
pub const GEO_MAX_KM: f64 = 38000.0;
pub const MILITARY_LOW_CEILING_KM: f64 = 2000.0;
pub const MILITARY_NAV_MIN_KM: f64 = 19000.0;
pub const MILITARY_NAV_MAX_KM: f64 = 22000.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum OrbitGroup {
    #[default]
    Leo,
    Meo,
    Geo,
    Military,
    Observation,
    Unfiltered,
}

impl OrbitGroup {
    pub const ALL: [OrbitGroup; 6] = [
        Self::Leo, Self::Meo, Self::Geo,
        Self::Military, Self::Observation, Self::Unfiltered,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Leo => "LEO",
            Self::Meo => "MEO",
            Self::Geo => "GEO",
            Self::Military => "Military",
            Self::Observation => "Observation",
            Self::Unfiltered => "All",
        }
    }

    /// Group keyword understood by the TLE endpoints.
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Leo | Self::Unfiltered => "active",
            Self::Meo => "gps-ops",
            Self::Geo => "geo",
            Self::Military => "military",
            Self::Observation => "resource",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Leo => "Fast orbit (90-120m), high-frequency region pass.",
            Self::Meo => "Slower orbit (2-12hr), navigation-sync optimized.",
            Self::Geo => "Geostationary, 24hr period. Static position.",
            Self::Military => "Tactical polar orbit / recon class, plus MEO navigation.",
            Self::Observation => "Earth observation optimized for imaging.",
            Self::Unfiltered => "Every tracked object, no altitude filtering.",
        }
    }

    /// Altitude-band membership test applied after propagation.
    pub fn contains_altitude(&self, altitude_km: f64) -> bool {
        match self {
            Self::Leo => (LEO_MIN_KM..=LEO_MAX_KM).contains(&altitude_km),
            Self::Meo => (MEO_MIN_KM..=MEO_MAX_KM).contains(&altitude_km),
            Self::Geo => (GEO_MIN_KM..=GEO_MAX_KM).contains(&altitude_km),
            Self::Military => {
                altitude_km < MILITARY_LOW_CEILING_KM
                    || (altitude_km > MILITARY_NAV_MIN_KM && altitude_km < MILITARY_NAV_MAX_KM)
            }
            Self::Observation | Self::Unfiltered => true,
        }
    }
}

impl fmt::Display for OrbitGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for OrbitGroup {
    type Err = String;

    /// Accepts either the display label or a group keyword. The shared
    /// `active` keyword resolves to [OrbitGroup::Leo].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        match s.as_str() {
            "leo" | "active" => Ok(Self::Leo),
            "meo" | "gps-ops" => Ok(Self::Meo),
            "geo" => Ok(Self::Geo),
            "military" => Ok(Self::Military),
            "observation" | "resource" => Ok(Self::Observation),
            "all" | "unfiltered" => Ok(Self::Unfiltered),
            _ => Err(format!("unknown orbit group \"{}\"", s)),
        }
    }
}
