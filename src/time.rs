//! Time and sidereal-angle calculations.
//!
//! Greenwich Mean Sidereal Time rotates inertial (TEME) positions into the
//! Earth-fixed frame; TLE epochs are handled as minutes since the Unix epoch.

use chrono::{DateTime, NaiveDateTime, Utc};

pub const SECONDS_PER_DAY: f64 = 86400.0;
pub const MINUTES_PER_DAY: f64 = 1440.0;
pub const DAYS_PER_JULIAN_CENTURY: f64 = 36525.0;
pub const GMST_BASE_DEG: f64 = 280.46061837;
pub const GMST_ROTATION_PER_DAY: f64 = 360.98564736629;
pub const GMST_CORRECTION: f64 = 0.000387933;
pub const GMST_CUBIC_DIVISOR: f64 = 38710000.0;

/// Unix time of J2000.0 (2000-01-01T12:00:00Z).
const J2000_UNIX_SECONDS: f64 = 946_728_000.0;

pub fn days_since_j2000(timestamp: DateTime<Utc>) -> f64 {
    (timestamp.timestamp_millis() as f64 / 1000.0 - J2000_UNIX_SECONDS) / SECONDS_PER_DAY
}

/// GMST in radians, normalized to `[0, 2π)`.
pub fn greenwich_mean_sidereal_time(timestamp: DateTime<Utc>) -> f64 {
    let days = days_since_j2000(timestamp);
    let centuries = days / DAYS_PER_JULIAN_CENTURY;
    let gmst_degrees = GMST_BASE_DEG
        + GMST_ROTATION_PER_DAY * days
        + GMST_CORRECTION * centuries * centuries
        - centuries * centuries * centuries / GMST_CUBIC_DIVISOR;
    gmst_degrees.rem_euclid(360.0).to_radians()
}

pub fn datetime_to_minutes(dt: &NaiveDateTime) -> f64 {
    dt.and_utc().timestamp_millis() as f64 / 60_000.0
}

pub fn instant_to_minutes(at: DateTime<Utc>) -> f64 {
    at.timestamp_millis() as f64 / 60_000.0
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::TimeZone;
    use std::f64::consts::PI;

    #[test]
    fn gmst_at_j2000() {
        let j2000 = Utc.with_ymd_and_hms(2000, 1, 1, 12, 0, 0).unwrap();
        assert!(days_since_j2000(j2000).abs() < 1e-12);
        let gmst = greenwich_mean_sidereal_time(j2000);
        assert!((gmst.to_degrees() - GMST_BASE_DEG).abs() < 1e-9);
    }

    #[test]
    fn gmst_advances_one_sidereal_day() {
        let t0 = Utc.with_ymd_and_hms(2024, 3, 20, 0, 0, 0).unwrap();
        let sidereal_day = chrono::Duration::milliseconds(86_164_091);
        let a = greenwich_mean_sidereal_time(t0);
        let b = greenwich_mean_sidereal_time(t0 + sidereal_day);
        let diff = (b - a).rem_euclid(2.0 * PI);
        assert!(diff < 1e-4 || 2.0 * PI - diff < 1e-4, "diff {}", diff);
    }

    #[test]
    fn gmst_is_normalized() {
        for hour in 0..48 {
            let t = Utc.with_ymd_and_hms(2020, 7, 12, 0, 0, 0).unwrap() + chrono::Duration::hours(hour);
            let gmst = greenwich_mean_sidereal_time(t);
            assert!((0.0..2.0 * PI).contains(&gmst));
        }
    }

    #[test]
    fn minutes_round_trip() {
        let t = Utc.with_ymd_and_hms(2020, 7, 12, 21, 16, 1).unwrap();
        assert_eq!(datetime_to_minutes(&t.naive_utc()), instant_to_minutes(t));
        assert_eq!(instant_to_minutes(Utc.timestamp_opt(0, 0).unwrap()), 0.0);
        assert_eq!(instant_to_minutes(Utc.timestamp_opt(3600, 0).unwrap()), 60.0);
    }
}
