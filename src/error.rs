//! Tracker error type.

use thiserror::Error;

/// Errors surfaced while fetching or propagating TLE data.
///
/// None of these are fatal to a [crate::Tracker]: ingestion errors leave
/// the previous record set in place and propagation errors only drop the
/// affected satellite from a single tick.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("HTTP {0}")]
    Status(u16),
    #[error("read error: {0}")]
    Read(#[from] std::io::Error),
    #[error("empty TLE response")]
    EmptyResponse,
    /// Orbital elements could not be built from the two TLE lines.
    #[error("invalid elements for {name}: {reason}")]
    Elements { name: String, reason: String },
    #[error("propagation failed: {0}")]
    Propagation(String),
}

impl From<ureq::Error> for TrackerError {
    fn from(e: ureq::Error) -> Self {
        match e {
            ureq::Error::Status(code, _) => TrackerError::Status(code),
            ureq::Error::Transport(t) => TrackerError::Http(t.to_string()),
        }
    }
}
