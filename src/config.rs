//! Tracker configuration.
//!
//! Defaults: LEO group, one propagation pass per second, 140-minute
//! ground tracks sampled every 2 minutes, and at most 150 objects beyond
//! the satellites of interest.

use std::time::Duration;

use log::warn;

use crate::ground_track::GroundTrackConfig;
use crate::regime::OrbitGroup;
use crate::source::Endpoint;
use crate::tle::SelectionPolicy;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const API_URL_ENV: &str = "SATWATCH_API_URL";
pub const GROUP_ENV: &str = "SATWATCH_GROUP";
pub const TICK_MS_ENV: &str = "SATWATCH_TICK_MS";

#[derive(Clone, Debug, PartialEq)]
pub struct TrackerConfig {
    pub endpoint: Endpoint,
    pub group: OrbitGroup,
    pub tick_interval: Duration,
    pub http_timeout: Duration,
    pub ground_track: GroundTrackConfig,
    pub selection: SelectionPolicy,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            endpoint: Endpoint::Backend { base_url: DEFAULT_API_URL.to_string() },
            group: OrbitGroup::Leo,
            tick_interval: Duration::from_secs(1),
            http_timeout: Duration::from_secs(15),
            ground_track: GroundTrackConfig::default(),
            selection: SelectionPolicy::default(),
        }
    }
}

impl TrackerConfig {
    /// Defaults with `SATWATCH_API_URL`, `SATWATCH_GROUP` and
    /// `SATWATCH_TICK_MS` applied when set. Unreadable values are logged
    /// and ignored.
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    pub(crate) fn with_overrides(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = var(API_URL_ENV).filter(|u| !u.trim().is_empty()) {
            self.endpoint = Endpoint::Backend { base_url: url.trim().to_string() };
        }
        if let Some(group) = var(GROUP_ENV) {
            match group.parse() {
                Ok(g) => self.group = g,
                Err(e) => warn!("{}: {}", GROUP_ENV, e),
            }
        }
        if let Some(ms) = var(TICK_MS_ENV) {
            match ms.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => self.tick_interval = Duration::from_millis(ms),
                _ => warn!("{}: invalid tick interval \"{}\"", TICK_MS_ENV, ms),
            }
        }
        self
    }

    pub fn with_group(mut self, group: OrbitGroup) -> Self {
        self.group = group;
        self
    }

    pub fn with_endpoint(mut self, endpoint: Endpoint) -> Self {
        self.endpoint = endpoint;
        self
    }

    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }
}
