//! Live satellite tracker.
//!
//! Owns the record set and the live position map. Enabling tracking or
//! changing the group starts a background TLE fetch; a generation counter
//! makes sure a response that arrives after a newer change is dropped.
//! While enabled with a non-empty record set, a ticker thread runs one
//! propagation pass per interval and replaces the position map wholesale.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError, Weak};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};

use crate::config::TrackerConfig;
use crate::error::TrackerError;
use crate::ground_track::{ground_track, GroundTrackConfig, OrbitPath};
use crate::propagate::{propagate_positions, PositionMap};
use crate::regime::OrbitGroup;
use crate::source::{HttpTleSource, TleSource};
use crate::tle::{parse_tle_data_with, SatelliteRecord, SelectionPolicy, TleLoadState};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

struct TrackerState {
    enabled: bool,
    group: OrbitGroup,
    generation: u64,
    records: Arc<Vec<SatelliteRecord>>,
    positions: Arc<PositionMap>,
    load_state: TleLoadState,
}

impl TrackerState {
    /// Replaces the record set. An empty set leaves nothing to propagate,
    /// so the position map is emptied with it.
    fn install(&mut self, records: Vec<SatelliteRecord>) {
        self.load_state = TleLoadState::Loaded { count: records.len() };
        if records.is_empty() {
            self.positions = Arc::new(PositionMap::new());
        }
        self.records = Arc::new(records);
    }

    /// Disables tracking and invalidates any fetch in flight.
    fn shut_off(&mut self) {
        self.enabled = false;
        self.generation += 1;
        self.positions = Arc::new(PositionMap::new());
        if self.load_state == TleLoadState::Loading {
            self.load_state = if self.records.is_empty() {
                TleLoadState::NotLoaded
            } else {
                TleLoadState::Loaded { count: self.records.len() }
            };
        }
    }
}

struct Ticker {
    stop_tx: mpsc::Sender<()>,
    handle: JoinHandle<()>,
}

impl Ticker {
    fn spawn(shared: Weak<Shared>, interval: Duration) -> Self {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let handle = thread::spawn(move || loop {
            match stop_rx.recv_timeout(interval) {
                Err(RecvTimeoutError::Timeout) => {
                    let Some(shared) = shared.upgrade() else { break };
                    shared.propagate(Utc::now());
                }
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        });
        Self { stop_tx, handle }
    }

    fn stop(self) {
        let _ = self.stop_tx.send(());
        if self.handle.join().is_err() {
            warn!("propagation ticker panicked");
        }
    }
}

struct Shared {
    state: Mutex<TrackerState>,
    ticker: Mutex<Option<Ticker>>,
    /// Held for the duration of a propagation pass.
    pass: Mutex<()>,
    source: Box<dyn TleSource>,
    selection: SelectionPolicy,
    tick_interval: Duration,
}

impl Shared {
    /// One propagation pass. Returns `None` when skipped (tracking off,
    /// nothing to propagate, another pass still running) or when the
    /// group or record set changed while it ran.
    fn propagate(&self, at: DateTime<Utc>) -> Option<Arc<PositionMap>> {
        let _pass = match self.pass.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(p)) => p.into_inner(),
            Err(TryLockError::WouldBlock) => return None,
        };

        let (records, group) = {
            let state = lock(&self.state);
            if !state.enabled || state.records.is_empty() {
                return None;
            }
            (Arc::clone(&state.records), state.group)
        };

        let positions = Arc::new(propagate_positions(&records, group, at));

        let mut state = lock(&self.state);
        if !state.enabled || state.group != group || !Arc::ptr_eq(&state.records, &records) {
            return None;
        }
        state.positions = Arc::clone(&positions);
        Some(positions)
    }

    /// Starts or stops the ticker so that it runs exactly when tracking is
    /// enabled and there is something to propagate.
    fn sync_ticker(self: &Arc<Self>) {
        let mut ticker = lock(&self.ticker);
        let wanted = {
            let state = lock(&self.state);
            state.enabled && !state.records.is_empty()
        };
        match (wanted, ticker.is_some()) {
            (true, false) => {
                debug!("starting propagation ticker ({:?})", self.tick_interval);
                *ticker = Some(Ticker::spawn(Arc::downgrade(self), self.tick_interval));
            }
            (false, true) => {
                debug!("stopping propagation ticker");
                if let Some(t) = ticker.take() {
                    t.stop();
                }
            }
            _ => {}
        }
    }

    fn ingest(self: &Arc<Self>, generation: u64, group: OrbitGroup) {
        info!("fetching TLE group [{}]", group.keyword());
        let result = self.source.fetch(group).and_then(|text| {
            if text.trim().is_empty() {
                Err(TrackerError::EmptyResponse)
            } else {
                Ok(parse_tle_data_with(&text, &self.selection))
            }
        });

        {
            let mut state = lock(&self.state);
            if state.generation != generation || !state.enabled {
                debug!("discarding stale TLE response for [{}] (generation {})", group.keyword(), generation);
                return;
            }
            match result {
                Ok(records) => {
                    info!("TLE group [{}] synchronized: {} objects", group.keyword(), records.len());
                    state.install(records);
                }
                Err(e) => {
                    warn!("TLE group [{}] fetch failed: {}", group.keyword(), e);
                    state.load_state = TleLoadState::Failed(e.to_string());
                }
            }
        }
        self.sync_ticker();
    }
}

/// Handle on a background TLE fetch.
pub struct FetchHandle {
    generation: u64,
    handle: JoinHandle<()>,
}

impl FetchHandle {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Blocks until the fetch has been applied or discarded.
    pub fn wait(self) {
        if self.handle.join().is_err() {
            warn!("TLE fetch thread panicked");
        }
    }
}

pub struct Tracker {
    shared: Arc<Shared>,
    ground_track: GroundTrackConfig,
}

impl Tracker {
    pub fn new(config: TrackerConfig, source: impl TleSource + 'static) -> Self {
        let state = TrackerState {
            enabled: false,
            group: config.group,
            generation: 0,
            records: Arc::new(Vec::new()),
            positions: Arc::new(PositionMap::new()),
            load_state: TleLoadState::NotLoaded,
        };
        let shared = Shared {
            state: Mutex::new(state),
            ticker: Mutex::new(None),
            pass: Mutex::new(()),
            source: Box::new(source),
            selection: config.selection,
            tick_interval: config.tick_interval,
        };
        Self {
            shared: Arc::new(shared),
            ground_track: config.ground_track,
        }
    }

    /// Tracker fetching from the configured HTTP endpoint.
    pub fn with_http(config: TrackerConfig) -> Self {
        let source = HttpTleSource::new(config.endpoint.clone(), config.http_timeout);
        Self::new(config, source)
    }

    pub fn is_enabled(&self) -> bool {
        lock(&self.shared.state).enabled
    }

    pub fn group(&self) -> OrbitGroup {
        lock(&self.shared.state).group
    }

    pub fn load_state(&self) -> TleLoadState {
        lock(&self.shared.state).load_state.clone()
    }

    pub fn is_ticking(&self) -> bool {
        lock(&self.shared.ticker).is_some()
    }

    /// Enables tracking and starts a fetch for the current group.
    pub fn enable(&self) -> FetchHandle {
        lock(&self.shared.state).enabled = true;
        self.refresh()
    }

    /// Stops propagation and clears the position map. Any fetch still in
    /// flight is ignored when it completes. Records are kept, and so is
    /// their `Loaded` state.
    pub fn disable(&self) {
        lock(&self.shared.state).shut_off();
        self.shared.sync_ticker();
    }

    pub fn set_enabled(&self, enabled: bool) -> Option<FetchHandle> {
        if enabled {
            Some(self.enable())
        } else {
            self.disable();
            None
        }
    }

    /// Switches group. The new band applies from the next pass; a fresh
    /// fetch supersedes any in flight. Returns `None` while disabled.
    pub fn set_group(&self, group: OrbitGroup) -> Option<FetchHandle> {
        let enabled = {
            let mut state = lock(&self.shared.state);
            state.group = group;
            state.generation += 1;
            state.enabled
        };
        enabled.then(|| self.refresh())
    }

    /// Starts a new fetch generation for the current group.
    pub fn refresh(&self) -> FetchHandle {
        let (generation, group) = {
            let mut state = lock(&self.shared.state);
            state.generation += 1;
            state.load_state = TleLoadState::Loading;
            (state.generation, state.group)
        };
        let shared = Arc::clone(&self.shared);
        let handle = thread::spawn(move || shared.ingest(generation, group));
        FetchHandle { generation, handle }
    }

    /// Runs one propagation pass synchronously and publishes the result.
    pub fn propagate_now(&self, at: DateTime<Utc>) -> Option<Arc<PositionMap>> {
        self.shared.propagate(at)
    }

    /// Snapshot of the live positions for the enabled group.
    pub fn positions(&self) -> Arc<PositionMap> {
        Arc::clone(&lock(&self.shared.state).positions)
    }

    pub fn records(&self) -> Arc<Vec<SatelliteRecord>> {
        Arc::clone(&lock(&self.shared.state).records)
    }

    pub fn record(&self, catalog_id: u64) -> Option<SatelliteRecord> {
        self.records().iter().find(|r| r.catalog_id == catalog_id).cloned()
    }

    /// Predicted ground track for a tracked satellite from `start`.
    /// `None` if the satellite is not in the current record set.
    pub fn ground_track(&self, catalog_id: u64, start: DateTime<Utc>) -> Option<Result<OrbitPath, TrackerError>> {
        let record = self.record(catalog_id)?;
        Some(ground_track(&record, start, &self.ground_track))
    }

    /// Installs a record set directly, as a successful fetch would.
    pub fn load_records(&self, records: Vec<SatelliteRecord>) {
        lock(&self.shared.state).install(records);
        self.shared.sync_ticker();
    }
}

impl Drop for Tracker {
    fn drop(&mut self) {
        lock(&self.shared.state).shut_off();
        if let Some(ticker) = lock(&self.shared.ticker).take() {
            ticker.stop();
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::propagate::test::{instant, iss, GPS_TLE};
    use crate::tle::test::{ISS_LINE1, ISS_LINE2, ISS_NAME};

    fn iss_text() -> String {
        format!("{}\n{}\n{}\n", ISS_NAME, ISS_LINE1, ISS_LINE2)
    }

    fn tracker_with(text: String) -> Tracker {
        let config = TrackerConfig::default().with_tick_interval(Duration::from_secs(3600));
        Tracker::new(config, move |_: OrbitGroup| -> Result<String, TrackerError> { Ok(text.clone()) })
    }

    #[test]
    fn starts_disabled() {
        let tracker = tracker_with(iss_text());
        assert!(!tracker.is_enabled());
        assert!(!tracker.is_ticking());
        assert_eq!(tracker.load_state(), TleLoadState::NotLoaded);
        assert!(tracker.propagate_now(instant()).is_none());
        assert!(tracker.positions().is_empty());
    }

    #[test]
    fn enable_fetches_and_propagates() {
        let tracker = tracker_with(iss_text());
        tracker.enable().wait();
        assert_eq!(tracker.load_state(), TleLoadState::Loaded { count: 1 });
        assert!(tracker.is_ticking());

        let positions = tracker.propagate_now(instant()).unwrap();
        assert!(positions.contains_key(&25544));
        assert_eq!(tracker.positions(), positions);
    }

    #[test]
    fn disable_clears_positions_and_stops_ticker() {
        let tracker = tracker_with(iss_text());
        tracker.enable().wait();
        tracker.propagate_now(instant());
        assert!(!tracker.positions().is_empty());

        tracker.disable();
        assert!(!tracker.is_ticking());
        assert!(tracker.positions().is_empty());
        assert_eq!(tracker.records().len(), 1);
        assert!(tracker.propagate_now(instant()).is_none());
    }

    #[test]
    fn group_change_applies_new_band() {
        let tracker = tracker_with(iss_text());
        tracker.enable().wait();
        assert!(tracker.propagate_now(instant()).unwrap().contains_key(&25544));

        tracker.set_group(OrbitGroup::Geo).unwrap().wait();
        assert_eq!(tracker.group(), OrbitGroup::Geo);
        assert!(tracker.propagate_now(instant()).unwrap().is_empty());
    }

    #[test]
    fn set_group_while_disabled_does_not_fetch() {
        let tracker = tracker_with(iss_text());
        assert!(tracker.set_group(OrbitGroup::Meo).is_none());
        assert_eq!(tracker.load_state(), TleLoadState::NotLoaded);
        assert!(tracker.records().is_empty());
    }

    #[test]
    fn refetch_without_triplets_stops_ticker() {
        let responses = Mutex::new(vec!["no tle here\njust text\nand more\n".to_string(), iss_text()]);
        let config = TrackerConfig::default().with_tick_interval(Duration::from_secs(3600));
        let tracker = Tracker::new(config, move |_: OrbitGroup| -> Result<String, TrackerError> {
            Ok(responses.lock().unwrap().pop().unwrap_or_default())
        });

        tracker.enable().wait();
        assert_eq!(tracker.records().len(), 1);
        assert!(tracker.is_ticking());

        tracker.refresh().wait();
        assert_eq!(tracker.load_state(), TleLoadState::Loaded { count: 0 });
        assert!(tracker.records().is_empty());
        assert!(!tracker.is_ticking());
    }

    #[test]
    fn load_records_while_disabled_does_not_tick() {
        let tracker = tracker_with(iss_text());
        tracker.load_records(vec![iss()]);
        assert!(!tracker.is_ticking());
        assert!(tracker.propagate_now(instant()).is_none());
    }

    fn ticker_thread(tracker: &Tracker) -> Option<thread::ThreadId> {
        lock(&tracker.shared.ticker).as_ref().map(|t| t.handle.thread().id())
    }

    #[test]
    fn empty_refetch_after_group_change_clears_positions() {
        let responses = Mutex::new(vec!["no tle here\n".to_string(), iss_text()]);
        let config = TrackerConfig::default().with_tick_interval(Duration::from_secs(3600));
        let tracker = Tracker::new(config, move |_: OrbitGroup| -> Result<String, TrackerError> {
            Ok(responses.lock().unwrap().pop().unwrap_or_default())
        });
        tracker.enable().wait();
        assert!(tracker.propagate_now(instant()).unwrap().contains_key(&25544));

        tracker.set_group(OrbitGroup::Geo).unwrap().wait();
        assert_eq!(tracker.load_state(), TleLoadState::Loaded { count: 0 });
        assert!(!tracker.is_ticking());
        assert!(tracker.positions().is_empty());
    }

    #[test]
    fn loading_empty_records_clears_positions() {
        let tracker = tracker_with(iss_text());
        tracker.enable().wait();
        tracker.propagate_now(instant());
        assert!(!tracker.positions().is_empty());

        tracker.load_records(Vec::new());
        assert!(tracker.positions().is_empty());
        assert!(!tracker.is_ticking());
    }

    #[test]
    fn pass_in_flight_skips_concurrent_pass() {
        let tracker = tracker_with(iss_text());
        tracker.enable().wait();

        let running = tracker.shared.pass.lock().unwrap();
        assert!(tracker.propagate_now(instant()).is_none());
        assert!(tracker.positions().is_empty());
        drop(running);

        assert!(tracker.propagate_now(instant()).is_some());
    }

    #[test]
    fn ticker_starts_once() {
        let tracker = tracker_with(iss_text());
        tracker.enable().wait();
        let first = ticker_thread(&tracker).unwrap();

        tracker.enable().wait();
        tracker.load_records(vec![iss()]);
        tracker.refresh().wait();
        assert_eq!(ticker_thread(&tracker), Some(first));

        tracker.disable();
        assert_eq!(ticker_thread(&tracker), None);
        tracker.enable().wait();
        let restarted = ticker_thread(&tracker).unwrap();
        assert_ne!(restarted, first);
    }

    #[test]
    fn disable_during_refresh_keeps_loaded_state() {
        let (release_tx, release_rx) = mpsc::channel::<Result<String, TrackerError>>();
        let release_rx = Mutex::new(release_rx);
        let config = TrackerConfig::default().with_tick_interval(Duration::from_secs(3600));
        let tracker = Tracker::new(config, move |_: OrbitGroup| -> Result<String, TrackerError> {
            release_rx.lock().unwrap().recv().unwrap_or(Err(TrackerError::EmptyResponse))
        });

        release_tx.send(Ok(iss_text())).unwrap();
        tracker.enable().wait();

        let fetch = tracker.refresh();
        assert_eq!(tracker.load_state(), TleLoadState::Loading);
        tracker.disable();
        assert_eq!(tracker.load_state(), TleLoadState::Loaded { count: 1 });

        release_tx.send(Ok(String::new())).unwrap();
        fetch.wait();
        assert_eq!(tracker.load_state(), TleLoadState::Loaded { count: 1 });
    }

    #[test]
    fn fetch_finishing_after_drop_is_discarded() {
        let (release_tx, release_rx) = mpsc::channel::<Result<String, TrackerError>>();
        let release_rx = Mutex::new(release_rx);
        let config = TrackerConfig::default().with_tick_interval(Duration::from_secs(3600));
        let tracker = Tracker::new(config, move |_: OrbitGroup| -> Result<String, TrackerError> {
            release_rx.lock().unwrap().recv().unwrap_or(Err(TrackerError::EmptyResponse))
        });
        let shared = Arc::clone(&tracker.shared);

        let fetch = tracker.enable();
        drop(tracker);
        release_tx.send(Ok(iss_text())).unwrap();
        fetch.wait();

        assert!(lock(&shared.ticker).is_none());
        let state = lock(&shared.state);
        assert!(!state.enabled);
        assert!(state.records.is_empty());
    }

    #[test]
    fn ground_track_lookup() {
        let tracker = tracker_with(GPS_TLE.to_string());
        tracker.load_records(vec![iss()]);
        let path = tracker.ground_track(25544, instant()).unwrap().unwrap();
        assert_eq!(path.point_count(), 70);
        assert!(tracker.ground_track(24876, instant()).is_none());
    }
}
