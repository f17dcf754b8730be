use crate::detectors::{
    AisGapConfig, AisGapDetector, LoiteringDetector, MeanderingDetector, SpeedDropDetector,
};
use crate::interface::area::SmugglingArea;
use crate::interface::store::{ResultSink, TrackStore};
use crate::interface::track::minutes_before;
use crate::prelude::{SchedulerError, StoreResult, ThreatDetector};
use crate::scheduler::config::SchedulerConfig;
use crate::scheduler::state::SchedulerState;
use crate::telemetry::{BatchReport, LogManager, MetricsRecorder};
use chrono::Utc;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tokio::time::{self, Instant, MissedTickBehavior};

type Stage = (Box<dyn ThreatDetector>, f64);

fn stage(detector: impl ThreatDetector + 'static, lookback_minutes: f64) -> Stage {
    (Box::new(detector), lookback_minutes)
}

enum VesselOutcome {
    Scored,
    NoReports,
}

/// Clears the running flag however the batch ends.
struct RunGuard<'a> {
    state: &'a Mutex<SchedulerState>,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        lock_state(self.state).finish();
    }
}

/// The state is plain data, so a poisoned lock still holds a usable value.
fn lock_state(state: &Mutex<SchedulerState>) -> MutexGuard<'_, SchedulerState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct Scheduler {
    store: Arc<dyn TrackStore>,
    sink: Arc<dyn ResultSink>,
    config: SchedulerConfig,
    state: Mutex<SchedulerState>,
    log: LogManager,
}

impl Scheduler {
    pub fn new(
        store: Arc<dyn TrackStore>,
        sink: Arc<dyn ResultSink>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            store,
            sink,
            config,
            state: Mutex::new(SchedulerState::default()),
            log: LogManager::new(),
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn state(&self) -> SchedulerState {
        lock_state(&self.state).clone()
    }

    /// One batch over every vessel the store knows.
    pub fn run_batch(&self) -> Result<BatchReport, SchedulerError> {
        self.execute(None, None)
    }

    /// One batch restricted to `vessels`, in the given order.
    pub fn run_batch_for(&self, vessels: &[String]) -> Result<BatchReport, SchedulerError> {
        self.execute(Some(vessels), None)
    }

    /// Runs a batch after the startup delay, then one per interval until `shutdown` turns true
    /// or its sender goes away. A run in progress stops at the next vessel boundary.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let period = self.config.interval();
        let started = Instant::now();
        self.log.record(&format!(
            "scheduler started, first run in {:?}, interval {:?}",
            self.config.startup_delay(),
            period
        ));

        // Only a true value or a dropped sender cuts the startup delay short.
        let first_run = time::sleep(self.config.startup_delay());
        tokio::pin!(first_run);
        loop {
            tokio::select! {
                _ = &mut first_run => break,
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        self.log.record("scheduler stopped before the first run");
                        return;
                    }
                }
            }
        }
        self.tick(&shutdown).await;

        let first_tick = started.checked_add(period).unwrap_or_else(Instant::now);
        let mut ticker = time::interval_at(first_tick, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                _ = ticker.tick() => self.tick(&shutdown).await,
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
        self.log.record("scheduler stopped");
    }

    async fn tick(self: &Arc<Self>, shutdown: &watch::Receiver<bool>) {
        let scheduler = Arc::clone(self);
        let shutdown = shutdown.clone();
        let handle =
            tokio::task::spawn_blocking(move || scheduler.execute(None, Some(&shutdown)));
        if let Err(err) = handle.await {
            self.log.fault(&format!("batch task aborted: {}", err));
        }
    }

    fn execute(
        &self,
        vessels: Option<&[String]>,
        shutdown: Option<&watch::Receiver<bool>>,
    ) -> Result<BatchReport, SchedulerError> {
        let _guard = self.begin()?;
        let result = self.run_vessels(vessels, shutdown);
        match &result {
            Ok(report) => self.log.record(&format!(
                "batch finished: {} seen, {} processed, {} skipped, {} failed, {} results{}",
                report.vessels_seen,
                report.vessels_processed,
                report.vessels_skipped,
                report.vessels_failed,
                report.results_persisted,
                if report.interrupted { " (interrupted)" } else { "" }
            )),
            Err(err) => self.log.fault(&format!("batch aborted: {}", err)),
        }
        result
    }

    fn begin(&self) -> Result<RunGuard<'_>, SchedulerError> {
        let mut state = lock_state(&self.state);
        if !state.try_begin(Utc::now()) {
            self.log.fault("previous batch still running, skipping this trigger");
            return Err(SchedulerError::AlreadyRunning);
        }
        Ok(RunGuard { state: &self.state })
    }

    fn run_vessels(
        &self,
        vessels: Option<&[String]>,
        shutdown: Option<&watch::Receiver<bool>>,
    ) -> Result<BatchReport, SchedulerError> {
        let stored = self
            .store
            .list_smuggling_areas()
            .map_err(SchedulerError::AreaLoad)?;
        let areas = self.config.effective_areas(stored);

        let vessels: Vec<String> = match vessels {
            Some(list) => list.to_vec(),
            None => self
                .store
                .list_distinct_vessel_ids()
                .map_err(SchedulerError::VesselListing)?
                .into_iter()
                .collect(),
        };

        self.log.record(&format!(
            "batch started: {} vessels, {} smuggling areas",
            vessels.len(),
            areas.len()
        ));

        let stages = self.stages(areas);
        let metrics = MetricsRecorder::new();
        metrics.record_seen(vessels.len());

        for mmsi in &vessels {
            if shutdown.map_or(false, |rx| *rx.borrow()) {
                metrics.record_interrupted();
                break;
            }
            match self.process_vessel(mmsi, &stages, &metrics) {
                Ok(VesselOutcome::Scored) => {
                    metrics.record_processed();
                    self.log.trace_vessel(mmsi, "scored");
                }
                Ok(VesselOutcome::NoReports) => {
                    metrics.record_skipped();
                    self.log.warn_vessel(mmsi, "no reports found, skipping");
                }
                Err(err) => {
                    metrics.record_failed();
                    self.log.warn_vessel(mmsi, &format!("processing failed: {}", err));
                }
            }
        }

        Ok(metrics.snapshot())
    }

    fn stages(&self, areas: Vec<SmugglingArea>) -> Vec<Stage> {
        let lookbacks = &self.config.lookbacks;
        let ais_gap = AisGapConfig {
            smuggling_areas: areas,
            ..self.config.ais_gap.clone()
        };
        vec![
            stage(AisGapDetector::new(ais_gap), lookbacks.ais_switch_minutes),
            stage(
                LoiteringDetector::new(self.config.loitering.clone()),
                lookbacks.loitering_minutes,
            ),
            stage(
                MeanderingDetector::new(self.config.meandering.clone()),
                lookbacks.meandering_minutes,
            ),
            stage(
                SpeedDropDetector::new(self.config.speed_drop.clone()),
                lookbacks.speed_drop_minutes,
            ),
        ]
    }

    fn process_vessel(
        &self,
        mmsi: &str,
        stages: &[Stage],
        metrics: &MetricsRecorder,
    ) -> StoreResult<VesselOutcome> {
        let Some(latest) = self.store.fetch_latest_timestamp(mmsi)? else {
            return Ok(VesselOutcome::NoReports);
        };

        for (detector, lookback_minutes) in stages {
            let from = minutes_before(latest, *lookback_minutes);
            let history = self.store.fetch_history(mmsi, from, latest)?;
            let mut result = detector.assess(&history);
            result.mmsi = mmsi.to_string();
            self.sink.persist_result(detector.kind(), mmsi, &result)?;
            metrics.record_persisted();
        }

        Ok(VesselOutcome::Scored)
    }
}
