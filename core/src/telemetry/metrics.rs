use serde::Serialize;
use std::sync::Mutex;

pub struct MetricsRecorder {
    inner: Mutex<BatchReport>,
}

/// Counters for one batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub vessels_seen: usize,
    pub vessels_processed: usize,
    pub vessels_skipped: usize,
    pub vessels_failed: usize,
    pub results_persisted: usize,
    /// True when shutdown stopped the run before every vessel was visited.
    pub interrupted: bool,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(BatchReport::default()),
        }
    }

    fn update(&self, apply: impl FnOnce(&mut BatchReport)) {
        if let Ok(mut report) = self.inner.lock() {
            apply(&mut report);
        }
    }

    pub fn record_seen(&self, count: usize) {
        self.update(|r| r.vessels_seen = count);
    }

    pub fn record_processed(&self) {
        self.update(|r| r.vessels_processed += 1);
    }

    pub fn record_skipped(&self) {
        self.update(|r| r.vessels_skipped += 1);
    }

    pub fn record_failed(&self) {
        self.update(|r| r.vessels_failed += 1);
    }

    pub fn record_persisted(&self) {
        self.update(|r| r.results_persisted += 1);
    }

    pub fn record_interrupted(&self) {
        self.update(|r| r.interrupted = true);
    }

    pub fn snapshot(&self) -> BatchReport {
        self.inner.lock().map(|r| *r).unwrap_or_default()
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}
