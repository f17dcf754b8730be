use chrono::{DateTime, Utc};
use serde::Serialize;

/// Idle/Running state of the batch scheduler.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SchedulerState {
    pub last_run_at: Option<DateTime<Utc>>,
    pub is_running: bool,
    pub run_count: u64,
}

impl SchedulerState {
    /// Moves Idle to Running. Returns false, leaving the state untouched, when a run is active.
    pub fn try_begin(&mut self, now: DateTime<Utc>) -> bool {
        if self.is_running {
            return false;
        }
        self.is_running = true;
        self.last_run_at = Some(now);
        self.run_count += 1;
        true
    }

    pub fn finish(&mut self) {
        self.is_running = false;
    }
}
