use crate::interface::result::ThreatResult;
use crate::interface::track::TrackHistory;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The four behavioural detectors run by the batch scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DetectorKind {
    AisSwitch,
    Loitering,
    Meandering,
    SpeedDrop,
}

impl DetectorKind {
    pub const ALL: [DetectorKind; 4] = [
        DetectorKind::AisSwitch,
        DetectorKind::Loitering,
        DetectorKind::Meandering,
        DetectorKind::SpeedDrop,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            DetectorKind::AisSwitch => "aisSwitch",
            DetectorKind::Loitering => "loitering",
            DetectorKind::Meandering => "meandering",
            DetectorKind::SpeedDrop => "speedDrop",
        }
    }
}

impl fmt::Display for DetectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Track ordering violations.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum TrackError {
    #[error("track point {index} ({older}) is not older than its predecessor ({newer})")]
    NotNewestFirst {
        index: usize,
        newer: DateTime<Utc>,
        older: DateTime<Utc>,
    },
}

/// Failures reported by track stores and result sinks.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("malformed record: {0}")]
    Malformed(String),
    #[error(transparent)]
    Track(#[from] TrackError),
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Failures that abort a whole batch run. Per-vessel faults never surface here.
#[derive(thiserror::Error, Debug)]
pub enum SchedulerError {
    #[error("a batch run is already in progress")]
    AlreadyRunning,
    #[error("loading smuggling areas failed: {0}")]
    AreaLoad(#[source] StoreError),
    #[error("listing vessels failed: {0}")]
    VesselListing(#[source] StoreError),
}

/// A behavioural detector scoring one vessel history.
///
/// Implementations are pure: they never perform I/O and never fail. Degenerate input yields a
/// zero score with an explanatory message.
pub trait ThreatDetector {
    fn kind(&self) -> DetectorKind;
    fn assess(&self, history: &TrackHistory) -> ThreatResult;
}
