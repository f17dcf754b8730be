//! Collaborator contracts for track persistence and result storage.
//!
//! The engine never talks to a database directly. Whatever persistence layer is deployed
//! implements [`TrackStore`] and [`ResultSink`]; the in-memory versions here back the tests and
//! serve as the reference semantics.

use crate::interface::area::SmugglingArea;
use crate::interface::result::ThreatResult;
use crate::interface::track::{TrackHistory, TrackPoint};
use crate::prelude::{DetectorKind, StoreError, StoreResult};
use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Mutex, RwLock};

pub trait TrackStore: Send + Sync {
    /// Timestamp of the newest report for `mmsi`, `None` when the vessel has no reports.
    fn fetch_latest_timestamp(&self, mmsi: &str) -> StoreResult<Option<DateTime<Utc>>>;

    /// Reports for `mmsi` with `from <= timestamp <= to`, newest-first.
    fn fetch_history(
        &self,
        mmsi: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StoreResult<TrackHistory>;

    fn list_distinct_vessel_ids(&self) -> StoreResult<BTreeSet<String>>;

    fn list_smuggling_areas(&self) -> StoreResult<Vec<SmugglingArea>>;

    /// Report timestamps for `mmsi`, ascending.
    fn fetch_ais_index(&self, mmsi: &str) -> StoreResult<Vec<DateTime<Utc>>>;
}

pub trait ResultSink: Send + Sync {
    fn persist_result(
        &self,
        kind: DetectorKind,
        mmsi: &str,
        result: &ThreatResult,
    ) -> StoreResult<()>;
}

fn poisoned() -> StoreError {
    StoreError::Unavailable("lock poisoned".into())
}

/// Track store held entirely in memory. Per-vessel reports are kept ascending by time.
#[derive(Debug, Default)]
pub struct MemoryTrackStore {
    tracks: RwLock<HashMap<String, Vec<TrackPoint>>>,
    areas: RwLock<Vec<SmugglingArea>>,
}

impl MemoryTrackStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_points<I: IntoIterator<Item = TrackPoint>>(points: I) -> Self {
        let store = Self::new();
        store.replace_points(points);
        store
    }

    pub fn insert(&self, point: TrackPoint) {
        if let Ok(mut tracks) = self.tracks.write() {
            let track = tracks.entry(point.mmsi.clone()).or_default();
            let at = track.partition_point(|p| p.timestamp <= point.timestamp);
            track.insert(at, point);
        }
    }

    /// Swaps the whole track population in one step.
    pub fn replace_points<I: IntoIterator<Item = TrackPoint>>(&self, points: I) {
        let mut grouped: HashMap<String, Vec<TrackPoint>> = HashMap::new();
        for point in points {
            grouped.entry(point.mmsi.clone()).or_default().push(point);
        }
        for track in grouped.values_mut() {
            track.sort_by_key(|p| p.timestamp);
        }
        if let Ok(mut tracks) = self.tracks.write() {
            *tracks = grouped;
        }
    }

    pub fn set_areas(&self, areas: Vec<SmugglingArea>) {
        if let Ok(mut current) = self.areas.write() {
            *current = areas;
        }
    }
}

impl TrackStore for MemoryTrackStore {
    fn fetch_latest_timestamp(&self, mmsi: &str) -> StoreResult<Option<DateTime<Utc>>> {
        let tracks = self.tracks.read().map_err(|_| poisoned())?;
        Ok(tracks
            .get(mmsi)
            .and_then(|track| track.last())
            .map(|p| p.timestamp))
    }

    fn fetch_history(
        &self,
        mmsi: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StoreResult<TrackHistory> {
        let tracks = self.tracks.read().map_err(|_| poisoned())?;
        let points = tracks
            .get(mmsi)
            .map(|track| {
                track
                    .iter()
                    .filter(|p| p.timestamp >= from && p.timestamp <= to)
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        Ok(TrackHistory::from_unordered(points))
    }

    fn list_distinct_vessel_ids(&self) -> StoreResult<BTreeSet<String>> {
        let tracks = self.tracks.read().map_err(|_| poisoned())?;
        Ok(tracks.keys().cloned().collect())
    }

    fn list_smuggling_areas(&self) -> StoreResult<Vec<SmugglingArea>> {
        let areas = self.areas.read().map_err(|_| poisoned())?;
        Ok(areas.clone())
    }

    fn fetch_ais_index(&self, mmsi: &str) -> StoreResult<Vec<DateTime<Utc>>> {
        let tracks = self.tracks.read().map_err(|_| poisoned())?;
        Ok(tracks
            .get(mmsi)
            .map(|track| track.iter().map(|p| p.timestamp).collect())
            .unwrap_or_default())
    }
}

/// Append-only result sink held in memory.
#[derive(Debug, Default)]
pub struct MemoryResultSink {
    records: Mutex<Vec<(DetectorKind, String, ThreatResult)>>,
}

impl MemoryResultSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<(DetectorKind, String, ThreatResult)> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ResultSink for MemoryResultSink {
    fn persist_result(
        &self,
        kind: DetectorKind,
        mmsi: &str,
        result: &ThreatResult,
    ) -> StoreResult<()> {
        let mut records = self.records.lock().map_err(|_| poisoned())?;
        records.push((kind, mmsi.to_string(), result.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn point(mmsi: &str, minute: i64) -> TrackPoint {
        let base = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        TrackPoint::new(mmsi, base + Duration::minutes(minute), 23.0, 120.0)
    }

    #[test]
    fn memory_store_answers_history_newest_first() {
        let store = MemoryTrackStore::with_points(vec![
            point("a", 0),
            point("a", 12),
            point("a", 6),
            point("b", 3),
        ]);

        let latest = store.fetch_latest_timestamp("a").unwrap().unwrap();
        assert_eq!(latest, point("a", 12).timestamp);

        let history = store
            .fetch_history("a", point("a", 6).timestamp, latest)
            .unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history.latest().unwrap().timestamp, latest);

        let ids: Vec<_> = store.list_distinct_vessel_ids().unwrap().into_iter().collect();
        assert_eq!(ids, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn memory_store_index_is_ascending() {
        let store = MemoryTrackStore::new();
        store.insert(point("a", 10));
        store.insert(point("a", 0));
        store.insert(point("a", 5));

        let index = store.fetch_ais_index("a").unwrap();
        assert!(index.windows(2).all(|w| w[0] <= w[1]));
        assert!(store.fetch_ais_index("missing").unwrap().is_empty());
        assert_eq!(store.fetch_latest_timestamp("missing").unwrap(), None);
    }
}
