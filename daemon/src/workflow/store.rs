use chrono::{DateTime, Utc};
use log::debug;
use serde::de::DeserializeOwned;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use threatcore::interface::{MemoryTrackStore, SmugglingArea, TrackHistory, TrackPoint, TrackStore};
use threatcore::prelude::{StoreError, StoreResult};

/// Track store backed by JSON files on disk.
///
/// The files are read again whenever the scheduler starts a run (area listing and vessel
/// enumeration), so edits made between runs are picked up without a restart.
pub struct JsonFileStore {
    tracks_path: PathBuf,
    areas_path: Option<PathBuf>,
    cache: MemoryTrackStore,
}

impl JsonFileStore {
    pub fn open(tracks_path: impl Into<PathBuf>, areas_path: Option<PathBuf>) -> StoreResult<Self> {
        let store = Self {
            tracks_path: tracks_path.into(),
            areas_path,
            cache: MemoryTrackStore::new(),
        };
        store.reload_tracks()?;
        Ok(store)
    }

    pub fn reload_tracks(&self) -> StoreResult<usize> {
        let points: Vec<TrackPoint> = read_json(&self.tracks_path)?;
        let count = points.len();
        self.cache.replace_points(points);
        debug!("loaded {} track points from {}", count, self.tracks_path.display());
        Ok(count)
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> StoreResult<T> {
    let contents = fs::read_to_string(path)?;
    serde_json::from_str(&contents)
        .map_err(|err| StoreError::Malformed(format!("{}: {}", path.display(), err)))
}

impl TrackStore for JsonFileStore {
    fn fetch_latest_timestamp(&self, mmsi: &str) -> StoreResult<Option<DateTime<Utc>>> {
        self.cache.fetch_latest_timestamp(mmsi)
    }

    fn fetch_history(
        &self,
        mmsi: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StoreResult<TrackHistory> {
        self.cache.fetch_history(mmsi, from, to)
    }

    fn list_distinct_vessel_ids(&self) -> StoreResult<BTreeSet<String>> {
        self.reload_tracks()?;
        self.cache.list_distinct_vessel_ids()
    }

    fn list_smuggling_areas(&self) -> StoreResult<Vec<SmugglingArea>> {
        match &self.areas_path {
            Some(path) => read_json(path),
            None => Ok(Vec::new()),
        }
    }

    fn fetch_ais_index(&self, mmsi: &str) -> StoreResult<Vec<DateTime<Utc>>> {
        self.cache.fetch_ais_index(mmsi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const TRACKS: &str = r#"[
        {"mmsi": "416000001", "timestamp": "2024-03-01T12:00:00Z", "lat": 23.0, "lon": 120.0, "sog": 4.5, "cog": 90.0},
        {"mmsi": "416000001", "timestamp": "2024-03-01T12:06:00Z", "lat": 23.01, "lon": 120.0},
        {"mmsi": "416000002", "timestamp": "2024-03-01T11:00:00Z", "lat": 24.0, "lon": 121.0}
    ]"#;

    fn temp_json(contents: &str) -> NamedTempFile {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(contents.as_bytes()).unwrap();
        temp
    }

    #[test]
    fn store_serves_tracks_from_json() {
        let tracks = temp_json(TRACKS);
        let store = JsonFileStore::open(tracks.path(), None).unwrap();

        let ids = store.list_distinct_vessel_ids().unwrap();
        assert_eq!(ids.len(), 2);

        let latest = store.fetch_latest_timestamp("416000001").unwrap().unwrap();
        assert_eq!(latest.to_rfc3339(), "2024-03-01T12:06:00+00:00");

        let history = store
            .fetch_history("416000001", latest - chrono::Duration::hours(1), latest)
            .unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history.points()[1].sog, Some(4.5));
        assert!(store.list_smuggling_areas().unwrap().is_empty());
    }

    #[test]
    fn areas_are_reread_on_every_listing() {
        let tracks = temp_json(TRACKS);
        let areas = temp_json(r#"[{"name": "penghu", "centerLat": 23.5, "centerLon": 119.6, "radiusKm": 20}]"#);
        let store = JsonFileStore::open(tracks.path(), Some(areas.path().to_path_buf())).unwrap();

        let first = store.list_smuggling_areas().unwrap();
        assert_eq!(first[0].name.as_deref(), Some("penghu"));

        fs::write(areas.path(), "[]").unwrap();
        assert!(store.list_smuggling_areas().unwrap().is_empty());
    }

    #[test]
    fn malformed_tracks_are_reported() {
        let tracks = temp_json("{ not json");
        let err = JsonFileStore::open(tracks.path(), None).err().unwrap();
        assert!(matches!(err, StoreError::Malformed(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = JsonFileStore::open("/nonexistent/tracks.json", None)
            .err()
            .unwrap();
        assert!(matches!(err, StoreError::Io(_)));
    }
}
