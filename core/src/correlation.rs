//! Dark-vessel correlation of RF sightings against the AIS report index.

use crate::interface::store::TrackStore;
use crate::interface::track::{minutes_before, RfDetection};
use crate::math::geo::{GeoHelper, KM_PER_NM};
use crate::prelude::StoreResult;
use chrono::{DateTime, Duration, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Candidate label the RF pipeline uses when it could not associate a sighting.
pub const UNCORRELATED: &str = "uncorrelated";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrelatorConfig {
    /// Largest gap between an RF sighting and an AIS report that still counts as a match.
    pub window_ms: i64,
    /// How far back from the newest sighting `screen` looks.
    pub lookback_minutes: f64,
}

impl Default for CorrelatorConfig {
    fn default() -> Self {
        Self {
            window_ms: 360_000,
            lookback_minutes: 360.0,
        }
    }
}

/// Circle an operator screens for suspicious sightings. The radius is in nautical miles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreeningQuery {
    pub center_lat: f64,
    pub center_lon: f64,
    pub radius_nm: f64,
}

impl ScreeningQuery {
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        GeoHelper::distance_km(self.center_lat, self.center_lon, lat, lon)
            <= self.radius_nm * KM_PER_NM
    }
}

/// One screened sighting. `ais_flag` is true when an AIS report backs it up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationReport {
    pub mmsi: String,
    pub timestamp: DateTime<Utc>,
    pub lat: f64,
    pub lon: f64,
    pub ais_flag: bool,
}

pub struct DarkVesselCorrelator {
    config: CorrelatorConfig,
}

impl DarkVesselCorrelator {
    pub fn new(config: CorrelatorConfig) -> Self {
        Self { config }
    }

    pub fn window(&self) -> Duration {
        Duration::milliseconds(self.config.window_ms.max(0))
    }

    /// True when no report in the ascending `ais_index` lies within the window of `rf_time`.
    pub fn is_dark(&self, rf_time: DateTime<Utc>, ais_index: &[DateTime<Utc>]) -> bool {
        let insert_at = ais_index.partition_point(|t| *t < rf_time);
        let after = ais_index.get(insert_at);
        let before = insert_at.checked_sub(1).and_then(|i| ais_index.get(i));

        let nearest = [before, after]
            .into_iter()
            .flatten()
            .map(|t| (*t - rf_time).abs())
            .min();

        match nearest {
            Some(delta) => delta > self.window(),
            None => true,
        }
    }

    /// Screens recent RF sightings inside `query` and flags each one against its candidate's
    /// AIS index. Only the newest sighting per candidate is reported.
    pub fn screen(
        &self,
        detections: &[RfDetection],
        store: &dyn TrackStore,
        query: &ScreeningQuery,
    ) -> StoreResult<Vec<CorrelationReport>> {
        let mut candidates: Vec<&RfDetection> = detections
            .iter()
            .filter(|d| !d.mmsi_candidate.is_empty() && d.mmsi_candidate != UNCORRELATED)
            .collect();
        candidates.sort_by(|a, b| b.timestamp_utc.cmp(&a.timestamp_utc));

        let Some(anchor) = candidates.first().map(|d| d.timestamp_utc) else {
            return Ok(Vec::new());
        };
        let since = minutes_before(anchor, self.config.lookback_minutes);

        let mut seen = HashSet::new();
        let mut reports = Vec::new();
        for detection in candidates {
            if detection.timestamp_utc < since {
                break;
            }
            if !seen.insert(detection.mmsi_candidate.as_str()) {
                continue;
            }
            if !query.contains(detection.lat, detection.lon) {
                continue;
            }

            let index = store.fetch_ais_index(&detection.mmsi_candidate)?;
            let dark = self.is_dark(detection.timestamp_utc, &index);
            debug!(
                "rf sighting {} at {} dark={}",
                detection.mmsi_candidate, detection.timestamp_utc, dark
            );
            reports.push(CorrelationReport {
                mmsi: detection.mmsi_candidate.clone(),
                timestamp: detection.timestamp_utc,
                lat: detection.lat,
                lon: detection.lon,
                ais_flag: !dark,
            });
        }

        Ok(reports)
    }
}

impl Default for DarkVesselCorrelator {
    fn default() -> Self {
        Self::new(CorrelatorConfig::default())
    }
}
