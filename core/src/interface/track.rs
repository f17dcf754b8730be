use crate::interface::result::TimeWindow;
use crate::prelude::TrackError;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// One AIS position report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    pub mmsi: String,
    pub timestamp: DateTime<Utc>,
    pub lat: f64,
    pub lon: f64,
    /// Speed over ground in knots.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sog: Option<f64>,
    /// Course over ground in degrees.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cog: Option<f64>,
}

impl TrackPoint {
    pub fn new(mmsi: impl Into<String>, timestamp: DateTime<Utc>, lat: f64, lon: f64) -> Self {
        Self {
            mmsi: mmsi.into(),
            timestamp,
            lat,
            lon,
            sog: None,
            cog: None,
        }
    }

    pub fn with_motion(mut self, sog: f64, cog: f64) -> Self {
        self.sog = Some(sog);
        self.cog = Some(cog);
        self
    }

    /// Speed over ground, missing values read as 0.
    pub fn speed(&self) -> f64 {
        self.sog.unwrap_or(0.0)
    }

    /// Course over ground, missing values read as 0.
    pub fn course(&self) -> f64 {
        self.cog.unwrap_or(0.0)
    }
}

/// Track of a single vessel ordered newest-first with strictly decreasing timestamps.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrackHistory {
    points: Vec<TrackPoint>,
}

impl TrackHistory {
    /// Wraps points that are already newest-first.
    pub fn new(points: Vec<TrackPoint>) -> Result<Self, TrackError> {
        if let Some(index) = points
            .windows(2)
            .position(|pair| pair[0].timestamp <= pair[1].timestamp)
        {
            return Err(TrackError::NotNewestFirst {
                index: index + 1,
                newer: points[index].timestamp,
                older: points[index + 1].timestamp,
            });
        }
        Ok(Self { points })
    }

    /// Sorts arbitrary points newest-first, keeping the first of any duplicate timestamps.
    pub fn from_unordered(mut points: Vec<TrackPoint>) -> Self {
        points.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        points.dedup_by(|later, earlier| later.timestamp == earlier.timestamp);
        Self { points }
    }

    pub fn points(&self) -> &[TrackPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn latest(&self) -> Option<&TrackPoint> {
        self.points.first()
    }

    /// Vessel identifier of the newest point, empty for an empty history.
    pub fn mmsi(&self) -> &str {
        self.latest().map(|p| p.mmsi.as_str()).unwrap_or_default()
    }

    /// Leading points whose timestamp is no older than `minutes` before the latest point.
    pub fn within(&self, minutes: f64) -> &[TrackPoint] {
        let Some(start) = self.window_start(minutes) else {
            return &[];
        };
        let end = self.points.partition_point(|p| p.timestamp >= start);
        &self.points[..end]
    }

    /// Window of `minutes` ending at the latest point.
    pub fn window(&self, minutes: f64) -> TimeWindow {
        TimeWindow {
            start: self.window_start(minutes),
            end: self.latest().map(|p| p.timestamp),
        }
    }

    fn window_start(&self, minutes: f64) -> Option<DateTime<Utc>> {
        self.latest()
            .map(|p| minutes_before(p.timestamp, minutes))
    }
}

/// Secondary-sensor sighting used by the dark-vessel correlator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RfDetection {
    pub mmsi_candidate: String,
    pub timestamp_utc: DateTime<Utc>,
    pub lat: f64,
    pub lon: f64,
}

/// Saturates at the largest representable duration; NaN reads as zero.
pub fn minutes_to_duration(minutes: f64) -> Duration {
    let millis = (minutes * 60_000.0).round() as i64;
    Duration::milliseconds(millis.max(-i64::MAX))
}

/// The instant `minutes` before `at`, clamped to the calendar range chrono can represent.
pub fn minutes_before(at: DateTime<Utc>, minutes: f64) -> DateTime<Utc> {
    match at.checked_sub_signed(minutes_to_duration(minutes)) {
        Some(start) => start,
        None if minutes > 0.0 => DateTime::<Utc>::MIN_UTC,
        None => DateTime::<Utc>::MAX_UTC,
    }
}

pub fn duration_to_minutes(duration: Duration) -> f64 {
    duration.num_milliseconds() as f64 / 60_000.0
}
