use crate::math::circle::{Circle, GeoPoint};
use crate::prelude::DetectorKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Analysis window reported with every result. Both ends are absent when the history was empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeWindow {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

/// Write-once output of a single detector run for a single vessel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreatResult {
    pub mmsi: String,
    /// Always within `[0, 1]`, rounded to two decimals.
    pub risk_score: f64,
    pub time_window: TimeWindow,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub details: ThreatDetails,
}

impl ThreatResult {
    pub fn new(
        mmsi: impl Into<String>,
        risk_score: f64,
        time_window: TimeWindow,
        message: impl Into<String>,
        details: ThreatDetails,
    ) -> Self {
        Self {
            mmsi: mmsi.into(),
            risk_score,
            time_window,
            message: message.into(),
            created_at: Utc::now(),
            details,
        }
    }

    pub fn kind(&self) -> DetectorKind {
        match self.details {
            ThreatDetails::AisSwitch(_) => DetectorKind::AisSwitch,
            ThreatDetails::Loitering(_) => DetectorKind::Loitering,
            ThreatDetails::Meandering(_) => DetectorKind::Meandering,
            ThreatDetails::SpeedDrop(_) => DetectorKind::SpeedDrop,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "detector", rename_all = "camelCase")]
pub enum ThreatDetails {
    AisSwitch(AisSwitchDetails),
    Loitering(LoiteringDetails),
    Meandering(MeanderingDetails),
    SpeedDrop(SpeedDropDetails),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AisSwitchDetails {
    pub total_normal_points: usize,
    pub missing_count_in_area: usize,
    pub missing_ratio: f64,
    pub p_free: f64,
    pub p_full: f64,
    pub affected_areas: Vec<AffectedArea>,
}

/// Per-geofence breakdown of interpolated reports that were never received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AffectedArea {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub center: GeoPoint,
    pub radius_km: f64,
    pub earliest_anomaly_time: DateTime<Utc>,
    pub missing_count: usize,
    pub missing_ratio: f64,
    pub total_missing_time_minutes: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoiteringDetails {
    pub start_time: Option<DateTime<Utc>>,
    pub loiter_time_minutes: f64,
    pub t0: f64,
    pub t1: f64,
    pub loiter_area: Option<Circle>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeanderingDetails {
    pub meandering_count: usize,
    pub total_meandering_duration: f64,
    pub total_meandering_score: f64,
    pub f_crit: f64,
    pub segments: Vec<MeanderSegment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeanderSegment {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub location: Circle,
    pub duration_minutes: f64,
    pub point_count: usize,
    pub sum_delta_c: f64,
    pub sum_s: f64,
    /// Bounding-box area in square nautical miles.
    pub bounding_box_area: f64,
    pub core_score: f64,
    pub risk_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeedDropDetails {
    pub drop_count: usize,
    pub total_drop_acceleration: f64,
    pub a_free: f64,
    pub a_full: f64,
    pub drop_events: Vec<DropEvent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropEvent {
    pub location: GeoPoint,
    pub time: DateTime<Utc>,
    /// Deceleration in knots per second.
    pub acceleration: f64,
    pub score: f64,
}
