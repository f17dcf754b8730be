use crate::interface::area::SmugglingArea;
use crate::interface::result::{
    AffectedArea, AisSwitchDetails, ThreatDetails, ThreatResult, TimeWindow,
};
use crate::interface::track::{duration_to_minutes, TrackHistory};
use crate::math::stats::StatsHelper;
use crate::prelude::{DetectorKind, ThreatDetector};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Nominal AIS reporting period assumed when counting reports that never arrived.
pub const AIS_REPORT_PERIOD_MINUTES: f64 = 6.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AisGapConfig {
    pub smuggling_areas: Vec<SmugglingArea>,
    pub lookback_minutes: f64,
    pub p_free: f64,
    pub p_full: f64,
}

impl Default for AisGapConfig {
    fn default() -> Self {
        Self {
            smuggling_areas: Vec::new(),
            lookback_minutes: 24.0 * 60.0,
            p_free: 0.05,
            p_full: 0.3,
        }
    }
}

/// Scores AIS silence inside smuggling geofences.
pub struct AisGapDetector {
    config: AisGapConfig,
}

impl AisGapDetector {
    pub fn new(config: AisGapConfig) -> Self {
        Self { config }
    }
}

impl ThreatDetector for AisGapDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::AisSwitch
    }

    fn assess(&self, history: &TrackHistory) -> ThreatResult {
        compute(history, &self.config)
    }
}

struct AreaTally<'a> {
    area: &'a SmugglingArea,
    missing: usize,
    earliest: Option<DateTime<Utc>>,
    missing_minutes: f64,
}

impl<'a> AreaTally<'a> {
    fn new(area: &'a SmugglingArea) -> Self {
        Self {
            area,
            missing: 0,
            earliest: None,
            missing_minutes: 0.0,
        }
    }

    fn record(&mut self, at: DateTime<Utc>) {
        self.missing += 1;
        self.missing_minutes += AIS_REPORT_PERIOD_MINUTES;
        self.earliest = Some(self.earliest.map_or(at, |earliest| earliest.min(at)));
    }
}

/// Interpolates the reports that should have been received between consecutive fixes and
/// scores the share of them that fall inside any smuggling area.
pub fn compute(history: &TrackHistory, config: &AisGapConfig) -> ThreatResult {
    if history.len() < 2 {
        return quiet(history, TimeWindow::default(), history.len(), config, "Insufficient data");
    }

    let window = history.window(config.lookback_minutes);
    let points = history.within(config.lookback_minutes);
    if points.len() < 2 {
        return quiet(
            history,
            window,
            points.len(),
            config,
            "Insufficient data in time window",
        );
    }

    let mut tallies: Vec<AreaTally> = config.smuggling_areas.iter().map(AreaTally::new).collect();
    let mut missing_in_area = 0usize;

    for pair in points.windows(2) {
        let (newer, older) = (&pair[0], &pair[1]);
        let gap = newer.timestamp - older.timestamp;
        let expected = (duration_to_minutes(gap) / AIS_REPORT_PERIOD_MINUTES).floor() as i64;
        let virtual_count = (expected - 1).max(0) as usize;

        for k in 1..=virtual_count {
            let fraction = k as f64 / (virtual_count + 1) as f64;
            let lat = older.lat + (newer.lat - older.lat) * fraction;
            let lon = older.lon + (newer.lon - older.lon) * fraction;
            let at = older.timestamp
                + Duration::milliseconds((gap.num_milliseconds() as f64 * fraction).round() as i64);

            let mut in_any_area = false;
            for tally in tallies.iter_mut().filter(|t| t.area.contains(lat, lon)) {
                tally.record(at);
                in_any_area = true;
            }
            if in_any_area {
                missing_in_area += 1;
            }
        }
    }

    let total_normal = points.len();
    let ratio = missing_ratio(missing_in_area, total_normal);
    let score = StatsHelper::ramp(ratio, config.p_free, config.p_full);

    let affected_areas = tallies
        .into_iter()
        .filter_map(|tally| {
            let earliest = tally.earliest?;
            Some(AffectedArea {
                name: tally.area.name.clone(),
                center: tally.area.center(),
                radius_km: tally.area.radius_km,
                earliest_anomaly_time: earliest,
                missing_count: tally.missing,
                missing_ratio: StatsHelper::round_to(missing_ratio(tally.missing, total_normal), 4),
                total_missing_time_minutes: tally.missing_minutes,
            })
        })
        .collect();

    let message = if score > 0.0 {
        "AIS gap detected in smuggling area"
    } else {
        "Normal"
    };

    ThreatResult::new(
        history.mmsi(),
        StatsHelper::round_to(score, 2),
        window,
        message,
        ThreatDetails::AisSwitch(AisSwitchDetails {
            total_normal_points: total_normal,
            missing_count_in_area: missing_in_area,
            missing_ratio: StatsHelper::round_to(ratio, 4),
            p_free: config.p_free,
            p_full: config.p_full,
            affected_areas,
        }),
    )
}

fn missing_ratio(missing: usize, normal: usize) -> f64 {
    let denominator = normal + missing;
    if denominator == 0 {
        0.0
    } else {
        missing as f64 / denominator as f64
    }
}

fn quiet(
    history: &TrackHistory,
    window: TimeWindow,
    total_normal: usize,
    config: &AisGapConfig,
    message: &str,
) -> ThreatResult {
    ThreatResult::new(
        history.mmsi(),
        0.0,
        window,
        message,
        ThreatDetails::AisSwitch(AisSwitchDetails {
            total_normal_points: total_normal,
            missing_count_in_area: 0,
            missing_ratio: 0.0,
            p_free: config.p_free,
            p_full: config.p_full,
            affected_areas: Vec::new(),
        }),
    )
}
