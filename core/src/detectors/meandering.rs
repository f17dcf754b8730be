use crate::interface::result::{
    MeanderSegment, MeanderingDetails, ThreatDetails, ThreatResult, TimeWindow,
};
use crate::interface::track::{duration_to_minutes, TrackHistory, TrackPoint};
use crate::math::circle::{EnclosingCircle, GeoPoint};
use crate::math::geo::{GeoHelper, KM_PER_NM};
use crate::math::stats::StatsHelper;
use crate::prelude::{DetectorKind, ThreatDetector};
use serde::{Deserialize, Serialize};

/// Floor applied to a zero bounding-box area, in square nautical miles.
const MIN_AREA_NM2: f64 = 0.0001;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeanderingConfig {
    pub lookback_minutes: f64,
    /// Knots; only points strictly faster than this form segments.
    pub s_crit: f64,
    /// Core score at which a segment saturates.
    pub f_crit: f64,
    /// Core score at or below which a segment is treated as ordinary navigation.
    pub f_trigger: f64,
}

impl Default for MeanderingConfig {
    fn default() -> Self {
        Self {
            lookback_minutes: 60.0,
            s_crit: 2.0,
            f_crit: 500.0,
            f_trigger: 50.0,
        }
    }
}

/// Scores repeated heading changes packed into a small area at speed.
pub struct MeanderingDetector {
    config: MeanderingConfig,
}

impl MeanderingDetector {
    pub fn new(config: MeanderingConfig) -> Self {
        Self { config }
    }
}

impl ThreatDetector for MeanderingDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::Meandering
    }

    fn assess(&self, history: &TrackHistory) -> ThreatResult {
        compute(history, &self.config)
    }
}

pub fn compute(history: &TrackHistory, config: &MeanderingConfig) -> ThreatResult {
    if history.len() < 2 {
        return calm(history, TimeWindow::default(), config, "Insufficient data");
    }

    let window = history.window(config.lookback_minutes);
    let runs: Vec<&[TrackPoint]> = history
        .within(config.lookback_minutes)
        .split(|p| p.speed() <= config.s_crit)
        .filter(|run| run.len() >= 2)
        .collect();

    if runs.is_empty() {
        return calm(
            history,
            window,
            config,
            "No continuous high-speed track segments found",
        );
    }

    let segments: Vec<ScoredSegment> = runs
        .into_iter()
        .filter_map(|run| score_segment(run, config))
        .collect();

    let total_score: f64 = segments.iter().map(|s| s.risk_score_raw).sum();
    let risk = total_score.min(1.0);
    let message = if risk > 0.0 {
        "Meandering detected"
    } else {
        "No significant meandering"
    };

    let details = MeanderingDetails {
        meandering_count: segments.len(),
        total_meandering_duration: StatsHelper::round_to(
            segments.iter().map(|s| s.duration_minutes).sum(),
            2,
        ),
        total_meandering_score: StatsHelper::round_to(
            segments.iter().map(|s| s.core_score_raw).sum(),
            2,
        ),
        f_crit: config.f_crit,
        segments: segments.into_iter().map(|s| s.report).collect(),
    };

    ThreatResult::new(
        history.mmsi(),
        StatsHelper::round_to(risk, 2),
        window,
        message,
        ThreatDetails::Meandering(details),
    )
}

/// Segment that passed the trigger, with unrounded values kept for aggregation.
struct ScoredSegment {
    report: MeanderSegment,
    duration_minutes: f64,
    core_score_raw: f64,
    risk_score_raw: f64,
}

/// `run` is newest-first and holds at least two points.
fn score_segment(run: &[TrackPoint], config: &MeanderingConfig) -> Option<ScoredSegment> {
    let sum_s: f64 = run.iter().map(TrackPoint::speed).sum();
    let sum_delta_c: f64 = run
        .windows(2)
        .map(|pair| GeoHelper::angle_diff(pair[0].course(), pair[1].course()))
        .sum();

    let area_nm2 = bounding_box_nm2(run);
    let core = sum_delta_c * sum_s / (area_nm2 * 180.0);

    // NaN never passes the trigger.
    if !(core > config.f_trigger) {
        return None;
    }

    let risk = (core / config.f_crit).clamp(0.0, 1.0);
    let (newest, oldest) = (&run[0], &run[run.len() - 1]);
    let duration = duration_to_minutes(newest.timestamp - oldest.timestamp);
    let coords: Vec<GeoPoint> = run.iter().map(|p| GeoPoint::new(p.lat, p.lon)).collect();

    Some(ScoredSegment {
        report: MeanderSegment {
            start_time: oldest.timestamp,
            end_time: newest.timestamp,
            location: EnclosingCircle::compute(&coords),
            duration_minutes: StatsHelper::round_to(duration, 2),
            point_count: run.len(),
            sum_delta_c: StatsHelper::round_to(sum_delta_c, 2),
            sum_s: StatsHelper::round_to(sum_s, 2),
            bounding_box_area: StatsHelper::round_to(area_nm2, 4),
            core_score: StatsHelper::round_to(core, 2),
            risk_score: StatsHelper::round_to(risk, 2),
        },
        duration_minutes: duration,
        core_score_raw: core,
        risk_score_raw: risk,
    })
}

fn bounding_box_nm2(run: &[TrackPoint]) -> f64 {
    let (mut min_lat, mut max_lat) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut min_lon, mut max_lon) = (f64::INFINITY, f64::NEG_INFINITY);
    for p in run {
        min_lat = min_lat.min(p.lat);
        max_lat = max_lat.max(p.lat);
        min_lon = min_lon.min(p.lon);
        max_lon = max_lon.max(p.lon);
    }

    let mid_lat = (min_lat + max_lat) / 2.0;
    let width_nm = GeoHelper::distance_km(mid_lat, min_lon, mid_lat, max_lon) / KM_PER_NM;
    let height_nm = GeoHelper::distance_km(min_lat, min_lon, max_lat, min_lon) / KM_PER_NM;
    let area = width_nm * height_nm;

    if area == 0.0 {
        MIN_AREA_NM2
    } else {
        area
    }
}

fn calm(
    history: &TrackHistory,
    window: TimeWindow,
    config: &MeanderingConfig,
    message: &str,
) -> ThreatResult {
    ThreatResult::new(
        history.mmsi(),
        0.0,
        window,
        message,
        ThreatDetails::Meandering(MeanderingDetails {
            meandering_count: 0,
            total_meandering_duration: 0.0,
            total_meandering_score: 0.0,
            f_crit: config.f_crit,
            segments: Vec::new(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::fixtures::history;

    fn details(result: &ThreatResult) -> &MeanderingDetails {
        match &result.details {
            ThreatDetails::Meandering(details) => details,
            other => panic!("unexpected details {:?}", other),
        }
    }

    fn zigzag(start_minute: f64) -> Vec<(f64, f64, f64, f64, f64)> {
        (0..10)
            .map(|i| {
                let lon = if i % 2 == 1 { 120.002 } else { 120.0 };
                let cog = if i % 2 == 1 { 45.0 } else { 315.0 };
                (start_minute + i as f64, 23.0 + 0.002 * i as f64, lon, 10.0, cog)
            })
            .collect()
    }

    #[test]
    fn straight_run_is_not_meandering() {
        let points: Vec<_> = (0..20)
            .map(|i| (i as f64 * 2.0, 23.0, 120.0 + 0.01 * i as f64, 15.0, 90.0))
            .collect();
        let result = compute(&history(&points), &MeanderingConfig::default());

        assert_eq!(result.risk_score, 0.0);
        assert_eq!(details(&result).meandering_count, 0);
        assert_eq!(result.message, "No significant meandering");
    }

    #[test]
    fn tight_zigzag_saturates() {
        let result = compute(&history(&zigzag(0.0)), &MeanderingConfig::default());
        let details = details(&result);

        assert_eq!(result.risk_score, 1.0);
        assert_eq!(details.meandering_count, 1);

        let segment = &details.segments[0];
        assert_eq!(segment.point_count, 10);
        assert_eq!(segment.sum_delta_c, 810.0);
        assert_eq!(segment.sum_s, 100.0);
        assert_eq!(segment.duration_minutes, 9.0);
        assert!(segment.core_score > 3000.0);
        assert!(segment.location.radius_km > 0.9 && segment.location.radius_km < 1.1);
    }

    #[test]
    fn segment_scores_add_up() {
        // Two identical two-point runs split by a stopped report.
        let points = [
            (35.0, 23.0, 120.0, 5.0, 0.0),
            (40.0, 23.01, 120.01, 5.0, 90.0),
            (45.0, 23.0, 120.0, 0.0, 0.0),
            (50.0, 23.0, 120.0, 5.0, 0.0),
            (55.0, 23.01, 120.01, 5.0, 90.0),
        ];
        let config = MeanderingConfig {
            f_crit: 60.0,
            f_trigger: 10.0,
            ..Default::default()
        };
        let result = compute(&history(&points), &config);
        let details = details(&result);

        assert_eq!(details.meandering_count, 2);
        assert!(details.segments.iter().all(|s| s.risk_score == 0.25));
        assert_eq!(result.risk_score, 0.5);
        assert!((details.total_meandering_score - 30.14).abs() < 0.02);
    }

    #[test]
    fn repeated_zigzags_are_capped() {
        let mut points = zigzag(0.0);
        points.push((10.0, 23.02, 120.0, 0.5, 0.0));
        points.extend(zigzag(11.0));
        let result = compute(&history(&points), &MeanderingConfig::default());

        assert_eq!(details(&result).meandering_count, 2);
        assert_eq!(result.risk_score, 1.0);
    }

    #[test]
    fn slow_track_has_no_segments() {
        let points: Vec<_> = (0..10)
            .map(|i| (i as f64, 23.0, 120.0, 1.0, (i * 90 % 360) as f64))
            .collect();
        let result = compute(&history(&points), &MeanderingConfig::default());

        assert_eq!(result.risk_score, 0.0);
        assert_eq!(result.message, "No continuous high-speed track segments found");
    }

    #[test]
    fn isolated_fast_points_do_not_form_segments() {
        let points = [
            (0.0, 23.0, 120.0, 10.0, 0.0),
            (1.0, 23.0, 120.0, 1.0, 180.0),
            (2.0, 23.0, 120.0, 10.0, 0.0),
        ];
        let result = compute(&history(&points), &MeanderingConfig::default());
        assert_eq!(result.message, "No continuous high-speed track segments found");
    }

    #[test]
    fn zigzag_outside_window_is_ignored() {
        let mut points = zigzag(0.0);
        points.push((120.0, 23.5, 120.5, 0.0, 0.0));
        points.push((121.0, 23.5, 120.5, 0.0, 0.0));
        let result = compute(&history(&points), &MeanderingConfig::default());
        assert_eq!(result.risk_score, 0.0);
    }

    #[test]
    fn unbounded_lookback_reaches_old_zigzags() {
        let mut points = zigzag(0.0);
        points.push((120.0, 23.5, 120.5, 0.0, 0.0));
        points.push((121.0, 23.5, 120.5, 0.0, 0.0));
        let config = MeanderingConfig {
            lookback_minutes: 1e15,
            ..Default::default()
        };
        let result = compute(&history(&points), &config);

        assert_eq!(details(&result).meandering_count, 1);
        assert_eq!(result.risk_score, 1.0);
    }

    #[test]
    fn single_point_is_insufficient() {
        let result = compute(
            &history(&[(0.0, 23.0, 120.0, 10.0, 0.0)]),
            &MeanderingConfig::default(),
        );
        assert_eq!(result.message, "Insufficient data");
    }
}
