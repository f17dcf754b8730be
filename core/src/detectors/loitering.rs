use crate::interface::result::{LoiteringDetails, ThreatDetails, ThreatResult, TimeWindow};
use crate::interface::track::{duration_to_minutes, TrackHistory};
use crate::math::circle::Circle;
use crate::math::stats::StatsHelper;
use crate::prelude::{DetectorKind, ThreatDetector};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoiteringConfig {
    /// Knots; points at or below this speed count as slow.
    pub speed_threshold: f64,
    pub radius_threshold_km: f64,
    /// Minutes of dwell before the score starts rising; also the window used for the center.
    pub t0: f64,
    /// Minutes of dwell at which the score saturates.
    pub t1: f64,
}

impl Default for LoiteringConfig {
    fn default() -> Self {
        Self {
            speed_threshold: 3.0,
            radius_threshold_km: 0.5,
            t0: 10.0,
            t1: 60.0,
        }
    }
}

/// Scores sustained low-speed dwell around a point.
pub struct LoiteringDetector {
    config: LoiteringConfig,
}

impl LoiteringDetector {
    pub fn new(config: LoiteringConfig) -> Self {
        Self { config }
    }
}

impl ThreatDetector for LoiteringDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::Loitering
    }

    fn assess(&self, history: &TrackHistory) -> ThreatResult {
        compute(history, &self.config)
    }
}

pub fn compute(history: &TrackHistory, config: &LoiteringConfig) -> ThreatResult {
    let Some(current) = history.latest() else {
        return idle(history, None, config, "No data");
    };

    let slow: Vec<_> = history
        .within(config.t0)
        .iter()
        .filter(|p| p.speed() <= config.speed_threshold)
        .collect();
    if slow.is_empty() {
        return idle(history, None, config, "No slow points in T0 window");
    }

    let n = slow.len() as f64;
    let center_lat = slow.iter().map(|p| p.lat).sum::<f64>() / n;
    let center_lon = slow.iter().map(|p| p.lon).sum::<f64>() / n;
    let area = Circle::new(center_lat, center_lon, config.radius_threshold_km);

    let loitering = |lat: f64, lon: f64, speed: f64| {
        area.contains(lat, lon) && speed <= config.speed_threshold
    };

    if !loitering(current.lat, current.lon, current.speed()) {
        return idle(
            history,
            Some(area),
            config,
            "Current point outside radius or too fast",
        );
    }

    // Strict streak: the first point breaking either condition ends the dwell.
    let start: DateTime<Utc> = history
        .points()
        .iter()
        .take_while(|p| loitering(p.lat, p.lon, p.speed()))
        .last()
        .map_or(current.timestamp, |p| p.timestamp);

    let minutes = duration_to_minutes(current.timestamp - start);
    let score = StatsHelper::ramp(minutes, config.t0, config.t1);
    let message = if score > 0.0 {
        "Loitering detected"
    } else {
        "Loitering time insufficient"
    };

    ThreatResult::new(
        history.mmsi(),
        StatsHelper::round_to(score, 2),
        TimeWindow {
            start: Some(start),
            end: Some(current.timestamp),
        },
        message,
        ThreatDetails::Loitering(LoiteringDetails {
            start_time: Some(start),
            loiter_time_minutes: StatsHelper::round_to(minutes, 2),
            t0: config.t0,
            t1: config.t1,
            loiter_area: Some(area),
        }),
    )
}

fn idle(
    history: &TrackHistory,
    area: Option<Circle>,
    config: &LoiteringConfig,
    message: &str,
) -> ThreatResult {
    ThreatResult::new(
        history.mmsi(),
        0.0,
        history.window(config.t0),
        message,
        ThreatDetails::Loitering(LoiteringDetails {
            start_time: None,
            loiter_time_minutes: 0.0,
            t0: config.t0,
            t1: config.t1,
            loiter_area: area,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::fixtures::{at, history};

    fn details(result: &ThreatResult) -> &LoiteringDetails {
        match &result.details {
            ThreatDetails::Loitering(details) => details,
            other => panic!("unexpected details {:?}", other),
        }
    }

    fn stationary(minutes: usize, step: usize) -> Vec<(f64, f64, f64, f64, f64)> {
        (0..=minutes)
            .step_by(step)
            .map(|m| (m as f64, 23.5, 120.5, 0.0, 0.0))
            .collect()
    }

    #[test]
    fn two_hour_stationary_track_is_full_risk() {
        let result = compute(&history(&stationary(120, 6)), &LoiteringConfig::default());

        assert_eq!(result.risk_score, 1.0);
        assert_eq!(details(&result).loiter_time_minutes, 120.0);
        assert_eq!(details(&result).start_time, Some(at(0.0)));
        assert_eq!(result.message, "Loitering detected");
    }

    #[test]
    fn dwell_between_thresholds_scores_linearly() {
        let result = compute(&history(&stationary(35, 5)), &LoiteringConfig::default());
        assert_eq!(result.risk_score, 0.5);
    }

    #[test]
    fn short_dwell_is_insufficient() {
        let result = compute(&history(&stationary(8, 2)), &LoiteringConfig::default());
        assert_eq!(result.risk_score, 0.0);
        assert_eq!(result.message, "Loitering time insufficient");
    }

    #[test]
    fn transiting_vessel_has_no_slow_points() {
        let points: Vec<_> = (0..10)
            .map(|i| (i as f64 * 2.0, 23.0 + i as f64 * 0.01, 120.0, 12.0, 0.0))
            .collect();
        let result = compute(&history(&points), &LoiteringConfig::default());

        assert_eq!(result.risk_score, 0.0);
        assert_eq!(result.message, "No slow points in T0 window");
        assert_eq!(details(&result).loiter_area, None);
    }

    #[test]
    fn fast_current_point_breaks_loitering() {
        let mut points = stationary(60, 6);
        points.push((61.0, 23.5, 120.5, 9.0, 0.0));
        let result = compute(&history(&points), &LoiteringConfig::default());

        assert_eq!(result.risk_score, 0.0);
        assert_eq!(result.message, "Current point outside radius or too fast");
        assert!(details(&result).loiter_area.is_some());
    }

    #[test]
    fn single_noisy_point_ends_the_streak() {
        let mut points = stationary(60, 5);
        // A speed spike 20 minutes before the latest report.
        points.retain(|p| p.0 != 40.0);
        points.push((40.0, 23.5, 120.5, 8.0, 0.0));
        let result = compute(&history(&points), &LoiteringConfig::default());

        assert_eq!(details(&result).start_time, Some(at(45.0)));
        assert_eq!(details(&result).loiter_time_minutes, 15.0);
        assert_eq!(result.risk_score, 0.1);
    }

    #[test]
    fn drifting_outside_radius_ends_the_streak() {
        let mut points = stationary(30, 5);
        points.push((-5.0, 23.6, 120.5, 0.0, 0.0));
        points.push((-10.0, 23.5, 120.5, 0.0, 0.0));
        let result = compute(&history(&points), &LoiteringConfig::default());

        assert_eq!(details(&result).loiter_time_minutes, 30.0);
        assert_eq!(result.risk_score, 0.4);
    }

    #[test]
    fn huge_thresholds_do_not_overflow() {
        let config = LoiteringConfig {
            t0: 1e15,
            t1: 2e15,
            ..Default::default()
        };
        let track = history(&[(0.0, 23.5, 120.5, 0.0, 0.0), (5.0, 23.5, 120.5, 0.0, 0.0)]);
        let result = compute(&track, &config);

        assert_eq!(result.risk_score, 0.0);
        assert_eq!(result.message, "Loitering time insufficient");
        assert_eq!(details(&result).loiter_time_minutes, 5.0);
    }

    #[test]
    fn empty_history_has_no_data() {
        let result = compute(&history(&[]), &LoiteringConfig::default());
        assert_eq!(result.risk_score, 0.0);
        assert_eq!(result.message, "No data");
    }
}
