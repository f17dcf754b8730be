use crate::interface::result::{DropEvent, SpeedDropDetails, ThreatDetails, ThreatResult, TimeWindow};
use crate::interface::track::TrackHistory;
use crate::math::circle::GeoPoint;
use crate::math::stats::StatsHelper;
use crate::prelude::{DetectorKind, ThreatDetector};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeedDropConfig {
    pub lookback_minutes: f64,
    /// Deceleration in knots per second that still counts as ordinary speed variation.
    pub a_free: f64,
    /// Deceleration in knots per second that scores the maximum.
    pub a_full: f64,
}

impl Default for SpeedDropConfig {
    fn default() -> Self {
        Self {
            lookback_minutes: 60.0,
            a_free: 0.005,
            a_full: 0.03,
        }
    }
}

/// Scores abrupt deceleration between consecutive reports.
pub struct SpeedDropDetector {
    config: SpeedDropConfig,
}

impl SpeedDropDetector {
    pub fn new(config: SpeedDropConfig) -> Self {
        Self { config }
    }
}

impl ThreatDetector for SpeedDropDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::SpeedDrop
    }

    fn assess(&self, history: &TrackHistory) -> ThreatResult {
        compute(history, &self.config)
    }
}

pub fn compute(history: &TrackHistory, config: &SpeedDropConfig) -> ThreatResult {
    if history.len() < 2 {
        return steady(history, TimeWindow::default(), config, "Insufficient data");
    }

    let window = history.window(config.lookback_minutes);
    let points = history.within(config.lookback_minutes);
    if points.len() < 2 {
        return steady(history, window, config, "Insufficient data in time window");
    }

    let mut max_score = 0.0_f64;
    let mut total_acceleration = 0.0;
    let mut drop_events = Vec::new();

    for pair in points.windows(2) {
        let (newer, older) = (&pair[0], &pair[1]);
        let dt_seconds = (newer.timestamp - older.timestamp).num_milliseconds() as f64 / 1000.0;
        if dt_seconds <= 0.0 || older.speed() <= newer.speed() {
            continue;
        }

        let deceleration = (older.speed() - newer.speed()) / dt_seconds;
        let score = StatsHelper::ramp(deceleration, config.a_free, config.a_full);
        if score <= 0.0 {
            continue;
        }

        total_acceleration += deceleration;
        max_score = max_score.max(score);
        drop_events.push(DropEvent {
            location: GeoPoint::new(newer.lat, newer.lon),
            time: newer.timestamp,
            acceleration: StatsHelper::round_to(deceleration, 4),
            score: StatsHelper::round_to(score, 2),
        });
    }

    let message = if max_score > 0.0 {
        "Speed drop detected"
    } else {
        "No significant speed drop"
    };

    ThreatResult::new(
        history.mmsi(),
        StatsHelper::round_to(max_score, 2),
        window,
        message,
        ThreatDetails::SpeedDrop(SpeedDropDetails {
            drop_count: drop_events.len(),
            total_drop_acceleration: StatsHelper::round_to(total_acceleration, 4),
            a_free: config.a_free,
            a_full: config.a_full,
            drop_events,
        }),
    )
}

fn steady(
    history: &TrackHistory,
    window: TimeWindow,
    config: &SpeedDropConfig,
    message: &str,
) -> ThreatResult {
    ThreatResult::new(
        history.mmsi(),
        0.0,
        window,
        message,
        ThreatDetails::SpeedDrop(SpeedDropDetails {
            drop_count: 0,
            total_drop_acceleration: 0.0,
            a_free: config.a_free,
            a_full: config.a_full,
            drop_events: Vec::new(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::fixtures::{at, history};

    fn details(result: &ThreatResult) -> &SpeedDropDetails {
        match &result.details {
            ThreatDetails::SpeedDrop(details) => details,
            other => panic!("unexpected details {:?}", other),
        }
    }

    #[test]
    fn sharp_drop_is_full_risk() {
        let track = history(&[(0.0, 23.0, 120.0, 20.0, 0.0), (1.0, 23.01, 120.0, 5.0, 0.0)]);
        let result = compute(&track, &SpeedDropConfig::default());
        let details = details(&result);

        assert_eq!(result.risk_score, 1.0);
        assert_eq!(details.drop_count, 1);
        assert_eq!(details.drop_events[0].acceleration, 0.25);
        assert_eq!(details.drop_events[0].time, at(1.0));
        assert_eq!(details.drop_events[0].location, GeoPoint::new(23.01, 120.0));
        assert_eq!(result.message, "Speed drop detected");
    }

    #[test]
    fn moderate_drop_scores_linearly() {
        let track = history(&[(0.0, 23.0, 120.0, 10.0, 0.0), (1.0, 23.0, 120.0, 9.0, 0.0)]);
        let result = compute(&track, &SpeedDropConfig::default());

        assert_eq!(result.risk_score, 0.47);
        assert_eq!(details(&result).drop_events[0].acceleration, 0.0167);
    }

    #[test]
    fn risk_is_the_largest_event_not_the_sum() {
        let track = history(&[
            (0.0, 23.0, 120.0, 12.0, 0.0),
            (1.0, 23.0, 120.0, 11.0, 0.0),
            (2.0, 23.0, 120.0, 10.0, 0.0),
        ]);
        let result = compute(&track, &SpeedDropConfig::default());
        let details = details(&result);

        assert_eq!(details.drop_count, 2);
        assert_eq!(result.risk_score, 0.47);
        assert_eq!(details.total_drop_acceleration, 0.0333);
    }

    #[test]
    fn acceleration_and_gentle_slowing_are_ignored() {
        let track = history(&[
            (0.0, 23.0, 120.0, 5.0, 0.0),
            (1.0, 23.0, 120.0, 15.0, 0.0),
            (11.0, 23.0, 120.0, 14.0, 0.0),
        ]);
        let result = compute(&track, &SpeedDropConfig::default());

        assert_eq!(result.risk_score, 0.0);
        assert_eq!(details(&result).drop_count, 0);
        assert_eq!(result.message, "No significant speed drop");
    }

    #[test]
    fn drops_before_the_window_are_ignored() {
        let track = history(&[
            (0.0, 23.0, 120.0, 20.0, 0.0),
            (1.0, 23.0, 120.0, 2.0, 0.0),
            (80.0, 23.0, 120.0, 2.0, 0.0),
            (81.0, 23.0, 120.0, 2.0, 0.0),
        ]);
        let result = compute(&track, &SpeedDropConfig::default());
        assert_eq!(result.risk_score, 0.0);
    }

    #[test]
    fn sparse_history_is_insufficient() {
        let result = compute(
            &history(&[(0.0, 23.0, 120.0, 20.0, 0.0)]),
            &SpeedDropConfig::default(),
        );
        assert_eq!(result.message, "Insufficient data");

        let stale = history(&[(0.0, 23.0, 120.0, 20.0, 0.0), (120.0, 23.0, 120.0, 2.0, 0.0)]);
        let result = compute(&stale, &SpeedDropConfig::default());
        assert_eq!(result.message, "Insufficient data in time window");
        assert!(result.time_window.start.is_some());
    }

    #[test]
    fn unbounded_lookback_covers_the_whole_track() {
        let track = history(&[(0.0, 23.0, 120.0, 20.0, 0.0), (1.0, 23.01, 120.0, 5.0, 0.0)]);
        for lookback_minutes in [1e15, f64::MAX, f64::INFINITY] {
            let config = SpeedDropConfig {
                lookback_minutes,
                ..SpeedDropConfig::default()
            };
            let result = compute(&track, &config);
            assert_eq!(result.risk_score, 1.0);
            assert_eq!(details(&result).drop_count, 1);
        }
    }
}
