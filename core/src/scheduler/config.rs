use crate::correlation::CorrelatorConfig;
use crate::detectors::{AisGapConfig, LoiteringConfig, MeanderingConfig, SpeedDropConfig};
use crate::interface::area::SmugglingArea;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One year; longer cadences are treated as this.
pub const MAX_INTERVAL_MINUTES: u64 = 365 * 24 * 60;

/// History fetched per detector, in minutes before the vessel's latest report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LookbackConfig {
    pub ais_switch_minutes: f64,
    pub loitering_minutes: f64,
    pub meandering_minutes: f64,
    /// Half an hour wider than the detector window so its oldest point still has a predecessor.
    pub speed_drop_minutes: f64,
}

impl Default for LookbackConfig {
    fn default() -> Self {
        Self {
            ais_switch_minutes: 24.0 * 60.0,
            loitering_minutes: 3.0 * 60.0,
            meandering_minutes: 60.0,
            speed_drop_minutes: 90.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub interval_minutes: u64,
    pub startup_delay_secs: u64,
    pub lookbacks: LookbackConfig,
    /// Used only when the store has no smuggling areas.
    pub fallback_areas: Vec<SmugglingArea>,
    pub ais_gap: AisGapConfig,
    pub loitering: LoiteringConfig,
    pub meandering: MeanderingConfig,
    pub speed_drop: SpeedDropConfig,
    pub correlator: CorrelatorConfig,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_minutes: 12,
            startup_delay_secs: 5,
            lookbacks: LookbackConfig::default(),
            fallback_areas: vec![
                SmugglingArea::new(22.678203, 119.612823, 40.0),
                SmugglingArea::new(25.1, 121.7, 15.0),
            ],
            ais_gap: AisGapConfig::default(),
            loitering: LoiteringConfig::default(),
            meandering: MeanderingConfig::default(),
            speed_drop: SpeedDropConfig::default(),
            correlator: CorrelatorConfig::default(),
        }
    }
}

impl SchedulerConfig {
    /// Clamped to `[1 minute, MAX_INTERVAL_MINUTES]` so the timer neither spins nor overflows.
    pub fn interval(&self) -> Duration {
        let minutes = self.interval_minutes.clamp(1, MAX_INTERVAL_MINUTES);
        Duration::from_secs(minutes.saturating_mul(60))
    }

    pub fn startup_delay(&self) -> Duration {
        Duration::from_secs(self.startup_delay_secs.min(MAX_INTERVAL_MINUTES.saturating_mul(60)))
    }

    /// Areas to score against for one run.
    pub fn effective_areas(&self, stored: Vec<SmugglingArea>) -> Vec<SmugglingArea> {
        if stored.is_empty() {
            self.fallback_areas.clone()
        } else {
            stored
        }
    }
}
