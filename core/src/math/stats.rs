pub struct StatsHelper;

impl StatsHelper {
    /// Linear score ramp: 0 at or below `free`, 1 at or above `full`, linear between.
    ///
    /// A NaN input scores 0. When `free == full` the ramp degenerates to a step and never
    /// divides.
    pub fn ramp(value: f64, free: f64, full: f64) -> f64 {
        if value.is_nan() || value <= free {
            0.0
        } else if value >= full {
            1.0
        } else {
            ((value - free) / (full - free)).clamp(0.0, 1.0)
        }
    }

    /// Rounds to a fixed number of decimal places for reporting.
    pub fn round_to(value: f64, places: i32) -> f64 {
        let factor = 10f64.powi(places);
        (value * factor).round() / factor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ramp_saturates_at_both_ends() {
        assert_eq!(StatsHelper::ramp(0.01, 0.05, 0.3), 0.0);
        assert_eq!(StatsHelper::ramp(0.05, 0.05, 0.3), 0.0);
        assert_eq!(StatsHelper::ramp(0.3, 0.05, 0.3), 1.0);
        assert_eq!(StatsHelper::ramp(4.0, 0.05, 0.3), 1.0);
    }

    #[test]
    fn ramp_is_linear_between_thresholds() {
        let score = StatsHelper::ramp(35.0, 10.0, 60.0);
        assert!((score - 0.5).abs() < 1e-12);
    }

    #[test]
    fn ramp_handles_nan_and_step() {
        assert_eq!(StatsHelper::ramp(f64::NAN, 0.0, 1.0), 0.0);
        assert_eq!(StatsHelper::ramp(0.5, 0.5, 0.5), 0.0);
        assert_eq!(StatsHelper::ramp(0.6, 0.5, 0.5), 1.0);
    }

    #[test]
    fn round_to_reporting_precision() {
        assert_eq!(StatsHelper::round_to(0.456, 2), 0.46);
        assert_eq!(StatsHelper::round_to(12.34567, 4), 12.3457);
    }
}
