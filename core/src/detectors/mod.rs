//! Behavioural detectors. Each exposes a pure `compute(history, config)` and a detector
//! struct implementing [`ThreatDetector`](crate::prelude::ThreatDetector).

pub mod ais_gap;
pub mod loitering;
pub mod meandering;
pub mod speed_drop;

pub use ais_gap::{AisGapConfig, AisGapDetector};
pub use loitering::{LoiteringConfig, LoiteringDetector};
pub use meandering::{MeanderingConfig, MeanderingDetector};
pub use speed_drop::{SpeedDropConfig, SpeedDropDetector};
