//! Threat-scoring engine for vessel AIS tracks.
//!
//! Four behavioural detectors (AIS gaps inside smuggling areas, loitering, meandering and
//! abrupt speed drops) turn a newest-first track history into a bounded risk score. A
//! dark-vessel correlator checks RF sightings against the AIS record, and a batch scheduler
//! scores every known vessel on a fixed cadence against pluggable store and sink collaborators.

pub mod correlation;
pub mod detectors;
pub mod interface;
pub mod math;
pub mod prelude;
pub mod scheduler;
pub mod telemetry;

pub use correlation::{CorrelationReport, CorrelatorConfig, DarkVesselCorrelator, ScreeningQuery};
pub use prelude::{DetectorKind, SchedulerError, StoreError, ThreatDetector};
pub use scheduler::{Scheduler, SchedulerConfig};
