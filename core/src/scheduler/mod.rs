//! Periodic batch orchestration: every tick, each known vessel is scored by all four detectors
//! and the results are handed to the result sink.

pub mod config;
pub mod runner;
pub mod state;

pub use config::{LookbackConfig, SchedulerConfig};
pub use runner::Scheduler;
pub use state::SchedulerState;
