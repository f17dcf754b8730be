pub mod area;
pub mod result;
pub mod store;
pub mod track;

pub use area::SmugglingArea;
pub use result::{ThreatDetails, ThreatResult, TimeWindow};
pub use store::{MemoryResultSink, MemoryTrackStore, ResultSink, TrackStore};
pub use track::{RfDetection, TrackHistory, TrackPoint};
